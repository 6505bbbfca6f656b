#[derive(Debug, thiserror::Error)]
pub enum AgentChatError {
    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Memory error: {0}")]
    Memory(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentChatError::Agent("name is required".to_string());
        assert_eq!(err.to_string(), "Agent error: name is required");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: AgentChatError = io_err.into();
        assert!(matches!(err, AgentChatError::Io(_)));
    }
}
