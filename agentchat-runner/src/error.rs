use thiserror::Error;

pub type Result<T> = std::result::Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Nothing to send: the prompt is blank and no image is attached")]
    EmptyTurn,

    #[error(transparent)]
    Model(#[from] agentchat_model::Error),
}
