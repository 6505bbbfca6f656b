//! Mock sign-in backed by storage.

use crate::storage::Storage;
use agentchat_core::{Result, User};
use std::sync::Arc;

pub const AUTH_USER_KEY: &str = "authUser";

/// The fixed identity every login produces.
pub fn mock_user() -> User {
    User {
        name: "Martin".to_string(),
        email: "thermal24@gmail.com".to_string(),
        photo_url: "mock_photo_url".to_string(),
    }
}

pub struct AuthSession {
    storage: Arc<dyn Storage>,
}

impl AuthSession {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Sign in as the mock user.
    pub async fn login(&self) -> Result<User> {
        let user = mock_user();
        self.storage.set(AUTH_USER_KEY, serde_json::to_string(&user)?).await?;
        tracing::info!(user.email = %user.email, "Signed in");
        Ok(user)
    }

    pub async fn logout(&self) -> Result<()> {
        self.storage.remove(AUTH_USER_KEY).await?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// The signed-in user. Unreadable session data is discarded.
    pub async fn current_user(&self) -> Option<User> {
        let stored = match self.storage.get(AUTH_USER_KEY).await {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read session");
                return None;
            }
        };
        match serde_json::from_str(&stored) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse stored user");
                if let Err(e) = self.storage.remove(AUTH_USER_KEY).await {
                    tracing::warn!(error = %e, "Failed to discard stored user");
                }
                None
            }
        }
    }
}
