//! Core RealtimeModel trait definition.

use crate::config::LiveConfig;
use crate::error::Result;
use crate::session::BoxedSession;
use async_trait::async_trait;

/// A factory for realtime sessions.
///
/// # Example
///
/// ```rust,ignore
/// use agentchat_realtime::gemini::GeminiLiveModel;
/// use agentchat_realtime::{LiveConfig, RealtimeModel};
///
/// let model = GeminiLiveModel::new(api_key);
/// model.ensure_credentials()?;
/// let session = model.connect(LiveConfig::default()).await?;
/// // ...
/// session.close().await?;
/// ```
#[async_trait]
pub trait RealtimeModel: Send + Sync {
    /// Get the provider name (e.g. "gemini").
    fn provider(&self) -> &str;

    /// Get the model identifier.
    fn model_id(&self) -> &str;

    /// Fail fast if the credential needed by [`connect`](Self::connect) is absent.
    fn ensure_credentials(&self) -> Result<()> {
        Ok(())
    }

    /// Open a session configured with `config`.
    async fn connect(&self, config: LiveConfig) -> Result<BoxedSession>;
}

/// A shared model type for thread-safe access.
pub type BoxedModel = std::sync::Arc<dyn RealtimeModel>;
