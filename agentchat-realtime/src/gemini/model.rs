//! Gemini Live model implementation.

use crate::config::{DEFAULT_LIVE_MODEL, LiveConfig};
use crate::error::{RealtimeError, Result};
use crate::model::RealtimeModel;
use crate::session::BoxedSession;
use async_trait::async_trait;

use super::GEMINI_LIVE_URL;
use super::session::GeminiLiveSession;

/// Gemini Live model for creating realtime sessions.
#[derive(Clone)]
pub struct GeminiLiveModel {
    api_key: String,
    model_id: String,
    endpoint: String,
}

impl GeminiLiveModel {
    /// Create a model using the default native-audio model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: DEFAULT_LIVE_MODEL.to_string(),
            endpoint: GEMINI_LIVE_URL.to_string(),
        }
    }

    /// Use a different model.
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Point at a different WebSocket endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl RealtimeModel for GeminiLiveModel {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn ensure_credentials(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(RealtimeError::missing_credential("Gemini API key is empty"));
        }
        Ok(())
    }

    async fn connect(&self, config: LiveConfig) -> Result<BoxedSession> {
        self.ensure_credentials()?;
        let model = config.model.clone().unwrap_or_else(|| self.model_id.clone());
        let session =
            GeminiLiveSession::connect(&self.endpoint, &self.api_key, &model, config).await?;
        Ok(Box::new(session))
    }
}

impl std::fmt::Debug for GeminiLiveModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiLiveModel")
            .field("model_id", &self.model_id)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
