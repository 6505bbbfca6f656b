//! Gemini Live API transport.
//!
//! - Input audio: 16 kHz mono PCM
//! - Output audio: 24 kHz mono PCM
//! - Transcripts of both sides arrive alongside the audio
//!
//! # Example
//!
//! ```rust,ignore
//! use agentchat_realtime::gemini::GeminiLiveModel;
//! use agentchat_realtime::{LiveConfig, RealtimeModel};
//!
//! let model = GeminiLiveModel::new(std::env::var("GOOGLE_API_KEY")?);
//! let session = model.connect(LiveConfig::default()).await?;
//! // ...
//! session.close().await?;
//! ```

mod model;
mod session;

pub use model::GeminiLiveModel;
pub use session::GeminiLiveSession;

/// Gemini Live API WebSocket URL.
pub const GEMINI_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Available prebuilt voices.
pub const GEMINI_VOICES: &[&str] =
    &["Zephyr", "Puck", "Charon", "Kore", "Fenrir", "Aoede", "Leda", "Orus"];
