//! # agentchat-realtime
//!
//! Realtime voice calls with a remote model.
//!
//! A call streams microphone audio to the model and plays the model's spoken
//! replies back without gaps, while surfacing what the user said as a running
//! transcript.
//!
//! ```text
//!   microphone ──► InputContext ──► BlockProcessor ──► frame queue ──► RealtimeSession
//!   (device rate)   (16 kHz)         (4096 samples)     (base64 PCM16)        │
//!                                                                             ▼
//!   speaker ◄── OutputContext ◄── PlaybackScheduler ◄── LiveConversation ◄── events
//!                (24 kHz)          (gapless cursor)     └─► TranscriptionAccumulator
//! ```
//!
//! ## Features
//!
//! - `gemini`: Gemini Live API transport over WebSocket
//! - `cpal`: desktop microphone and speaker backend
//!
//! ## Example
//!
//! ```rust,ignore
//! use agentchat_realtime::{LiveConversation, gemini::GeminiLiveModel, cpal_backend::CpalDevices};
//! use std::sync::Arc;
//!
//! let call = LiveConversation::builder(
//!     Arc::new(GeminiLiveModel::new(api_key)),
//!     Arc::new(CpalDevices::new()),
//! )
//! .on_input_transcript(|text| println!("you: {text}"))
//! .build();
//!
//! call.start().await?;
//! tokio::signal::ctrl_c().await?;
//! call.stop().await;
//! ```

pub mod audio;
pub mod capture;
pub mod config;
pub mod conversation;
pub mod device;
pub mod error;
pub mod events;
pub mod model;
pub mod playback;
pub mod session;
pub mod transcription;

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "cpal")]
pub mod cpal_backend;

pub use audio::{
    AudioBuffer, INPUT_MIME_TYPE, INPUT_SAMPLE_RATE, OUTPUT_MIME_TYPE, OUTPUT_SAMPLE_RATE,
    SampleOverflow,
};
pub use config::{CaptureConfig, LiveConfig, LiveConfigBuilder};
pub use conversation::{
    CallStatus, LiveConversation, LiveConversationBuilder, TranscriptCallback,
    apply_server_content,
};
pub use device::{AudioDevices, EndedCallback, MicrophoneStream, OutputContext, SourceHandle};
pub use error::{RealtimeError, Result};
pub use events::{AudioPayload, MediaFrame, ServerContent, ServerEvent};
pub use model::{BoxedModel, RealtimeModel};
pub use playback::PlaybackScheduler;
pub use session::{BoxedSession, RealtimeSession};
pub use transcription::TranscriptionAccumulator;
