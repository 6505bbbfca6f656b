//! # agentchat-model
//!
//! Streaming text generation against the Gemini API.
//!
//! A [`GenerationInput`] describes one chat turn: the persona, prior history,
//! the new prompt with an optional image, and the enabled grounding tools.
//! [`GeminiTextClient`] turns it into a `streamGenerateContent` request and
//! yields [`ResponseFragment`]s as server-sent events arrive.
//!
//! ```rust,ignore
//! use agentchat_model::{GeminiTextClient, GenerationInput, TextGenerator};
//! use futures::StreamExt;
//!
//! let client = GeminiTextClient::from_env()?;
//! let mut stream = client.generate_stream(GenerationInput::new(agent, "Hello")).await?;
//! while let Some(fragment) = stream.next().await {
//!     print!("{}", fragment?.text.unwrap_or_default());
//! }
//! ```

pub mod client;
pub mod error;
pub mod request;
pub mod response;

pub use client::{
    API_KEY_VARS, DEFAULT_BASE_URL, FragmentStream, GeminiTextClient, TextGenerator,
    api_key_from_env,
};
pub use error::{Error, Result};
pub use request::{
    FLASH_MODEL, GenerateContentRequest, GenerationInput, PRO_MODEL, model_for_agent,
};
pub use response::{GenerationResponse, ResponseFragment};
