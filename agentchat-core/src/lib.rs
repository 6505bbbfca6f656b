//! # agentchat-core
//!
//! Types shared by every agentchat crate.
//!
//! - [`Agent`] - a persona: name, description and system instruction
//! - [`Integration`] - a grounding tool the user can switch on or off
//! - [`ChatMessage`] / [`ChatMessagePart`] - one entry in a persona's chat log
//! - [`GroundingChunk`] - citation metadata attached to a model reply
//! - [`AgentChatError`] / [`Result`] - shared error handling

pub mod agent;
pub mod error;
pub mod integration;
pub mod types;

pub use agent::{
    Agent, AgentDraft, CHLOE_AGENT_ID, CODE_HELPER_AGENT_ID, CREATIVE_WRITER_AGENT_ID,
    FRIENDLY_MODE_SUFFIX, find_agent, initial_agents,
};
pub use error::{AgentChatError, Result};
pub use integration::{
    GOOGLE_MAPS_ID, GOOGLE_SEARCH_ID, Integration, initial_integrations, is_enabled, toggle,
};
pub use types::{
    ChatMessage, ChatMessagePart, GeoLocation, GroundingChunk, GroundingSource, InlineData,
    MapsSource, MessageUpdate, PlaceAnswerSource, Role, User, grounding_sources, now_millis,
};
