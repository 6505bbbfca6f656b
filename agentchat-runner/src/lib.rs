//! # agentchat-runner
//!
//! Runs one text chat turn: the user message and a thinking placeholder are
//! written to [`ChatMemory`](agentchat_memory::ChatMemory), the reply is
//! streamed from a [`TextGenerator`](agentchat_model::TextGenerator) into the
//! placeholder, and the finished message is returned.

mod error;
mod runner;

pub use error::{Result, RunnerError};
pub use runner::{ChatRunner, RunnerConfig, error_reply};
