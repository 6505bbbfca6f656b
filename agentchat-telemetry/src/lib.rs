//! # agentchat telemetry
//!
//! Structured logging for the agentchat crates.
//!
//! ## Usage
//!
//! ```rust
//! use agentchat_telemetry::{init_telemetry, info};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_telemetry("agentchat")?;
//!     info!("ready");
//!     Ok(())
//! }
//! ```

pub mod init;
pub mod spans;

// Re-export tracing macros for convenience
pub use tracing::{Instrument, Span, debug, error, info, instrument, trace, warn};

pub use init::{LogFormat, init_telemetry, init_with_format};
pub use spans::*;
