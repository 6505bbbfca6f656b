//! Core RealtimeSession trait definition.

use crate::error::Result;
use crate::events::{MediaFrame, ServerEvent};
use async_trait::async_trait;

/// One open bidirectional streaming connection to a remote model.
///
/// Sending and receiving may happen concurrently from different tasks, so
/// implementations keep their read and write halves independently locked.
///
/// # Example
///
/// ```rust,ignore
/// use agentchat_realtime::{MediaFrame, RealtimeSession, ServerEvent};
///
/// async fn drain(session: &dyn RealtimeSession) -> Result<()> {
///     session.send_media(MediaFrame::pcm16_input(block_base64)).await?;
///     while let Some(event) = session.next_event().await {
///         if let ServerEvent::Content(content) = event? {
///             // play content.audio, show content.input_transcription
///         }
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RealtimeSession: Send + Sync {
    /// Get the session ID.
    fn session_id(&self) -> &str;

    /// Check if the session is currently connected.
    fn is_connected(&self) -> bool;

    /// Send one realtime-input media frame.
    async fn send_media(&self, frame: MediaFrame) -> Result<()>;

    /// Get the next event from the server.
    ///
    /// Returns `None` when the remote side closed the session.
    async fn next_event(&self) -> Option<Result<ServerEvent>>;

    /// Close the session gracefully.
    async fn close(&self) -> Result<()>;
}

/// A boxed session type for dynamic dispatch.
pub type BoxedSession = Box<dyn RealtimeSession>;
