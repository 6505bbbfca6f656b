//! Audio hardware seams.
//!
//! A call needs one microphone and one output context. The desktop backend
//! lives in [`cpal_backend`](crate::cpal_backend); tests provide scripted fakes.

use crate::audio::AudioBuffer;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Invoked once when a scheduled source finishes playing on its own.
pub type EndedCallback = Box<dyn FnOnce() + Send>;

/// Entry point for acquiring audio devices.
#[async_trait]
pub trait AudioDevices: Send + Sync {
    /// Request microphone access.
    ///
    /// A refusal is reported as [`RealtimeError::PermissionDenied`](crate::RealtimeError::PermissionDenied).
    async fn open_microphone(&self) -> Result<Box<dyn MicrophoneStream>>;

    /// Create an output context rendering at `sample_rate`.
    async fn open_output(&self, sample_rate: u32) -> Result<Arc<dyn OutputContext>>;
}

/// A live microphone track.
pub trait MicrophoneStream: Send + Sync {
    /// Native rate of the delivered samples.
    fn sample_rate(&self) -> u32;

    /// Take the receiver of mono sample chunks. Only the first call returns `Some`.
    fn take_samples(&mut self) -> Option<UnboundedReceiver<Vec<f32>>>;

    /// Stop the hardware track. Safe to call more than once.
    fn stop(&self);

    fn is_active(&self) -> bool;
}

/// A clocked output that plays buffers at scheduled times.
#[async_trait]
pub trait OutputContext: Send + Sync {
    fn sample_rate(&self) -> u32;

    /// Seconds since the context started rendering.
    fn current_time(&self) -> f64;

    /// Play `buffer` starting at `start_at` seconds.
    ///
    /// `on_ended` fires after natural completion and must never run before
    /// this call returns.
    fn schedule(
        &self,
        buffer: AudioBuffer,
        start_at: f64,
        on_ended: EndedCallback,
    ) -> Result<Box<dyn SourceHandle>>;

    fn is_closed(&self) -> bool;

    /// Release the output device. Closing twice is an error the caller may ignore.
    async fn close(&self) -> Result<()>;
}

/// A scheduled or playing buffer.
pub trait SourceHandle: Send + Sync {
    /// Stop immediately. Stopping a finished source is a no-op.
    fn stop(&self);
}
