//! Microphone capture: resample, frame, encode, send.
//!
//! Raw device chunks flow through an [`InputContext`] into a
//! [`BlockProcessor`], which emits fixed-size blocks at the input rate. Each
//! block is encoded into a [`MediaFrame`] and queued without waiting; a single
//! sender task drains the queue in order so a slow send never stalls capture.

use crate::audio::{SampleOverflow, encode_base64, float_to_pcm16};
use crate::config::CaptureConfig;
use crate::error::{RealtimeError, Result};
use crate::events::MediaFrame;
use crate::session::RealtimeSession;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Called with every complete block.
pub type BlockCallback = Box<dyn FnMut(&[f32]) + Send>;

/// Encode one block as an outbound media frame.
pub fn encode_block(block: &[f32], overflow: SampleOverflow) -> MediaFrame {
    MediaFrame::pcm16_input(encode_base64(&float_to_pcm16(block, overflow)))
}

/// Streaming linear-interpolation resampler.
#[derive(Debug, Clone)]
pub struct LinearResampler {
    step: f64,
    position: f64,
    previous: Option<f32>,
}

impl LinearResampler {
    pub fn new(from_rate: u32, to_rate: u32) -> Self {
        Self { step: f64::from(from_rate) / f64::from(to_rate), position: 0.0, previous: None }
    }

    pub fn is_passthrough(&self) -> bool {
        self.step == 1.0
    }

    /// Resample the next chunk, carrying interpolation state across calls.
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        if self.is_passthrough() {
            return input.to_vec();
        }

        // Index 0 is the last sample of the previous chunk, when there is one.
        let offset = usize::from(self.previous.is_some());
        let len = input.len() + offset;
        if len == 0 {
            return Vec::new();
        }
        let sample = |i: usize| match (offset, i) {
            (1, 0) => self.previous.unwrap_or_default(),
            _ => input[i - offset],
        };

        let mut output = Vec::with_capacity((len as f64 / self.step).ceil() as usize);
        while self.position <= (len - 1) as f64 {
            let index = self.position.floor() as usize;
            let fraction = (self.position - index as f64) as f32;
            let current = sample(index);
            let value = if index + 1 < len {
                current + (sample(index + 1) - current) * fraction
            } else {
                current
            };
            output.push(value);
            self.position += self.step;
        }

        let last = sample(len - 1);
        self.previous = Some(last);
        self.position -= (len - 1) as f64;
        output
    }
}

/// Accumulates samples into fixed-size blocks.
#[derive(Debug, Clone)]
pub struct BlockFramer {
    block_size: usize,
    pending: Vec<f32>,
}

impl BlockFramer {
    pub fn new(block_size: usize) -> Self {
        Self { block_size, pending: Vec::with_capacity(block_size) }
    }

    /// Append samples, invoking `emit` once per completed block.
    pub fn push(&mut self, mut samples: &[f32], mut emit: impl FnMut(&[f32])) {
        while !samples.is_empty() {
            let take = (self.block_size - self.pending.len()).min(samples.len());
            self.pending.extend_from_slice(&samples[..take]);
            samples = &samples[take..];
            if self.pending.len() == self.block_size {
                emit(&self.pending);
                self.pending.clear();
            }
        }
    }

    /// Samples waiting for the next block.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Converts microphone audio to the fixed input rate.
#[derive(Debug)]
pub struct InputContext {
    source_rate: u32,
    config: CaptureConfig,
    closed: AtomicBool,
}

impl InputContext {
    pub fn new(source_rate: u32, config: CaptureConfig) -> Result<Self> {
        if source_rate == 0 || config.sample_rate == 0 {
            return Err(RealtimeError::config("Sample rates must be positive"));
        }
        if config.block_size == 0 {
            return Err(RealtimeError::config("Block size must be positive"));
        }
        Ok(Self { source_rate, config, closed: AtomicBool::new(false) })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Start a processor that reads `samples` and calls `on_block` per block.
    pub fn create_block_processor(
        &self,
        mut samples: UnboundedReceiver<Vec<f32>>,
        mut on_block: BlockCallback,
    ) -> Result<BlockProcessor> {
        if self.is_closed() {
            return Err(RealtimeError::audio("Input context is closed"));
        }

        let mut resampler = LinearResampler::new(self.source_rate, self.config.sample_rate);
        let mut framer = BlockFramer::new(self.config.block_size);
        let task = tokio::spawn(async move {
            while let Some(chunk) = samples.recv().await {
                let resampled = resampler.process(&chunk);
                framer.push(&resampled, |block| on_block(block));
            }
            tracing::debug!("Microphone sample stream ended");
        });
        Ok(BlockProcessor { task: Some(task) })
    }

    /// Close the context. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// The task turning microphone chunks into blocks.
#[derive(Debug)]
pub struct BlockProcessor {
    task: Option<JoinHandle<()>>,
}

impl BlockProcessor {
    /// Stop processing. Safe to call more than once.
    pub fn disconnect(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for BlockProcessor {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Block callback that encodes and queues frames without waiting.
pub fn frame_queue(
    frames: UnboundedSender<MediaFrame>,
    overflow: SampleOverflow,
) -> BlockCallback {
    Box::new(move |block| {
        if frames.send(encode_block(block, overflow)).is_err() {
            tracing::trace!("Frame queue closed, dropping block");
        }
    })
}

/// Send queued frames in order until cancelled.
///
/// A failed send is logged and the next frame is still sent.
pub fn spawn_sender(
    session: Arc<dyn RealtimeSession>,
    mut frames: UnboundedReceiver<MediaFrame>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                frame = frames.recv() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = session.send_media(frame) => sent,
            };
            if let Err(e) = sent {
                tracing::warn!(
                    session_id = %session.session_id(),
                    error = %e,
                    "Failed to send audio frame"
                );
            }
        }
    })
}
