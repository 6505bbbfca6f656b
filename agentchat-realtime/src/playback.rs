//! Gapless scheduling of model audio.

use crate::audio::{AudioBuffer, OUTPUT_SAMPLE_RATE, decode_base64, decode_pcm16};
use crate::device::{OutputContext, SourceHandle};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Sources by id. `None` marks an id whose handle has not come back from
/// the output yet; its end may still arrive first.
type SourceSet = Arc<Mutex<HashMap<u64, Option<Box<dyn SourceHandle>>>>>;

/// Schedules decoded chunks back to back on one output context.
///
/// A single cursor marks where the next chunk starts. Each chunk begins at
/// `max(cursor, clock)` and pushes the cursor forward by its duration, so
/// consecutive chunks neither overlap nor leave gaps. Playing sources are
/// tracked until they end or are stopped.
pub struct PlaybackScheduler {
    context: Arc<dyn OutputContext>,
    next_start: f64,
    next_id: u64,
    sources: SourceSet,
}

impl PlaybackScheduler {
    pub fn new(context: Arc<dyn OutputContext>) -> Self {
        Self { context, next_start: 0.0, next_id: 0, sources: Arc::default() }
    }

    pub fn context(&self) -> &Arc<dyn OutputContext> {
        &self.context
    }

    /// Where the next chunk would start if the clock were at zero.
    pub fn next_start_time(&self) -> f64 {
        self.next_start
    }

    /// Number of sources scheduled or playing.
    pub fn active_sources(&self) -> usize {
        self.sources.lock().len()
    }

    /// Decode a base64 PCM16 mono 24 kHz fragment and schedule it.
    ///
    /// Returns the start time it was scheduled at.
    pub fn enqueue_base64(&mut self, data: &str) -> Result<f64> {
        let bytes = decode_base64(data)?;
        let buffer = decode_pcm16(&bytes, OUTPUT_SAMPLE_RATE, 1)?;
        self.schedule(buffer)
    }

    /// Schedule a decoded buffer right after everything already queued.
    ///
    /// The id is reserved before the output sees the buffer, so an end
    /// notification that beats the returned handle still clears the entry.
    pub fn schedule(&mut self, buffer: AudioBuffer) -> Result<f64> {
        let start_at = self.next_start.max(self.context.current_time());
        let duration = buffer.duration();

        let id = self.next_id;
        self.next_id += 1;
        self.sources.lock().insert(id, None);

        let sources = Arc::downgrade(&self.sources);
        let handle = match self.context.schedule(
            buffer,
            start_at,
            Box::new(move || release(&sources, id)),
        ) {
            Ok(handle) => handle,
            Err(e) => {
                self.sources.lock().remove(&id);
                return Err(e);
            }
        };

        self.next_start = start_at + duration;
        match self.sources.lock().get_mut(&id) {
            Some(slot) => *slot = Some(handle),
            None => tracing::trace!(source_id = id, "Playback chunk ended before registration"),
        }
        tracing::trace!(source_id = id, start_at, duration, "Scheduled playback chunk");
        Ok(start_at)
    }

    /// Stop every source and rewind the cursor so new audio starts now.
    pub fn interrupt(&mut self) {
        let stopped = self.stop_all();
        self.reset_cursor();
        tracing::debug!(stopped, "Playback interrupted");
    }

    /// Stop and forget every scheduled or playing source. Returns how many were stopped.
    pub fn stop_all(&mut self) -> usize {
        let drained: Vec<_> =
            self.sources.lock().drain().filter_map(|(_, handle)| handle).collect();
        for handle in &drained {
            handle.stop();
        }
        drained.len()
    }

    pub fn reset_cursor(&mut self) {
        self.next_start = 0.0;
    }
}

fn release(sources: &Weak<Mutex<HashMap<u64, Option<Box<dyn SourceHandle>>>>>, id: u64) {
    if let Some(sources) = sources.upgrade() {
        sources.lock().remove(&id);
    }
}

impl std::fmt::Debug for PlaybackScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackScheduler")
            .field("next_start", &self.next_start)
            .field("active_sources", &self.active_sources())
            .finish()
    }
}
