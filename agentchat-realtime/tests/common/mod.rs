//! Scripted fakes for the realtime seams.

#![allow(dead_code)]

use agentchat_realtime::audio::{encode_base64, float_to_pcm16};
use agentchat_realtime::{
    AudioBuffer, AudioDevices, BoxedSession, EndedCallback, LiveConfig, MediaFrame,
    MicrophoneStream, OutputContext, RealtimeError, RealtimeModel, RealtimeSession, Result,
    SampleOverflow, ServerContent, ServerEvent, SourceHandle,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};

/// Poll `condition` until it holds or about two seconds pass.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Base64 PCM16 for `samples` frames of constant level at 24 kHz.
pub fn audio_chunk(samples: usize) -> String {
    encode_base64(&float_to_pcm16(&vec![0.1; samples], SampleOverflow::Wrap))
}

pub fn transcript(text: &str) -> ServerEvent {
    ServerContent::default().with_input_transcription(text).into()
}

/// Test-side view of one fake session.
pub struct SessionHandle {
    id: String,
    events: Mutex<Option<mpsc::UnboundedSender<Result<ServerEvent>>>>,
    inbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<ServerEvent>>>,
    sent: Mutex<Vec<MediaFrame>>,
    closed: AtomicBool,
    failing_sends: AtomicUsize,
    reject_close: AtomicBool,
}

impl SessionHandle {
    pub fn new(id: &str) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            id: id.to_string(),
            events: Mutex::new(Some(tx)),
            inbox: tokio::sync::Mutex::new(rx),
            sent: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            failing_sends: AtomicUsize::new(0),
            reject_close: AtomicBool::new(false),
        })
    }

    /// Fail the next `count` sends while staying open.
    pub fn fail_next_sends(&self, count: usize) {
        self.failing_sends.store(count, Ordering::SeqCst);
    }

    /// Make every close fail and leave the session open.
    pub fn reject_close(&self) {
        self.reject_close.store(true, Ordering::SeqCst);
    }

    /// Deliver a server event.
    pub fn push(&self, event: impl Into<ServerEvent>) {
        if let Some(tx) = self.events.lock().as_ref() {
            let _ = tx.send(Ok(event.into()));
        }
    }

    /// Deliver a transport error.
    pub fn fail(&self, error: RealtimeError) {
        if let Some(tx) = self.events.lock().as_ref() {
            let _ = tx.send(Err(error));
        }
    }

    /// Close from the remote side.
    pub fn hang_up(&self) {
        self.events.lock().take();
    }

    pub fn sent(&self) -> Vec<MediaFrame> {
        self.sent.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct FakeSession(Arc<SessionHandle>);

#[async_trait]
impl RealtimeSession for FakeSession {
    fn session_id(&self) -> &str {
        &self.0.id
    }

    fn is_connected(&self) -> bool {
        !self.0.is_closed()
    }

    async fn send_media(&self, frame: MediaFrame) -> Result<()> {
        if self.0.is_closed() {
            return Err(RealtimeError::NotConnected);
        }
        let failing = self.0.failing_sends.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
            n.checked_sub(1)
        });
        if failing.is_ok() {
            return Err(RealtimeError::connection("send rejected"));
        }
        self.0.sent.lock().push(frame);
        Ok(())
    }

    async fn next_event(&self) -> Option<Result<ServerEvent>> {
        self.0.inbox.lock().await.recv().await
    }

    async fn close(&self) -> Result<()> {
        if self.0.reject_close.load(Ordering::SeqCst) {
            return Err(RealtimeError::connection("close rejected"));
        }
        if self.0.closed.swap(true, Ordering::SeqCst) {
            return Err(RealtimeError::SessionClosed);
        }
        Ok(())
    }
}

/// Hands out queued sessions in order.
#[derive(Default)]
pub struct FakeModel {
    api_key: Option<String>,
    sessions: Mutex<VecDeque<Arc<SessionHandle>>>,
    refuse: AtomicBool,
    gate: Option<Arc<Notify>>,
    connects: AtomicUsize,
    configs: Mutex<Vec<LiveConfig>>,
}

impl FakeModel {
    pub fn new() -> Self {
        Self { api_key: Some("test-key".to_string()), ..Default::default() }
    }

    pub fn without_key() -> Self {
        Self::default()
    }

    /// Hold every connect until `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self { gate: Some(gate), ..Self::new() }
    }

    pub fn queue(&self, session: &Arc<SessionHandle>) {
        self.sessions.lock().push_back(session.clone());
    }

    pub fn refuse_connections(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn configs(&self) -> Vec<LiveConfig> {
        self.configs.lock().clone()
    }
}

#[async_trait]
impl RealtimeModel for FakeModel {
    fn provider(&self) -> &str {
        "fake"
    }

    fn model_id(&self) -> &str {
        "fake-live"
    }

    fn ensure_credentials(&self) -> Result<()> {
        match &self.api_key {
            Some(_) => Ok(()),
            None => Err(RealtimeError::missing_credential("GOOGLE_API_KEY")),
        }
    }

    async fn connect(&self, config: LiveConfig) -> Result<BoxedSession> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.configs.lock().push(config);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.refuse.load(Ordering::SeqCst) {
            return Err(RealtimeError::connection("connection refused"));
        }
        let session = self
            .sessions
            .lock()
            .pop_front()
            .ok_or_else(|| RealtimeError::connection("no session queued"))?;
        Ok(Box::new(FakeSession(session)))
    }
}

struct FakeMicrophone {
    samples: Option<mpsc::UnboundedReceiver<Vec<f32>>>,
    active: Arc<AtomicBool>,
}

impl MicrophoneStream for FakeMicrophone {
    fn sample_rate(&self) -> u32 {
        16_000
    }

    fn take_samples(&mut self) -> Option<mpsc::UnboundedReceiver<Vec<f32>>> {
        self.samples.take()
    }

    fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// A 16 kHz microphone and recording outputs.
#[derive(Default)]
pub struct FakeDevices {
    deny: bool,
    microphone: Mutex<Option<mpsc::UnboundedSender<Vec<f32>>>>,
    mic_active: Arc<AtomicBool>,
    mic_opens: AtomicUsize,
    outputs: Mutex<Vec<Arc<FakeOutput>>>,
}

impl FakeDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denying() -> Self {
        Self { deny: true, ..Self::default() }
    }

    /// Feed samples as if spoken into the microphone.
    pub fn speak(&self, samples: &[f32]) {
        if let Some(tx) = self.microphone.lock().as_ref() {
            let _ = tx.send(samples.to_vec());
        }
    }

    pub fn mic_active(&self) -> bool {
        self.mic_active.load(Ordering::SeqCst)
    }

    pub fn mic_opens(&self) -> usize {
        self.mic_opens.load(Ordering::SeqCst)
    }

    pub fn outputs(&self) -> Vec<Arc<FakeOutput>> {
        self.outputs.lock().clone()
    }

    pub fn last_output(&self) -> Option<Arc<FakeOutput>> {
        self.outputs.lock().last().cloned()
    }
}

#[async_trait]
impl AudioDevices for FakeDevices {
    async fn open_microphone(&self) -> Result<Box<dyn MicrophoneStream>> {
        self.mic_opens.fetch_add(1, Ordering::SeqCst);
        if self.deny {
            return Err(RealtimeError::permission("NotAllowedError"));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.microphone.lock() = Some(tx);
        self.mic_active.store(true, Ordering::SeqCst);
        Ok(Box::new(FakeMicrophone { samples: Some(rx), active: self.mic_active.clone() }))
    }

    async fn open_output(&self, sample_rate: u32) -> Result<Arc<dyn OutputContext>> {
        let output = Arc::new(FakeOutput::new(sample_rate));
        self.outputs.lock().push(output.clone());
        Ok(output)
    }
}

struct ScheduledSource {
    start_at: f64,
    duration: f64,
    stopped: Arc<AtomicBool>,
    on_ended: Option<EndedCallback>,
}

/// Output context with a hand-driven clock.
pub struct FakeOutput {
    sample_rate: u32,
    clock: Mutex<f64>,
    sources: Mutex<Vec<ScheduledSource>>,
    closed: AtomicBool,
    end_on_schedule: bool,
}

impl FakeOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            clock: Mutex::new(0.0),
            sources: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            end_on_schedule: false,
        }
    }

    /// Every source ends on a render thread before `schedule` returns its handle.
    pub fn ending_on_schedule(sample_rate: u32) -> Self {
        Self { end_on_schedule: true, ..Self::new(sample_rate) }
    }

    pub fn set_time(&self, seconds: f64) {
        *self.clock.lock() = seconds;
    }

    /// `(start_at, duration)` of every scheduled buffer.
    pub fn scheduled(&self) -> Vec<(f64, f64)> {
        self.sources.lock().iter().map(|s| (s.start_at, s.duration)).collect()
    }

    pub fn stopped(&self) -> Vec<bool> {
        self.sources.lock().iter().map(|s| s.stopped.load(Ordering::SeqCst)).collect()
    }

    /// Let every unstopped source play to its end.
    pub fn finish_all(&self) {
        let callbacks: Vec<EndedCallback> = self
            .sources
            .lock()
            .iter_mut()
            .filter(|s| !s.stopped.load(Ordering::SeqCst))
            .filter_map(|s| s.on_ended.take())
            .collect();
        for on_ended in callbacks {
            on_ended();
        }
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutputContext for FakeOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        *self.clock.lock()
    }

    fn schedule(
        &self,
        buffer: AudioBuffer,
        start_at: f64,
        on_ended: EndedCallback,
    ) -> Result<Box<dyn SourceHandle>> {
        if self.closed() {
            return Err(RealtimeError::device("output closed"));
        }
        let stopped = Arc::new(AtomicBool::new(false));
        let on_ended = if self.end_on_schedule {
            let _ = std::thread::spawn(on_ended).join();
            None
        } else {
            Some(on_ended)
        };
        self.sources.lock().push(ScheduledSource {
            start_at,
            duration: buffer.duration(),
            stopped: stopped.clone(),
            on_ended,
        });
        Ok(Box::new(FakeSource(stopped)))
    }

    fn is_closed(&self) -> bool {
        self.closed()
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(RealtimeError::device("output already closed"));
        }
        Ok(())
    }
}

struct FakeSource(Arc<AtomicBool>);

impl SourceHandle for FakeSource {
    fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}
