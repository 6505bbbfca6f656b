//! Lifecycle of one voice call.
//!
//! [`LiveConversation`] owns every resource of a call: the session, the
//! microphone, the capture processor, both audio contexts and the playback
//! timeline. All teardown paths (explicit stop, remote error, remote close,
//! drop) funnel into one release routine that runs at most once per call.
//!
//! Each call gets a generation number. Events are applied only while their
//! generation is the active one, so a late message from a superseded session
//! can never touch the state of the next call.

use crate::audio::OUTPUT_SAMPLE_RATE;
use crate::capture::{self, BlockProcessor, InputContext};
use crate::config::{CaptureConfig, LiveConfig};
use crate::device::{AudioDevices, MicrophoneStream};
use crate::error::{CONNECTION_ERROR_MESSAGE, RealtimeError, Result};
use crate::events::{ServerContent, ServerEvent};
use crate::model::RealtimeModel;
use crate::playback::PlaybackScheduler;
use crate::session::RealtimeSession;
use crate::transcription::TranscriptionAccumulator;
use agentchat_telemetry::live_session_span;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Receives the full inbound transcript each time it grows.
pub type TranscriptCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Snapshot published to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStatus {
    /// A call is starting, running or shutting down.
    pub live: bool,
    /// Last user-facing failure, cleared when a new call starts.
    pub error: Option<String>,
}

/// Apply one server message to the transcripts and the playback timeline.
///
/// Steps run in a fixed order: inbound transcript, outbound transcript,
/// turn completion, audio, interruption. An empty audio payload schedules
/// nothing. Returns the inbound transcript when it changed, captured before
/// any turn reset in the same message.
pub fn apply_server_content(
    content: &ServerContent,
    transcripts: &mut TranscriptionAccumulator,
    playback: &mut PlaybackScheduler,
) -> Option<String> {
    let mut changed_input = None;

    if let Some(fragment) = &content.input_transcription {
        changed_input = Some(transcripts.append_input(fragment).to_string());
    }

    if let Some(fragment) = &content.output_transcription {
        let output = transcripts.append_output(fragment);
        tracing::debug!(transcript = %output, "Model transcript");
    }

    if content.turn_complete {
        transcripts.reset();
    }

    if let Some(audio) = content.audio.as_ref().filter(|audio| !audio.data.is_empty()) {
        if let Err(e) = playback.enqueue_base64(&audio.data) {
            tracing::warn!(error = %e, mime_type = %audio.mime_type, "Dropping undecodable audio");
        }
    }

    if content.interrupted {
        playback.interrupt();
    }

    changed_input
}

enum Phase {
    Idle,
    Connecting,
    Active(Box<ActiveCall>),
    Closing,
}

struct State {
    phase: Phase,
    generation: u64,
    error: Option<String>,
}

impl State {
    fn status(&self) -> CallStatus {
        CallStatus { live: !matches!(self.phase, Phase::Idle), error: self.error.clone() }
    }
}

/// Resources held by one call. Every field is optional so a half-built call
/// can go through the same release path as a running one.
struct ActiveCall {
    generation: u64,
    cancel: CancellationToken,
    session: Option<Arc<dyn RealtimeSession>>,
    microphone: Option<Box<dyn MicrophoneStream>>,
    processor: Option<BlockProcessor>,
    input: Option<InputContext>,
    playback: Option<PlaybackScheduler>,
    transcripts: TranscriptionAccumulator,
    tasks: Vec<JoinHandle<()>>,
}

impl Drop for ActiveCall {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(microphone) = &self.microphone {
            microphone.stop();
        }
    }
}

impl ActiveCall {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            cancel: CancellationToken::new(),
            session: None,
            microphone: None,
            processor: None,
            input: None,
            playback: None,
            transcripts: TranscriptionAccumulator::new(),
            tasks: Vec::new(),
        }
    }
}

struct Inner {
    model: Arc<dyn RealtimeModel>,
    devices: Arc<dyn AudioDevices>,
    config: LiveConfig,
    capture: CaptureConfig,
    on_input_transcript: Option<TranscriptCallback>,
    state: Mutex<State>,
    status: watch::Sender<CallStatus>,
}

/// Builder for [`LiveConversation`].
pub struct LiveConversationBuilder {
    model: Arc<dyn RealtimeModel>,
    devices: Arc<dyn AudioDevices>,
    config: LiveConfig,
    capture: CaptureConfig,
    on_input_transcript: Option<TranscriptCallback>,
}

impl LiveConversationBuilder {
    /// Set the session profile.
    pub fn config(mut self, config: LiveConfig) -> Self {
        self.config = config;
        self
    }

    /// Set microphone framing.
    pub fn capture(mut self, capture: CaptureConfig) -> Self {
        self.capture = capture;
        self
    }

    /// Register the inbound transcript observer.
    pub fn on_input_transcript(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_input_transcript = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> LiveConversation {
        let (status, _) = watch::channel(CallStatus::default());
        LiveConversation {
            inner: Arc::new(Inner {
                model: self.model,
                devices: self.devices,
                config: self.config,
                capture: self.capture,
                on_input_transcript: self.on_input_transcript,
                state: Mutex::new(State { phase: Phase::Idle, generation: 0, error: None }),
                status,
            }),
        }
    }
}

/// Manager for a realtime voice call.
///
/// # Example
///
/// ```rust,ignore
/// let call = LiveConversation::builder(model, devices)
///     .on_input_transcript(|text| println!("you: {text}"))
///     .build();
///
/// call.start().await?;
/// // ... talk ...
/// call.stop().await;
/// ```
pub struct LiveConversation {
    inner: Arc<Inner>,
}

impl LiveConversation {
    pub fn builder(
        model: Arc<dyn RealtimeModel>,
        devices: Arc<dyn AudioDevices>,
    ) -> LiveConversationBuilder {
        LiveConversationBuilder {
            model,
            devices,
            config: LiveConfig::default(),
            capture: CaptureConfig::default(),
            on_input_transcript: None,
        }
    }

    /// Start a call.
    ///
    /// Ignored while a call is already live. The live flag is raised before
    /// any device or network work so observers see the call immediately. On
    /// failure every acquired resource is released, the flag drops and
    /// [`error`](Self::error) holds a user-facing message.
    pub async fn start(&self) -> Result<()> {
        let generation = {
            let mut state = self.inner.state.lock();
            if !matches!(state.phase, Phase::Idle) {
                tracing::debug!("Call already live, ignoring start");
                return Ok(());
            }
            state.generation += 1;
            state.phase = Phase::Connecting;
            state.error = None;
            self.inner.status.send_replace(state.status());
            state.generation
        };

        let mut pending = PendingStart { inner: &self.inner, armed: true };
        let span = tracing::info_span!(
            "live.start",
            model.name = %self.inner.model.model_id(),
            call.generation = generation
        );
        let opened = self.inner.open(generation).instrument(span).await;
        pending.armed = false;

        match opened {
            Ok(call) => {
                self.inner.install(call).await;
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to start live conversation");
                let mut state = self.inner.state.lock();
                if matches!(state.phase, Phase::Connecting) && state.generation == generation {
                    state.error = Some(err.user_message().to_string());
                }
                state.phase = Phase::Idle;
                self.inner.status.send_replace(state.status());
                Err(err)
            }
        }
    }

    /// End the call and release everything it holds.
    ///
    /// Safe to call when idle, repeatedly or concurrently; it always returns
    /// with the manager idle.
    pub async fn stop(&self) {
        self.inner.stop().await;
    }

    pub fn is_live(&self) -> bool {
        self.inner.state.lock().status().live
    }

    /// Last user-facing error, if any.
    pub fn error(&self) -> Option<String> {
        self.inner.state.lock().error.clone()
    }

    pub fn status(&self) -> CallStatus {
        self.inner.state.lock().status()
    }

    /// Observe status changes.
    pub fn subscribe(&self) -> watch::Receiver<CallStatus> {
        self.inner.status.subscribe()
    }

    /// Inbound transcript of the current turn.
    pub fn input_transcript(&self) -> String {
        self.inner.with_active(|call| call.transcripts.input().to_string()).unwrap_or_default()
    }

    /// Outbound transcript of the current turn.
    pub fn output_transcript(&self) -> String {
        self.inner.with_active(|call| call.transcripts.output().to_string()).unwrap_or_default()
    }

    /// Sources currently scheduled or playing.
    pub fn active_sources(&self) -> usize {
        self.inner
            .with_active(|call| call.playback.as_ref().map_or(0, PlaybackScheduler::active_sources))
            .unwrap_or_default()
    }
}

/// Returns the manager to idle if a `start` future is dropped mid-open.
struct PendingStart<'a> {
    inner: &'a Inner,
    armed: bool,
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.inner.state.lock();
        if matches!(state.phase, Phase::Connecting | Phase::Closing) {
            tracing::warn!("Start cancelled before the call was set up");
            state.phase = Phase::Idle;
            self.inner.status.send_replace(state.status());
        }
    }
}

impl Drop for LiveConversation {
    fn drop(&mut self) {
        if matches!(self.inner.state.lock().phase, Phase::Idle) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = self.inner.clone();
                handle.spawn(async move { inner.stop().await });
            }
            Err(_) => tracing::warn!("Live conversation dropped outside a runtime while live"),
        }
    }
}

impl Inner {
    fn with_active<T>(&self, f: impl FnOnce(&ActiveCall) -> T) -> Option<T> {
        match &self.state.lock().phase {
            Phase::Active(call) => Some(f(call)),
            _ => None,
        }
    }

    /// Acquire devices and the session. A failure releases whatever was acquired.
    async fn open(&self, generation: u64) -> Result<ActiveCall> {
        self.model.ensure_credentials()?;

        let mut call = ActiveCall::new(generation);
        match self.acquire(&mut call).await {
            Ok(()) => Ok(call),
            Err(err) => {
                release(call).await;
                Err(err)
            }
        }
    }

    async fn acquire(&self, call: &mut ActiveCall) -> Result<()> {
        let mut microphone = self.devices.open_microphone().await?;
        let samples = microphone.take_samples();
        let source_rate = microphone.sample_rate();
        call.microphone = Some(microphone);
        let samples =
            samples.ok_or_else(|| RealtimeError::device("Microphone samples already taken"))?;

        call.input = Some(InputContext::new(source_rate, self.capture)?);
        let output = self.devices.open_output(OUTPUT_SAMPLE_RATE).await?;
        call.playback = Some(PlaybackScheduler::new(output));

        let session: Arc<dyn RealtimeSession> =
            Arc::from(self.model.connect(self.config.clone()).await?);
        tracing::info!(session_id = %session.session_id(), "Live session opened");
        call.session = Some(session.clone());

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        call.tasks.push(capture::spawn_sender(session, frames_rx, call.cancel.clone()));
        if let Some(input) = &call.input {
            let on_block = capture::frame_queue(frames_tx, self.capture.overflow);
            call.processor = Some(input.create_block_processor(samples, on_block)?);
        }
        Ok(())
    }

    /// Make `call` the active call, unless a stop arrived while it was opening.
    async fn install(self: &Arc<Self>, mut call: ActiveCall) {
        {
            let mut state = self.state.lock();
            if matches!(state.phase, Phase::Connecting) && state.generation == call.generation {
                if let Some(session) = call.session.clone() {
                    let span = live_session_span(session.session_id(), self.model.model_id());
                    let pump = tokio::spawn(
                        pump_events(self.clone(), session, call.generation, call.cancel.clone())
                            .instrument(span),
                    );
                    call.tasks.push(pump);
                }
                state.phase = Phase::Active(Box::new(call));
                self.status.send_replace(state.status());
                return;
            }
        }

        tracing::debug!(call.generation = call.generation, "Call stopped while connecting");
        release(call).await;
        let mut state = self.state.lock();
        if matches!(state.phase, Phase::Closing) {
            state.phase = Phase::Idle;
            self.status.send_replace(state.status());
        }
    }

    async fn stop(&self) {
        let mut status = self.status.subscribe();
        let call = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut state.phase, Phase::Closing) {
                Phase::Idle => {
                    state.phase = Phase::Idle;
                    return;
                }
                Phase::Active(call) => Some(call),
                Phase::Connecting => {
                    // The pending open sees the new generation and releases itself.
                    state.generation += 1;
                    None
                }
                Phase::Closing => None,
            }
        };

        match call {
            Some(call) => self.teardown(*call).await,
            None => {
                if status.wait_for(|s| !s.live).await.is_err() {
                    tracing::warn!("Status channel closed while waiting for teardown");
                }
            }
        }
    }

    /// End the call of `generation` after a remote error or close.
    async fn end_call(&self, generation: u64, error: Option<&str>) {
        let call = {
            let mut state = self.state.lock();
            match &state.phase {
                Phase::Active(call) if call.generation == generation => {}
                _ => return,
            }
            if let Some(message) = error {
                state.error = Some(message.to_string());
            }
            match std::mem::replace(&mut state.phase, Phase::Closing) {
                Phase::Active(call) => call,
                _ => return,
            }
        };
        self.teardown(*call).await;
    }

    async fn teardown(&self, call: ActiveCall) {
        release(call).await;
        let mut state = self.state.lock();
        state.phase = Phase::Idle;
        self.status.send_replace(state.status());
        tracing::info!("Live conversation ended");
    }

    fn handle_event(&self, generation: u64, event: ServerEvent) {
        let content = match event {
            ServerEvent::Content(content) => content,
            ServerEvent::SetupComplete => {
                tracing::debug!("Live session setup complete");
                return;
            }
            ServerEvent::Unknown => return,
        };

        let changed_input = {
            let mut state = self.state.lock();
            let Phase::Active(call) = &mut state.phase else {
                tracing::trace!("Dropping event for inactive call");
                return;
            };
            if call.generation != generation {
                tracing::trace!(call.generation = generation, "Dropping stale event");
                return;
            }
            let call = call.as_mut();
            match call.playback.as_mut() {
                Some(playback) => apply_server_content(&content, &mut call.transcripts, playback),
                None => return,
            }
        };

        if let (Some(text), Some(callback)) = (changed_input, &self.on_input_transcript) {
            callback(&text);
        }
    }
}

/// Feed server events into the call until it is cancelled or the session ends.
///
/// A malformed message is skipped. Any other session error ends the call.
async fn pump_events(
    inner: Arc<Inner>,
    session: Arc<dyn RealtimeSession>,
    generation: u64,
    cancel: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = session.next_event() => next,
        };
        match next {
            Some(Ok(event)) => inner.handle_event(generation, event),
            Some(Err(e)) if e.is_malformed_message() => {
                tracing::warn!(
                    session_id = %session.session_id(),
                    error = %e,
                    "Skipping malformed server message"
                );
            }
            Some(Err(e)) => {
                tracing::error!(
                    session_id = %session.session_id(),
                    error = %e,
                    "Live session error"
                );
                inner.end_call(generation, Some(CONNECTION_ERROR_MESSAGE)).await;
                return;
            }
            None => {
                tracing::info!(session_id = %session.session_id(), "Live session closed by remote");
                inner.end_call(generation, None).await;
                return;
            }
        }
    }
}

/// Release every resource of `call`, in order, each step independently.
///
/// Close failures are logged and never stop the remaining steps. The session
/// and output closes run as their own tasks so a hang in either cannot hold
/// back the other releases.
async fn release(mut call: ActiveCall) {
    call.cancel.cancel();

    let session_close = call.session.take().map(|session| {
        tokio::spawn(async move {
            if let Err(e) = session.close().await {
                tracing::warn!(
                    session_id = %session.session_id(),
                    error = %e,
                    "Failed to close live session"
                );
            }
        })
    });

    if let Some(microphone) = call.microphone.take() {
        microphone.stop();
    }

    if let Some(mut processor) = call.processor.take() {
        processor.disconnect();
    }

    if let Some(input) = call.input.take() {
        input.close();
    }
    let output_close = call.playback.as_ref().map(|playback| {
        let context = playback.context().clone();
        tokio::spawn(async move {
            if context.is_closed() {
                return;
            }
            if let Err(e) = context.close().await {
                tracing::warn!(error = %e, "Failed to close output context");
            }
        })
    });

    if let Some(playback) = call.playback.as_mut() {
        playback.stop_all();
        playback.reset_cursor();
    }
    call.transcripts.reset();

    for task in [session_close, output_close].into_iter().flatten() {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Release task failed");
        }
    }

    // Sender and pump exit through the cancellation token; the pump may be
    // the task running this release, so it is never aborted here.
    call.tasks.clear();
}
