//! Desktop microphone and speaker backend built on `cpal`.
//!
//! cpal streams are not `Send` on every platform, so each stream lives on a
//! dedicated thread that owns it until told to stop. Playback mixes scheduled
//! buffers against a frame counter advanced by the output callback; end
//! notifications run on a separate thread, never on the audio thread.

use crate::audio::AudioBuffer;
use crate::capture::LinearResampler;
use crate::device::{AudioDevices, EndedCallback, MicrophoneStream, OutputContext, SourceHandle};
use crate::error::{RealtimeError, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use tokio::sync::{mpsc, oneshot};

/// Default host input and output devices.
#[derive(Debug, Default, Clone)]
pub struct CpalDevices;

impl CpalDevices {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioDevices for CpalDevices {
    async fn open_microphone(&self) -> Result<Box<dyn MicrophoneStream>> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (samples_tx, samples_rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("agentchat-mic".to_string())
            .spawn(move || match build_input_stream(samples_tx) {
                Ok((stream, sample_rate)) => {
                    let _ = ready_tx.send(Ok(sample_rate));
                    // Blocks until stop() or the microphone handle is dropped.
                    let _ = stop_rx.recv();
                    drop(stream);
                    tracing::debug!("Microphone stream released");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| RealtimeError::device(format!("Failed to spawn input thread: {}", e)))?;

        let sample_rate = ready_rx
            .await
            .map_err(|_| RealtimeError::device("Input thread exited during setup"))??;
        tracing::info!(sample_rate, "Microphone opened");

        Ok(Box::new(CpalMicrophone {
            sample_rate,
            samples: Some(samples_rx),
            stop: Mutex::new(Some(stop_tx)),
            active: AtomicBool::new(true),
        }))
    }

    async fn open_output(&self, sample_rate: u32) -> Result<Arc<dyn OutputContext>> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ended_tx, ended_rx) = std_mpsc::channel::<EndedCallback>();

        std::thread::Builder::new()
            .name("agentchat-ended".to_string())
            .spawn(move || {
                while let Ok(on_ended) = ended_rx.recv() {
                    on_ended();
                }
            })
            .map_err(|e| RealtimeError::device(format!("Failed to spawn notifier: {}", e)))?;

        std::thread::Builder::new()
            .name("agentchat-speaker".to_string())
            .spawn(move || match build_output_stream(sample_rate, ended_tx) {
                Ok((stream, mixer, device_rate)) => {
                    let _ = ready_tx.send(Ok((mixer, device_rate)));
                    let _ = stop_rx.recv();
                    drop(stream);
                    tracing::debug!("Output stream released");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| RealtimeError::device(format!("Failed to spawn output thread: {}", e)))?;

        let (mixer, device_rate) = ready_rx
            .await
            .map_err(|_| RealtimeError::device("Output thread exited during setup"))??;
        tracing::info!(requested = sample_rate, device_rate, "Output context opened");

        Ok(Arc::new(CpalOutput {
            mixer,
            sample_rate: device_rate,
            stop: Mutex::new(Some(stop_tx)),
            closed: AtomicBool::new(false),
        }))
    }
}

fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels).map(|frame| frame.iter().sum::<f32>() / frame.len() as f32).collect()
}

fn build_input_stream(
    samples: mpsc::UnboundedSender<Vec<f32>>,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| RealtimeError::permission("No default input device available"))?;
    let supported = device
        .default_input_config()
        .map_err(|e| RealtimeError::permission(format!("Failed to get input config: {}", e)))?;

    let sample_rate = supported.sample_rate().0;
    let channels = usize::from(supported.channels());
    let config: cpal::StreamConfig = supported.config();
    let err_fn = |err| tracing::error!(error = %err, "Input stream error");

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = samples.send(downmix(data, channels));
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let converted: Vec<f32> = data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                let _ = samples.send(downmix(&converted, channels));
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                let converted: Vec<f32> =
                    data.iter().map(|&s| (f32::from(s) - 32768.0) / 32768.0).collect();
                let _ = samples.send(downmix(&converted, channels));
            },
            err_fn,
            None,
        ),
        other => {
            return Err(RealtimeError::device(format!("Unsupported input format: {:?}", other)));
        }
    }
    .map_err(|e| match e {
        cpal::BuildStreamError::DeviceNotAvailable => {
            RealtimeError::permission("Input device is not available")
        }
        other => RealtimeError::device(format!("Failed to build input stream: {}", other)),
    })?;

    stream
        .play()
        .map_err(|e| RealtimeError::device(format!("Failed to start input stream: {}", e)))?;
    Ok((stream, sample_rate))
}

fn build_output_stream(
    sample_rate: u32,
    ended: std_mpsc::Sender<EndedCallback>,
) -> Result<(cpal::Stream, Arc<Mutex<Mixer>>, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| RealtimeError::device("No default output device available"))?;

    let requested = cpal::SampleRate(sample_rate);
    let exact = device
        .supported_output_configs()
        .map_err(|e| RealtimeError::device(format!("Failed to list output configs: {}", e)))?
        .find(|range| {
            range.sample_format() == cpal::SampleFormat::F32
                && range.min_sample_rate() <= requested
                && range.max_sample_rate() >= requested
        })
        .map(|range| range.with_sample_rate(requested));
    let supported = match exact {
        Some(supported) => supported,
        None => device
            .default_output_config()
            .map_err(|e| RealtimeError::device(format!("Failed to get output config: {}", e)))?,
    };
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(RealtimeError::device(format!(
            "Unsupported output format: {:?}",
            supported.sample_format()
        )));
    }

    let device_rate = supported.sample_rate().0;
    let channels = usize::from(supported.channels());
    let config: cpal::StreamConfig = supported.config();
    let mixer = Arc::new(Mutex::new(Mixer::new(device_rate, ended)));
    let render_mixer = mixer.clone();

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                render_mixer.lock().render(data, channels);
            },
            |err| tracing::error!(error = %err, "Output stream error"),
            None,
        )
        .map_err(|e| RealtimeError::device(format!("Failed to build output stream: {}", e)))?;
    stream
        .play()
        .map_err(|e| RealtimeError::device(format!("Failed to start output stream: {}", e)))?;
    Ok((stream, mixer, device_rate))
}

struct CpalMicrophone {
    sample_rate: u32,
    samples: Option<mpsc::UnboundedReceiver<Vec<f32>>>,
    stop: Mutex<Option<std_mpsc::Sender<()>>>,
    active: AtomicBool,
}

impl MicrophoneStream for CpalMicrophone {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn take_samples(&mut self) -> Option<mpsc::UnboundedReceiver<Vec<f32>>> {
        self.samples.take()
    }

    fn stop(&self) {
        if let Some(stop) = self.stop.lock().take() {
            let _ = stop.send(());
        }
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

struct Voice {
    start_frame: u64,
    samples: Vec<f32>,
    position: usize,
    stopped: Arc<AtomicBool>,
    on_ended: Option<EndedCallback>,
}

/// Sums scheduled voices into the output buffer on a shared frame clock.
struct Mixer {
    sample_rate: u32,
    frames_rendered: u64,
    voices: Vec<Voice>,
    ended: std_mpsc::Sender<EndedCallback>,
}

impl Mixer {
    fn new(sample_rate: u32, ended: std_mpsc::Sender<EndedCallback>) -> Self {
        Self { sample_rate, frames_rendered: 0, voices: Vec::new(), ended }
    }

    fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / f64::from(self.sample_rate)
    }

    fn render(&mut self, data: &mut [f32], channels: usize) {
        let frames = data.len() / channels.max(1);
        data.fill(0.0);

        for voice in &mut self.voices {
            if voice.stopped.load(Ordering::Relaxed) {
                continue;
            }
            for frame in 0..frames {
                let clock = self.frames_rendered + frame as u64;
                if clock < voice.start_frame || voice.position >= voice.samples.len() {
                    continue;
                }
                let sample = voice.samples[voice.position];
                voice.position += 1;
                for out in &mut data[frame * channels..(frame + 1) * channels] {
                    *out += sample;
                }
            }
        }
        self.frames_rendered += frames as u64;

        let ended = &self.ended;
        self.voices.retain_mut(|voice| {
            if voice.stopped.load(Ordering::Relaxed) {
                return false;
            }
            if voice.position < voice.samples.len() {
                return true;
            }
            if let Some(on_ended) = voice.on_ended.take() {
                let _ = ended.send(on_ended);
            }
            false
        });
    }
}

struct CpalOutput {
    mixer: Arc<Mutex<Mixer>>,
    sample_rate: u32,
    stop: Mutex<Option<std_mpsc::Sender<()>>>,
    closed: AtomicBool,
}

#[async_trait]
impl OutputContext for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.mixer.lock().current_time()
    }

    fn schedule(
        &self,
        buffer: AudioBuffer,
        start_at: f64,
        on_ended: EndedCallback,
    ) -> Result<Box<dyn SourceHandle>> {
        if self.is_closed() {
            return Err(RealtimeError::device("Output context is closed"));
        }

        let mono: Vec<f32> = (0..buffer.frame_count())
            .map(|frame| {
                let sum: f32 = (0..buffer.channel_count())
                    .filter_map(|c| buffer.channel(c).map(|samples| samples[frame]))
                    .sum();
                sum / buffer.channel_count() as f32
            })
            .collect();
        let samples = LinearResampler::new(buffer.sample_rate(), self.sample_rate).process(&mono);

        let stopped = Arc::new(AtomicBool::new(false));
        self.mixer.lock().voices.push(Voice {
            start_frame: (start_at * f64::from(self.sample_rate)).round() as u64,
            samples,
            position: 0,
            stopped: stopped.clone(),
            on_ended: Some(on_ended),
        });
        Ok(Box::new(CpalSource { stopped }))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(RealtimeError::device("Output context already closed"));
        }
        if let Some(stop) = self.stop.lock().take() {
            let _ = stop.send(());
        }
        self.mixer.lock().voices.clear();
        Ok(())
    }
}

struct CpalSource {
    stopped: Arc<AtomicBool>,
}

impl SourceHandle for CpalSource {
    fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}
