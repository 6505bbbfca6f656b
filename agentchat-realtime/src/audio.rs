//! Wire codec for call audio.
//!
//! Audio crosses the wire as base64 text wrapping little-endian signed 16-bit
//! PCM. Floating-point samples use the range [-1, 1] with a fixed scale of
//! 32768. No resampling happens here; callers pass the negotiated rate.

use crate::error::{RealtimeError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Microphone audio is sent at 16 kHz.
pub const INPUT_SAMPLE_RATE: u32 = 16_000;
/// Model audio arrives at 24 kHz.
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;
/// MIME tag attached to every outbound media frame.
pub const INPUT_MIME_TYPE: &str = "audio/pcm;rate=16000";
/// MIME tag the remote model puts on audio payloads.
pub const OUTPUT_MIME_TYPE: &str = "audio/pcm;rate=24000";

const PCM_SCALE: f32 = 32768.0;

/// How float samples outside [-1, 1) are mapped to 16-bit PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SampleOverflow {
    /// Truncate toward zero and wrap modulo 2^16, so `1.0` becomes `-32768`.
    #[default]
    Wrap,
    /// Saturate to `[-32768, 32767]`.
    Clamp,
}

impl SampleOverflow {
    /// Convert one sample in [-1, 1] to a 16-bit integer.
    pub fn convert(self, sample: f32) -> i16 {
        let scaled = sample * PCM_SCALE;
        match self {
            Self::Wrap => scaled as i32 as i16,
            Self::Clamp => scaled.clamp(-PCM_SCALE, PCM_SCALE - 1.0) as i16,
        }
    }
}

/// Encode raw bytes as standard base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 into raw bytes.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded).map_err(|e| RealtimeError::audio(format!("Invalid base64: {}", e)))
}

/// Convert float samples to little-endian 16-bit PCM bytes.
pub fn float_to_pcm16(samples: &[f32], overflow: SampleOverflow) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        data.extend_from_slice(&overflow.convert(*sample).to_le_bytes());
    }
    data
}

/// Convert little-endian 16-bit PCM bytes to float samples.
///
/// Returns an error if the data length is odd.
pub fn pcm16_to_float(data: &[u8]) -> Result<Vec<f32>> {
    if data.len() % 2 != 0 {
        return Err(RealtimeError::audio(format!(
            "Invalid data length for PCM16: {} (must be even)",
            data.len()
        )));
    }
    Ok(data
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / PCM_SCALE)
        .collect())
}

/// A playable buffer of de-interleaved float samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Build a buffer from per-channel sample vectors of equal length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(RealtimeError::audio("Sample rate must be positive"));
        }
        let Some(first) = channels.first() else {
            return Err(RealtimeError::audio("Audio buffer needs at least one channel"));
        };
        if channels.iter().any(|c| c.len() != first.len()) {
            return Err(RealtimeError::audio("Channel lengths differ"));
        }
        Ok(Self { sample_rate, channels })
    }

    /// Single-channel buffer.
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, vec![samples])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Playback length in seconds.
    pub fn duration(&self) -> f64 {
        self.frame_count() as f64 / f64::from(self.sample_rate)
    }

    /// Re-interleave and encode as 16-bit PCM.
    pub fn to_pcm16(&self, overflow: SampleOverflow) -> Vec<u8> {
        let mut interleaved = Vec::with_capacity(self.frame_count() * self.channel_count());
        for frame in 0..self.frame_count() {
            for channel in &self.channels {
                interleaved.push(channel[frame]);
            }
        }
        float_to_pcm16(&interleaved, overflow)
    }
}

/// Decode interleaved 16-bit PCM into a playable buffer.
pub fn decode_pcm16(data: &[u8], sample_rate: u32, channels: usize) -> Result<AudioBuffer> {
    if channels == 0 {
        return Err(RealtimeError::audio("Channel count must be positive"));
    }
    let samples = pcm16_to_float(data)?;
    if samples.len() % channels != 0 {
        return Err(RealtimeError::audio(format!(
            "{} samples do not divide into {} channels",
            samples.len(),
            channels
        )));
    }

    let frame_count = samples.len() / channels;
    let mut planes = vec![Vec::with_capacity(frame_count); channels];
    for frame in samples.chunks_exact(channels) {
        for (plane, sample) in planes.iter_mut().zip(frame) {
            plane.push(*sample);
        }
    }
    AudioBuffer::new(sample_rate, planes)
}
