//! Configuration types for realtime calls.

use crate::audio::{INPUT_SAMPLE_RATE, SampleOverflow};
use serde::{Deserialize, Serialize};

/// Default native-audio model for live calls.
pub const DEFAULT_LIVE_MODEL: &str = "models/gemini-2.5-flash-native-audio-preview-09-2025";
/// Default prebuilt voice.
pub const DEFAULT_VOICE: &str = "Zephyr";
/// Persona used for voice calls.
pub const DEFAULT_LIVE_INSTRUCTION: &str =
    "You are Chloe, a helpful AI assistant. Keep your answers concise and conversational.";
/// Samples per captured block.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Voice and response profile sent when a live session opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Model override. The transport's own model is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Prebuilt voice for audio output.
    pub voice: String,

    /// Response modalities, e.g. `["AUDIO"]`.
    pub response_modalities: Vec<String>,

    /// System instruction for the persona.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,

    /// Transcribe the user's speech.
    pub input_transcription: bool,

    /// Transcribe the model's speech.
    pub output_transcription: bool,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            model: None,
            voice: DEFAULT_VOICE.to_string(),
            response_modalities: vec!["AUDIO".to_string()],
            instruction: Some(DEFAULT_LIVE_INSTRUCTION.to_string()),
            input_transcription: true,
            output_transcription: true,
        }
    }
}

impl LiveConfig {
    /// Create a config builder.
    pub fn builder() -> LiveConfigBuilder {
        LiveConfigBuilder::new()
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the voice.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Set the system instruction.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Enable or disable both transcription directions.
    pub fn with_transcription(mut self, enabled: bool) -> Self {
        self.input_transcription = enabled;
        self.output_transcription = enabled;
        self
    }
}

/// Builder for [`LiveConfig`].
#[derive(Debug, Clone, Default)]
pub struct LiveConfigBuilder {
    config: LiveConfig,
}

impl LiveConfigBuilder {
    /// Create a new builder starting from the default profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    /// Set the voice.
    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.config.voice = voice.into();
        self
    }

    /// Set the system instruction.
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.config.instruction = Some(instruction.into());
        self
    }

    /// Set the response modalities.
    pub fn response_modalities(mut self, modalities: Vec<String>) -> Self {
        self.config.response_modalities = modalities;
        self
    }

    /// Toggle user speech transcription.
    pub fn input_transcription(mut self, enabled: bool) -> Self {
        self.config.input_transcription = enabled;
        self
    }

    /// Toggle model speech transcription.
    pub fn output_transcription(mut self, enabled: bool) -> Self {
        self.config.output_transcription = enabled;
        self
    }

    /// Build the config.
    pub fn build(self) -> LiveConfig {
        self.config
    }
}

/// Microphone framing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Rate of the frames sent to the model.
    pub sample_rate: u32,
    /// Samples per block handed to the transport.
    pub block_size: usize,
    /// Mapping for samples at or beyond full scale.
    pub overflow: SampleOverflow,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: INPUT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            overflow: SampleOverflow::default(),
        }
    }
}

impl CaptureConfig {
    /// Set the overflow policy.
    pub fn with_overflow(mut self, overflow: SampleOverflow) -> Self {
        self.overflow = overflow;
        self
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }
}
