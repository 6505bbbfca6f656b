//! Messages exchanged with the remote model during a call.

use crate::audio::{INPUT_MIME_TYPE, OUTPUT_MIME_TYPE};
use serde::{Deserialize, Serialize};

/// One block of microphone audio on its way to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFrame {
    /// Base64 of little-endian PCM16.
    pub data: String,
    pub mime_type: String,
}

impl MediaFrame {
    /// A 16 kHz PCM frame.
    pub fn pcm16_input(data: impl Into<String>) -> Self {
        Self { data: data.into(), mime_type: INPUT_MIME_TYPE.to_string() }
    }
}

/// Audio fragment spoken by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    /// Base64 of little-endian PCM16.
    pub data: String,
    pub mime_type: String,
}

impl AudioPayload {
    pub fn pcm16_output(data: impl Into<String>) -> Self {
        Self { data: data.into(), mime_type: OUTPUT_MIME_TYPE.to_string() }
    }
}

/// Everything a single server message may carry.
///
/// Any combination of fields can be present at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerContent {
    /// Recognized user speech.
    pub input_transcription: Option<String>,
    /// Recognized model speech.
    pub output_transcription: Option<String>,
    pub turn_complete: bool,
    pub audio: Option<AudioPayload>,
    /// The model cut its own utterance short.
    pub interrupted: bool,
}

impl ServerContent {
    pub fn with_input_transcription(mut self, text: impl Into<String>) -> Self {
        self.input_transcription = Some(text.into());
        self
    }

    pub fn with_output_transcription(mut self, text: impl Into<String>) -> Self {
        self.output_transcription = Some(text.into());
        self
    }

    pub fn with_turn_complete(mut self) -> Self {
        self.turn_complete = true;
        self
    }

    pub fn with_audio(mut self, data: impl Into<String>) -> Self {
        self.audio = Some(AudioPayload::pcm16_output(data));
        self
    }

    pub fn with_interrupted(mut self) -> Self {
        self.interrupted = true;
        self
    }
}

/// Events produced by a [`RealtimeSession`](crate::RealtimeSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// The session accepted its setup and is ready for media.
    SetupComplete,
    /// Model output, transcripts or turn signals.
    Content(ServerContent),
    /// A message this client does not act on.
    Unknown,
}

impl From<ServerContent> for ServerEvent {
    fn from(content: ServerContent) -> Self {
        Self::Content(content)
    }
}
