//! Streaming response types.

use crate::request::Content;
use agentchat_core::GroundingChunk;
use serde::{Deserialize, Serialize};

/// One server-sent event of a streamed generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

impl GenerationResponse {
    /// Reply text of the first candidate, without reasoning parts.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let mut texts = content
            .parts
            .iter()
            .filter(|part| part.thought != Some(true))
            .filter_map(|part| part.text.as_deref())
            .peekable();
        texts.peek()?;
        Some(texts.collect())
    }

    pub fn grounding_chunks(&self) -> Option<Vec<GroundingChunk>> {
        self.candidates.first()?.grounding_metadata.as_ref()?.grounding_chunks.clone()
    }
}

/// What a caller needs from each streamed event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseFragment {
    pub text: Option<String>,
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

impl ResponseFragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), grounding_chunks: None }
    }

    pub fn with_grounding_chunks(mut self, chunks: Vec<GroundingChunk>) -> Self {
        self.grounding_chunks = Some(chunks);
        self
    }
}

impl From<GenerationResponse> for ResponseFragment {
    fn from(response: GenerationResponse) -> Self {
        Self { text: response.text(), grounding_chunks: response.grounding_chunks() }
    }
}
