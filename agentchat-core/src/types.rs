use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Base64 payload tagged with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl ChatMessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), inline_data: None }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData { mime_type: mime_type.into(), data: data.into() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceAnswerSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_snippets: Option<Vec<GroundingSource>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapsSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_answer_sources: Option<Vec<PlaceAnswerSource>>,
}

/// Citation metadata returned with a grounded reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<GroundingSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<MapsSource>,
}

/// One entry in a persona's chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub parts: Vec<ChatMessagePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_thinking: bool,
}

impl ChatMessage {
    pub fn new(id: impl Into<String>, role: Role, parts: Vec<ChatMessagePart>) -> Self {
        Self { id: id.into(), role, parts, grounding_chunks: None, is_thinking: false }
    }

    /// Placeholder shown while the model reply is streaming in.
    pub fn thinking(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Model,
            parts: vec![ChatMessagePart::text("")],
            grounding_chunks: None,
            is_thinking: true,
        }
    }

    /// Concatenated text of every text part.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(|p| p.text.as_deref()).collect()
    }

    /// Merge a partial update into this message.
    ///
    /// Parts are only replaced when the update carries them.
    pub fn apply(&mut self, update: MessageUpdate) {
        if let Some(parts) = update.parts {
            self.parts = parts;
        }
        if let Some(chunks) = update.grounding_chunks {
            self.grounding_chunks = Some(chunks);
        }
        if let Some(is_thinking) = update.is_thinking {
            self.is_thinking = is_thinking;
        }
    }
}

/// Partial update applied by [`ChatMessage::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageUpdate {
    pub parts: Option<Vec<ChatMessagePart>>,
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
    pub is_thinking: Option<bool>,
}

impl MessageUpdate {
    pub fn text(text: impl Into<String>) -> Self {
        Self { parts: Some(vec![ChatMessagePart::text(text)]), ..Default::default() }
    }

    pub fn with_grounding_chunks(mut self, chunks: Vec<GroundingChunk>) -> Self {
        self.grounding_chunks = Some(chunks);
        self
    }

    pub fn finished(mut self) -> Self {
        self.is_thinking = Some(false);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
}

/// Flatten grounding chunks into displayable sources, first occurrence of each uri wins.
pub fn grounding_sources(chunks: &[GroundingChunk]) -> Vec<GroundingSource> {
    let mut sources: Vec<GroundingSource> = Vec::new();
    let mut push = |source: &GroundingSource| {
        if !sources.iter().any(|s| s.uri == source.uri) {
            sources.push(source.clone());
        }
    };

    for chunk in chunks {
        if let Some(web) = &chunk.web {
            push(web);
        }
        if let Some(maps) = &chunk.maps {
            if !maps.uri.is_empty() {
                push(&GroundingSource { uri: maps.uri.clone(), title: maps.title.clone() });
            }
            for place in maps.place_answer_sources.iter().flatten() {
                for snippet in place.review_snippets.iter().flatten() {
                    push(snippet);
                }
            }
        }
    }
    sources
}

/// Milliseconds since the Unix epoch, used for message and persona ids.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
