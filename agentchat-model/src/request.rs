//! Request body for `streamGenerateContent`.

use agentchat_core::{
    Agent, CHLOE_AGENT_ID, CODE_HELPER_AGENT_ID, ChatMessage, ChatMessagePart, GOOGLE_MAPS_ID,
    GOOGLE_SEARCH_ID, GeoLocation, InlineData, Integration, Role, is_enabled,
};
use serde::{Deserialize, Serialize};

/// Model for demanding personas.
pub const PRO_MODEL: &str = "gemini-2.5-pro";
/// Model for everything else.
pub const FLASH_MODEL: &str = "gemini-2.5-flash";

/// Pick the text model for a persona.
pub fn model_for_agent(agent_id: &str) -> &'static str {
    if agent_id == CHLOE_AGENT_ID || agent_id == CODE_HELPER_AGENT_ID {
        PRO_MODEL
    } else {
        FLASH_MODEL
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    /// Set on reasoning parts, which are not part of the reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }

    pub fn inline_data(data: InlineData) -> Self {
        Self { inline_data: Some(data), ..Default::default() }
    }
}

impl From<&ChatMessagePart> for Part {
    fn from(part: &ChatMessagePart) -> Self {
        match (part.text.as_deref(), &part.inline_data) {
            (Some(text), _) if !text.is_empty() => Part::text(text),
            (_, Some(data)) => Part::inline_data(data.clone()),
            _ => Part::text(""),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyObject {}

/// Built-in grounding tools. Exactly one field is set per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_search: Option<EmptyObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_maps: Option<EmptyObject>,
}

impl Tool {
    pub fn google_search() -> Self {
        Self { google_search: Some(EmptyObject {}), ..Default::default() }
    }

    pub fn google_maps() -> Self {
        Self { google_maps: Some(EmptyObject {}), ..Default::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

/// Everything needed for one text turn.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub prompt: String,
    pub image: Option<InlineData>,
    /// Conversation so far, oldest first.
    pub history: Vec<ChatMessage>,
    pub agent: Agent,
    pub friendly_mode: bool,
    pub integrations: Vec<Integration>,
    pub location: Option<GeoLocation>,
}

impl GenerationInput {
    pub fn new(agent: Agent, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            history: Vec::new(),
            agent,
            friendly_mode: false,
            integrations: Vec::new(),
            location: None,
        }
    }

    pub fn with_image(mut self, image: InlineData) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_friendly_mode(mut self, friendly_mode: bool) -> Self {
        self.friendly_mode = friendly_mode;
        self
    }

    pub fn with_integrations(mut self, integrations: Vec<Integration>) -> Self {
        self.integrations = integrations;
        self
    }

    pub fn with_location(mut self, location: Option<GeoLocation>) -> Self {
        self.location = location;
        self
    }

    pub fn model(&self) -> &'static str {
        model_for_agent(&self.agent.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

impl From<&GenerationInput> for GenerateContentRequest {
    fn from(input: &GenerationInput) -> Self {
        let mut contents = history_contents(&input.history);
        contents.push(user_turn(&input.prompt, input.image.as_ref()));

        Self {
            contents,
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(input.agent.effective_instruction(input.friendly_mode))],
            }),
            tools: build_tools(&input.integrations),
            tool_config: build_tool_config(&input.integrations, input.location),
        }
    }
}

/// Convert stored messages to request contents, skipping placeholders.
pub fn history_contents(messages: &[ChatMessage]) -> Vec<Content> {
    messages
        .iter()
        .filter(|message| !message.is_thinking)
        .map(|message| Content {
            role: Some(message.role),
            parts: message.parts.iter().map(Part::from).collect(),
        })
        .collect()
}

/// The new user turn: image first, then text.
///
/// A text part is added when the prompt is non-empty or nothing else was added.
pub fn user_turn(prompt: &str, image: Option<&InlineData>) -> Content {
    let mut parts = Vec::new();
    if let Some(image) = image {
        parts.push(Part::inline_data(image.clone()));
    }
    if !prompt.is_empty() || parts.is_empty() {
        parts.push(Part::text(prompt));
    }
    Content { role: Some(Role::User), parts }
}

pub fn build_tools(integrations: &[Integration]) -> Option<Vec<Tool>> {
    let mut tools = Vec::new();
    if is_enabled(integrations, GOOGLE_SEARCH_ID) {
        tools.push(Tool::google_search());
    }
    if is_enabled(integrations, GOOGLE_MAPS_ID) {
        tools.push(Tool::google_maps());
    }
    (!tools.is_empty()).then_some(tools)
}

/// Location hint for maps grounding, only when maps is enabled.
pub fn build_tool_config(
    integrations: &[Integration],
    location: Option<GeoLocation>,
) -> Option<ToolConfig> {
    let location = location?;
    if !is_enabled(integrations, GOOGLE_MAPS_ID) {
        return None;
    }
    Some(ToolConfig {
        retrieval_config: RetrievalConfig {
            lat_lng: LatLng { latitude: location.latitude, longitude: location.longitude },
        },
    })
}
