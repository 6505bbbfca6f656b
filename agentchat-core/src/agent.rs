//! Personas the user can chat with.

use crate::error::{AgentChatError, Result};
use serde::{Deserialize, Serialize};

pub const CHLOE_AGENT_ID: &str = "chloe-assistant";
pub const CODE_HELPER_AGENT_ID: &str = "code-helper";
pub const CREATIVE_WRITER_AGENT_ID: &str = "creative-writer";

/// Appended to Chloe's instruction while friendly mode is on.
pub const FRIENDLY_MODE_SUFFIX: &str =
    "\n- IMPORTANT: Be friendly, conversational, and add a bit of personality to your responses.";

const CHLOE_INSTRUCTION: &str = "You are Chloe, a female AI research and problem-solving agent. Your primary objective is to solve user problems by performing deep research using the internet.
- Analyze the user's problem carefully.
- Formulate a research plan.
- Use your web search tools to gather accurate, up-to-date, and relevant information.
- Synthesize the research into a coherent, actionable solution or report.
- Present the solution clearly and professionally. Ensure your answers are accurate and the solutions you provide are favorable and effective.";

const CODE_HELPER_INSTRUCTION: &str = "You are a professional software developer. Provide clear, efficient, and well-documented code. When asked for code, provide it directly in a markdown block with the correct language identifier.";

const CREATIVE_WRITER_INSTRUCTION: &str = "You are an acclaimed creative writer. Your responses should be imaginative, eloquent, and emotionally resonant. Adapt your writing style to the user's request, whether it be for a poem, short story, or script.";

/// A named configuration selecting how the model responds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_instruction: String,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            system_instruction: system_instruction.into(),
        }
    }

    /// Build a user-defined persona from a validated draft.
    ///
    /// The id is derived from the creation time: `custom-<millis>`.
    pub fn custom(draft: AgentDraft, created_at_millis: i64) -> Result<Self> {
        draft.validate()?;
        Ok(Self {
            id: format!("custom-{created_at_millis}"),
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
            system_instruction: draft.system_instruction.trim().to_string(),
        })
    }

    /// Instruction sent to the model, with the friendly-mode suffix applied.
    ///
    /// Only Chloe honours friendly mode.
    pub fn effective_instruction(&self, friendly_mode: bool) -> String {
        if friendly_mode && self.id == CHLOE_AGENT_ID {
            format!("{}{}", self.system_instruction, FRIENDLY_MODE_SUFFIX)
        } else {
            self.system_instruction.clone()
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(
            self.id.as_str(),
            CHLOE_AGENT_ID | CODE_HELPER_AGENT_ID | CREATIVE_WRITER_AGENT_ID
        )
    }
}

/// Form input for a new persona.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    pub name: String,
    pub description: String,
    pub system_instruction: String,
}

impl AgentDraft {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty()
            || self.description.trim().is_empty()
            || self.system_instruction.trim().is_empty()
        {
            return Err(AgentChatError::Agent("Please fill out all fields.".to_string()));
        }
        Ok(())
    }
}

/// The personas every installation starts with.
pub fn initial_agents() -> Vec<Agent> {
    vec![
        Agent::new(
            CHLOE_AGENT_ID,
            "Chloe",
            "Advanced research and problem-solving agent.",
            CHLOE_INSTRUCTION,
        ),
        Agent::new(
            CODE_HELPER_AGENT_ID,
            "Code Helper",
            "A coding assistant for developers.",
            CODE_HELPER_INSTRUCTION,
        ),
        Agent::new(
            CREATIVE_WRITER_AGENT_ID,
            "Creative Writer",
            "Helps with writing stories, poems, and scripts.",
            CREATIVE_WRITER_INSTRUCTION,
        ),
    ]
}

pub fn find_agent<'a>(agents: &'a [Agent], id: &str) -> Option<&'a Agent> {
    agents.iter().find(|agent| agent.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, description: &str, instruction: &str) -> AgentDraft {
        AgentDraft {
            name: name.to_string(),
            description: description.to_string(),
            system_instruction: instruction.to_string(),
        }
    }

    #[test]
    fn initial_agents_have_unique_ids() {
        let agents = initial_agents();
        assert_eq!(agents.len(), 3);
        assert_eq!(agents[0].id, CHLOE_AGENT_ID);
        assert!(agents.iter().all(Agent::is_builtin));
    }

    #[test]
    fn custom_agent_gets_timestamp_id() {
        let agent = Agent::custom(draft(" Poet ", "Writes haiku", "Only haiku."), 1700).unwrap();
        assert_eq!(agent.id, "custom-1700");
        assert_eq!(agent.name, "Poet");
        assert!(!agent.is_builtin());
    }

    #[test]
    fn blank_field_is_rejected() {
        let err = Agent::custom(draft("Poet", "   ", "Only haiku."), 1).unwrap_err();
        assert_eq!(err.to_string(), "Agent error: Please fill out all fields.");
    }

    #[test]
    fn friendly_mode_only_changes_chloe() {
        let agents = initial_agents();
        let chloe = find_agent(&agents, CHLOE_AGENT_ID).unwrap();
        let coder = find_agent(&agents, CODE_HELPER_AGENT_ID).unwrap();

        assert!(chloe.effective_instruction(true).ends_with(FRIENDLY_MODE_SUFFIX));
        assert_eq!(chloe.effective_instruction(false), chloe.system_instruction);
        assert_eq!(coder.effective_instruction(true), coder.system_instruction);
    }
}
