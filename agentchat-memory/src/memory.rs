//! Per-persona message logs.

use crate::storage::Storage;
use agentchat_core::{Agent, ChatMessage, MessageUpdate};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage key of the whole memory map.
pub const MEMORY_STORAGE_KEY: &str = "agent-chat-memory";

type AgentMemory = BTreeMap<String, Vec<ChatMessage>>;

/// Message logs keyed by persona id.
///
/// Every mutation is written back to storage. Persistence failures are
/// logged and never reach the caller; the in-memory state stays authoritative.
pub struct ChatMemory {
    storage: Arc<dyn Storage>,
    memory: Mutex<AgentMemory>,
}

impl ChatMemory {
    /// Load the stored map, or start with an empty log for each of `agents`
    /// when nothing usable is stored.
    pub async fn load(storage: Arc<dyn Storage>, agents: &[Agent]) -> Self {
        let stored = match storage.get(MEMORY_STORAGE_KEY).await {
            Ok(Some(json)) => match serde_json::from_str::<AgentMemory>(&json) {
                Ok(memory) => Some(memory),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to parse stored chat memory");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stored chat memory");
                None
            }
        };

        let memory = stored.unwrap_or_else(|| {
            agents.iter().map(|agent| (agent.id.clone(), Vec::new())).collect()
        });
        Self { storage, memory: Mutex::new(memory) }
    }

    /// Messages of `agent_id`, oldest first. Unknown personas have none.
    pub async fn messages(&self, agent_id: &str) -> Vec<ChatMessage> {
        self.memory.lock().await.get(agent_id).cloned().unwrap_or_default()
    }

    /// Persona ids that have a log.
    pub async fn agent_ids(&self) -> Vec<String> {
        self.memory.lock().await.keys().cloned().collect()
    }

    /// Append `message`. Returns `false` if a message with the same id exists.
    pub async fn add_message(&self, agent_id: &str, message: ChatMessage) -> bool {
        let mut memory = self.memory.lock().await;
        let messages = memory.entry(agent_id.to_string()).or_default();
        if messages.iter().any(|m| m.id == message.id) {
            tracing::debug!(agent.id = agent_id, message.id = %message.id, "Duplicate message ignored");
            return false;
        }
        messages.push(message);
        self.persist(&memory).await;
        true
    }

    /// Merge `update` into the message `message_id`. Returns `false` if it does not exist.
    pub async fn update_message(
        &self,
        agent_id: &str,
        message_id: &str,
        update: MessageUpdate,
    ) -> bool {
        let mut memory = self.memory.lock().await;
        let Some(message) =
            memory.get_mut(agent_id).and_then(|log| log.iter_mut().find(|m| m.id == message_id))
        else {
            return false;
        };
        message.apply(update);
        self.persist(&memory).await;
        true
    }

    /// Empty the log of `agent_id`.
    pub async fn clear(&self, agent_id: &str) {
        let mut memory = self.memory.lock().await;
        memory.insert(agent_id.to_string(), Vec::new());
        self.persist(&memory).await;
    }

    /// Create an empty log for a new persona, keeping any existing one.
    pub async fn initialize_agent(&self, agent_id: &str) {
        let mut memory = self.memory.lock().await;
        if memory.contains_key(agent_id) {
            return;
        }
        memory.insert(agent_id.to_string(), Vec::new());
        self.persist(&memory).await;
    }

    async fn persist(&self, memory: &AgentMemory) {
        let json = match serde_json::to_string(memory) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize chat memory");
                return;
            }
        };
        if let Err(e) = self.storage.set(MEMORY_STORAGE_KEY, json).await {
            tracing::error!(error = %e, "Failed to save chat memory");
        }
    }
}
