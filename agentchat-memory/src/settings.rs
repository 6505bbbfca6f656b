//! User preferences that outlive a session.

use crate::storage::Storage;
use agentchat_core::{Agent, Integration, Result, initial_agents, initial_integrations, toggle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SETTINGS_STORAGE_KEY: &str = "agentchat-settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub integrations: Vec<Integration>,
    #[serde(default)]
    pub friendly_mode: bool,
    /// Personas created by the user, oldest first.
    #[serde(default)]
    pub custom_agents: Vec<Agent>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            integrations: initial_integrations(),
            friendly_mode: false,
            custom_agents: Vec::new(),
        }
    }
}

impl Settings {
    /// Built-in personas followed by custom ones.
    pub fn agents(&self) -> Vec<Agent> {
        let mut agents = initial_agents();
        agents.extend(self.custom_agents.iter().cloned());
        agents
    }

    /// Flip an integration. Returns the new state, or `None` if `id` is unknown.
    pub fn toggle_integration(&mut self, id: &str) -> Option<bool> {
        toggle(&mut self.integrations, id)
    }
}

pub struct SettingsStore {
    storage: Arc<dyn Storage>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Stored settings, or defaults when none are stored or they are unreadable.
    pub async fn load(&self) -> Settings {
        match self.storage.get(SETTINGS_STORAGE_KEY).await {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring unreadable settings");
                Settings::default()
            }),
            Ok(None) => Settings::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read settings");
                Settings::default()
            }
        }
    }

    pub async fn save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        self.storage.set(SETTINGS_STORAGE_KEY, json).await
    }

    /// Load, modify and save in one step, returning the saved settings.
    pub async fn update(&self, f: impl FnOnce(&mut Settings) + Send) -> Result<Settings> {
        let mut settings = self.load().await;
        f(&mut settings);
        self.save(&settings).await?;
        Ok(settings)
    }
}
