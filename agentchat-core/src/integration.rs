//! Grounding tools that can be switched on per installation.

use serde::{Deserialize, Serialize};

pub const GOOGLE_SEARCH_ID: &str = "google-search";
pub const GOOGLE_MAPS_ID: &str = "google-maps";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

pub fn initial_integrations() -> Vec<Integration> {
    vec![
        Integration {
            id: GOOGLE_SEARCH_ID.to_string(),
            name: "Google Search".to_string(),
            description: "Find up-to-date information from the web.".to_string(),
            enabled: true,
        },
        Integration {
            id: GOOGLE_MAPS_ID.to_string(),
            name: "Google Maps".to_string(),
            description: "Find place information and get recommendations.".to_string(),
            enabled: true,
        },
    ]
}

/// Flip the integration with `id`. Returns the new state, or `None` if unknown.
pub fn toggle(integrations: &mut [Integration], id: &str) -> Option<bool> {
    let integration = integrations.iter_mut().find(|i| i.id == id)?;
    integration.enabled = !integration.enabled;
    Some(integration.enabled)
}

pub fn is_enabled(integrations: &[Integration], id: &str) -> bool {
    integrations.iter().any(|i| i.id == id && i.enabled)
}
