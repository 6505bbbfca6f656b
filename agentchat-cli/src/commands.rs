//! One-shot commands that read or change stored state.

use agentchat_core::{Agent, AgentDraft, User, find_agent, initial_agents, now_millis};
use agentchat_memory::{AuthSession, ChatMemory, Settings, SettingsStore, Storage};
use anyhow::{Result, anyhow, bail};
use std::sync::Arc;

pub async fn login(storage: Arc<dyn Storage>) -> Result<()> {
    let user = AuthSession::new(storage).login().await?;
    println!("Signed in as {} <{}>", user.name, user.email);
    Ok(())
}

pub async fn logout(storage: Arc<dyn Storage>) -> Result<()> {
    AuthSession::new(storage).logout().await?;
    println!("Signed out");
    Ok(())
}

/// The signed-in user, or an error telling the user to sign in.
pub async fn require_user(storage: Arc<dyn Storage>) -> Result<User> {
    AuthSession::new(storage)
        .current_user()
        .await
        .ok_or_else(|| anyhow!("Not signed in. Run `agentchat login` first."))
}

pub fn resolve_agent(settings: &Settings, id: &str) -> Result<Agent> {
    find_agent(&settings.agents(), id)
        .cloned()
        .ok_or_else(|| anyhow!("Unknown agent '{}'. Run `agentchat agents list`.", id))
}

pub async fn list_agents(storage: Arc<dyn Storage>) -> Result<()> {
    let settings = SettingsStore::new(storage).load().await;
    for agent in settings.agents() {
        let kind = if agent.is_builtin() { "built-in" } else { "custom" };
        println!("{:<24} {} ({}) - {}", agent.id, agent.name, kind, agent.description);
    }
    Ok(())
}

pub async fn create_agent(storage: Arc<dyn Storage>, draft: AgentDraft) -> Result<()> {
    let agent = Agent::custom(draft, now_millis())?;
    SettingsStore::new(storage.clone())
        .update(|settings| settings.custom_agents.push(agent.clone()))
        .await?;
    ChatMemory::load(storage, &initial_agents()).await.initialize_agent(&agent.id).await;

    tracing::info!(agent.id = %agent.id, "Created agent");
    println!("Created {} ({})", agent.name, agent.id);
    Ok(())
}

pub async fn show_settings(storage: Arc<dyn Storage>) -> Result<()> {
    let user = AuthSession::new(storage.clone()).current_user().await;
    let settings = SettingsStore::new(storage).load().await;

    match user {
        Some(user) => println!("Signed in as {} <{}>", user.name, user.email),
        None => println!("Not signed in"),
    }
    println!("Friendly mode: {}", if settings.friendly_mode { "on" } else { "off" });
    println!("Integrations:");
    for integration in &settings.integrations {
        let mark = if integration.enabled { "x" } else { " " };
        println!("  [{}] {:<16} {}", mark, integration.id, integration.description);
    }
    Ok(())
}

pub async fn toggle_integration(storage: Arc<dyn Storage>, id: &str) -> Result<()> {
    let store = SettingsStore::new(storage);
    let mut settings = store.load().await;
    let Some(enabled) = settings.toggle_integration(id) else {
        bail!("Unknown integration '{}'", id);
    };
    store.save(&settings).await?;
    println!("{} is now {}", id, if enabled { "enabled" } else { "disabled" });
    Ok(())
}

pub async fn set_friendly_mode(storage: Arc<dyn Storage>, enabled: bool) -> Result<()> {
    SettingsStore::new(storage).update(|settings| settings.friendly_mode = enabled).await?;
    println!("Friendly mode {}", if enabled { "on" } else { "off" });
    Ok(())
}

pub async fn clear_history(storage: Arc<dyn Storage>, agent_id: &str) -> Result<()> {
    let settings = SettingsStore::new(storage.clone()).load().await;
    let agent = resolve_agent(&settings, agent_id)?;
    ChatMemory::load(storage, &initial_agents()).await.clear(&agent.id).await;
    println!("Cleared chat history with {}", agent.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentchat_memory::{InMemoryStorage, MEMORY_STORAGE_KEY};

    fn storage() -> Arc<dyn Storage> {
        Arc::new(InMemoryStorage::new())
    }

    #[tokio::test]
    async fn chat_requires_sign_in() {
        let storage = storage();
        assert!(require_user(storage.clone()).await.is_err());

        login(storage.clone()).await.unwrap();
        assert_eq!(require_user(storage.clone()).await.unwrap().name, "Martin");

        logout(storage.clone()).await.unwrap();
        assert!(require_user(storage).await.is_err());
    }

    #[tokio::test]
    async fn created_agent_is_listed_and_has_a_log() {
        let storage = storage();
        let draft = AgentDraft {
            name: "Travel Guide".into(),
            description: "Plans trips".into(),
            system_instruction: "You plan trips.".into(),
        };

        create_agent(storage.clone(), draft).await.unwrap();

        let settings = SettingsStore::new(storage.clone()).load().await;
        let custom = settings.custom_agents.first().unwrap();
        assert!(custom.id.starts_with("custom-"));
        assert_eq!(resolve_agent(&settings, &custom.id).unwrap().name, "Travel Guide");

        let stored = storage.get(MEMORY_STORAGE_KEY).await.unwrap().unwrap();
        assert!(stored.contains(&custom.id));
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected() {
        let storage = storage();
        let draft = AgentDraft {
            name: "  ".into(),
            description: "Nothing".into(),
            system_instruction: "Nothing".into(),
        };
        assert!(create_agent(storage.clone(), draft).await.is_err());
        assert!(SettingsStore::new(storage).load().await.custom_agents.is_empty());
    }

    #[tokio::test]
    async fn toggling_unknown_integration_fails() {
        let storage = storage();
        assert!(toggle_integration(storage.clone(), "google-drive").await.is_err());

        toggle_integration(storage.clone(), "google-maps").await.unwrap();
        let settings = SettingsStore::new(storage).load().await;
        assert!(!agentchat_core::is_enabled(&settings.integrations, "google-maps"));
    }

    #[test]
    fn unknown_agent_is_an_error() {
        let error = resolve_agent(&Settings::default(), "nobody").unwrap_err();
        assert!(error.to_string().contains("nobody"));
    }
}
