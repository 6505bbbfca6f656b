mod call;
mod cli;
mod commands;
mod config;
mod console;

use agentchat_core::{AgentDraft, initial_agents};
use agentchat_memory::{ChatMemory, JsonFileStorage, SettingsStore, Storage};
use agentchat_model::GeminiTextClient;
use agentchat_runner::{ChatRunner, RunnerConfig};
use anyhow::{Result, anyhow};
use clap::Parser;
use cli::{AgentsCommand, Cli, Commands, SettingsCommand};
use config::{Config, FileConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = match cli.config.clone().or_else(FileConfig::default_path) {
        Some(path) => FileConfig::load(&path)?,
        None => FileConfig::default(),
    };
    let config = Config::resolve(&cli, file);

    agentchat_telemetry::init_with_format("agentchat", config.log_format)
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))?;
    tracing::debug!(data_dir = %config.data_dir.display(), "Using data directory");

    let storage: Arc<dyn Storage> = Arc::new(JsonFileStorage::new(config.data_dir.clone()));

    match cli.command {
        Commands::Login => commands::login(storage).await,
        Commands::Logout => commands::logout(storage).await,
        Commands::Agents { command: AgentsCommand::List } => commands::list_agents(storage).await,
        Commands::Agents { command: AgentsCommand::Create { name, description, instruction } } => {
            let draft = AgentDraft { name, description, system_instruction: instruction };
            commands::create_agent(storage, draft).await
        }
        Commands::Settings { command: SettingsCommand::Show } => {
            commands::show_settings(storage).await
        }
        Commands::Settings { command: SettingsCommand::Toggle { integration } } => {
            commands::toggle_integration(storage, &integration).await
        }
        Commands::Settings { command: SettingsCommand::Friendly { state } } => {
            commands::set_friendly_mode(storage, state.enabled()).await
        }
        Commands::Chat { agent, image } => {
            commands::require_user(storage.clone()).await?;
            let settings = SettingsStore::new(storage.clone()).load().await;
            let agent = commands::resolve_agent(&settings, &agent)?;
            let image = image.as_deref().map(console::load_image).transpose()?;

            let memory = ChatMemory::load(storage, &initial_agents()).await;
            memory.initialize_agent(&agent.id).await;
            let runner = ChatRunner::new(RunnerConfig {
                generator: Arc::new(GeminiTextClient::from_env()?),
                memory: Arc::new(memory),
                integrations: settings.integrations,
                friendly_mode: settings.friendly_mode,
                location: config.location,
            });
            console::run_chat(&runner, &agent, image).await
        }
        Commands::Call { agent, voice, model } => {
            commands::require_user(storage.clone()).await?;
            let settings = SettingsStore::new(storage).load().await;
            let instruction = match agent {
                Some(id) => Some(
                    commands::resolve_agent(&settings, &id)?
                        .effective_instruction(settings.friendly_mode),
                ),
                None => None,
            };
            call::run_call(call::CallOptions {
                instruction,
                voice: voice.or(config.voice),
                model: model.or(config.live_model),
            })
            .await
        }
        Commands::Clear { agent } => commands::clear_history(storage, &agent).await,
    }
}
