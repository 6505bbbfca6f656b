use agentchat_core::CHLOE_AGENT_ID;
use agentchat_telemetry::LogFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agentchat")]
#[command(about = "Chat and talk with Gemini personas", long_about = None)]
pub struct Cli {
    /// Config file [default: <config dir>/agentchat/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding chats, settings and the signed-in user
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log line format (pretty or json)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Latitude used to bias map results
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Longitude used to bias map results
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in
    Login,

    /// Sign out
    Logout,

    /// List or create personas
    Agents {
        #[command(subcommand)]
        command: AgentsCommand,
    },

    /// Show or change preferences
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// Text chat with a persona
    Chat {
        /// Persona id
        #[arg(short, long, default_value = CHLOE_AGENT_ID)]
        agent: String,

        /// Image attached to the first message
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Voice call with the live model
    Call {
        /// Persona whose instruction the call uses
        #[arg(short, long)]
        agent: Option<String>,

        /// Prebuilt voice name
        #[arg(long)]
        voice: Option<String>,

        /// Live model id
        #[arg(long)]
        model: Option<String>,
    },

    /// Delete a persona's chat history
    Clear {
        /// Persona id
        #[arg(short, long)]
        agent: String,
    },
}

#[derive(Subcommand)]
pub enum AgentsCommand {
    /// List built-in and custom personas
    List,

    /// Create a custom persona
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// System instruction
        #[arg(long)]
        instruction: String,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print current settings
    Show,

    /// Switch an integration on or off
    Toggle {
        /// Integration id, e.g. google-search
        integration: String,
    },

    /// Set friendly mode
    Friendly {
        #[arg(value_enum)]
        state: Switch,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        self == Switch::On
    }
}
