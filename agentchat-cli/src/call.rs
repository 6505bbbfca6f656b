use agentchat_model::api_key_from_env;
use agentchat_realtime::cpal_backend::CpalDevices;
use agentchat_realtime::error::START_FAILED_MESSAGE;
use agentchat_realtime::gemini::GeminiLiveModel;
use agentchat_realtime::{LiveConfig, LiveConversation};
use anyhow::{Result, anyhow};
use std::io::Write;
use std::sync::Arc;

pub struct CallOptions {
    /// Replaces the default voice persona when set.
    pub instruction: Option<String>,
    pub voice: Option<String>,
    pub model: Option<String>,
}

/// Run a voice call until Ctrl-C or until the call drops.
pub async fn run_call(options: CallOptions) -> Result<()> {
    // An absent key is reported by the call itself, before any device is opened.
    let mut model = GeminiLiveModel::new(api_key_from_env().unwrap_or_default());
    if let Some(id) = options.model {
        model = model.with_model(id);
    }

    let mut config = LiveConfig::default();
    if let Some(voice) = options.voice {
        config = config.with_voice(voice);
    }
    if let Some(instruction) = options.instruction {
        config = config.with_instruction(instruction);
    }

    let call = LiveConversation::builder(Arc::new(model), Arc::new(CpalDevices::new()))
        .config(config)
        .on_input_transcript(|text| {
            print!("\r\x1b[2KYou: {}", text);
            let _ = std::io::stdout().flush();
        })
        .build();

    if call.start().await.is_err() {
        let message = call.error().unwrap_or_else(|| START_FAILED_MESSAGE.to_string());
        return Err(anyhow!(message));
    }
    println!("Call started. Speak now; press Ctrl-C to hang up.");

    let mut status = call.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = status.changed() => {
                if changed.is_err() || !status.borrow_and_update().live {
                    break;
                }
            }
        }
    }

    call.stop().await;
    println!();
    match call.error() {
        Some(message) => Err(anyhow!(message)),
        None => {
            println!("Call ended.");
            Ok(())
        }
    }
}
