//! Subscriber installation.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, Once};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();
static INIT_ERROR: Mutex<Option<String>> = Mutex::new(None);

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Initialize console logging on stderr.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Only the first call
/// installs a subscriber; later calls return the outcome of the first.
///
/// # Example
/// ```
/// use agentchat_telemetry::init_telemetry;
/// init_telemetry("agentchat").expect("Failed to initialize telemetry");
/// ```
pub fn init_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    init_with_format(service_name, LogFormat::Pretty)
}

/// Initialize logging with an explicit line format.
pub fn init_with_format(
    service_name: &str,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        let installed = match format {
            LogFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_line_number(true)
                        .with_writer(std::io::stderr),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_thread_ids(true)
                        .with_writer(std::io::stderr),
                )
                .try_init(),
        };

        match installed {
            Ok(()) => tracing::info!(service.name = service_name, ?format, "Telemetry initialized"),
            Err(e) => {
                if let Ok(mut slot) = INIT_ERROR.lock() {
                    *slot = Some(e.to_string());
                }
            }
        }
    });

    match INIT_ERROR.lock().ok().and_then(|slot| slot.clone()) {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}
