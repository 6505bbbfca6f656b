use crate::cli::Cli;
use agentchat_core::GeoLocation;
use agentchat_telemetry::LogFormat;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub voice: Option<String>,
    pub live_model: Option<String>,
    pub log_format: Option<LogFormat>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl FileConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("agentchat").join("config.toml"))
    }

    /// Parse `path`. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }
}

/// Effective settings: flags over file values over defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub voice: Option<String>,
    pub live_model: Option<String>,
    pub log_format: LogFormat,
    pub location: Option<GeoLocation>,
}

impl Config {
    pub fn resolve(cli: &Cli, file: FileConfig) -> Self {
        let data_dir = cli.data_dir.clone().or(file.data_dir).unwrap_or_else(default_data_dir);
        let latitude = cli.latitude.or(file.latitude);
        let longitude = cli.longitude.or(file.longitude);
        let location = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoLocation { latitude, longitude }),
            _ => None,
        };

        Self {
            data_dir,
            voice: file.voice,
            live_model: file.live_model,
            log_format: cli.log_format.or(file.log_format).unwrap_or_default(),
            location,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir().unwrap_or_default().join("agentchat")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn parses_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/tmp/agentchat"
voice = "Puck"
live_model = "models/custom-live"
log_format = "json"
latitude = 51.5
longitude = -0.12
"#,
        )
        .unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/agentchat")));
        assert_eq!(config.voice.as_deref(), Some("Puck"));
        assert_eq!(config.live_model.as_deref(), Some("models/custom-live"));
        assert_eq!(config.log_format, Some(LogFormat::Json));
        assert_eq!(config.longitude, Some(-0.12));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "voice = [").unwrap();
        assert!(FileConfig::load(&path).is_err());
    }

    #[test]
    fn flags_override_file_values() {
        let cli =
            Cli::parse_from(["agentchat", "--data-dir", "/flag", "--latitude", "10", "login"]);
        let file = FileConfig {
            data_dir: Some("/file".into()),
            log_format: Some(LogFormat::Json),
            latitude: Some(1.0),
            longitude: Some(2.0),
            ..Default::default()
        };

        let config = Config::resolve(&cli, file);

        assert_eq!(config.data_dir, PathBuf::from("/flag"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.location, Some(GeoLocation { latitude: 10.0, longitude: 2.0 }));
    }

    #[test]
    fn location_needs_both_coordinates() {
        let cli = Cli::parse_from(["agentchat", "--latitude", "10", "logout"]);
        let config = Config::resolve(&cli, FileConfig::default());
        assert_eq!(config.location, None);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }
}
