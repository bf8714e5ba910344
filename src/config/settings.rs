//! Application settings.
//!
//! Settings are read from a TOML file (path from `PLANT_BUDDY_CONFIG`, then
//! `plant-buddy.toml`, then `config/plant-buddy.toml`) and fall back to built-in
//! defaults when no file exists. A handful of environment variables override the
//! file so secrets never have to live in it.

use crate::entities::{TaskPriority, TaskType};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP listener
    pub server: ServerSettings,
    /// Database location
    pub database: DatabaseSettings,
    /// Uploaded image storage
    pub storage: StorageSettings,
    /// Generative AI backend
    pub gateway: GatewaySettings,
    /// Task generation policy for newly identified plants
    pub care_schedule: CareSchedule,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Database settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `SeaORM` connection URL
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: crate::config::database::DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

/// Object storage settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory uploaded images are written to
    pub root: PathBuf,
    /// URL prefix under which `root` is publicly served
    pub public_base_url: String,
    /// Largest accepted image, in bytes
    pub max_image_bytes: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/uploads"),
            public_base_url: "http://localhost:8080/uploads".to_string(),
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Generative AI backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// REST endpoint root
    pub base_url: String,
    /// API key; normally supplied through `GOOGLE_API_KEY`
    pub api_key: Option<String>,
    /// Model used for classification, diagnosis and chat
    pub model: String,
    /// Model used for embeddings
    pub embedding_model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature for image analysis
    pub analysis_temperature: f32,
    /// Sampling temperature for chat and suggestions
    pub chat_temperature: f32,
    /// Output token cap for image analysis
    pub analysis_max_tokens: u32,
    /// Output token cap for chat replies
    pub chat_max_tokens: u32,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            embedding_model: "gemini-embedding-001".to_string(),
            timeout_secs: 30,
            analysis_temperature: 0.1,
            chat_temperature: 0.7,
            analysis_max_tokens: 1024,
            chat_max_tokens: 1000,
        }
    }
}

/// Longest task generation horizon accepted, in days.
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Task generation policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CareSchedule {
    /// Number of days ahead tasks are generated for
    pub horizon_days: u32,
    /// Recurring cadences, one per task type
    pub cadences: Vec<Cadence>,
}

impl Default for CareSchedule {
    fn default() -> Self {
        Self {
            horizon_days: 28,
            cadences: vec![
                Cadence {
                    task_type: TaskType::Watering,
                    interval_days: 7,
                    first_offset_days: 0,
                    priority: TaskPriority::Normal,
                },
                Cadence {
                    task_type: TaskType::HealthCheck,
                    interval_days: 14,
                    first_offset_days: 7,
                    priority: TaskPriority::Normal,
                },
                Cadence {
                    task_type: TaskType::Fertilizing,
                    interval_days: 28,
                    first_offset_days: 14,
                    priority: TaskPriority::Low,
                },
            ],
        }
    }
}

/// One recurring care action
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Cadence {
    /// Kind of task generated
    pub task_type: TaskType,
    /// Days between occurrences
    pub interval_days: u32,
    /// Days from today until the first occurrence
    #[serde(default)]
    pub first_offset_days: u32,
    /// Priority of generated tasks
    #[serde(default)]
    pub priority: TaskPriority,
}

impl CareSchedule {
    /// Rejects zero intervals and horizons beyond [`MAX_HORIZON_DAYS`].
    pub fn validate(&self) -> Result<()> {
        if self.horizon_days > MAX_HORIZON_DAYS {
            return Err(Error::Config {
                message: format!(
                    "care horizon of {} days exceeds the maximum of {MAX_HORIZON_DAYS}",
                    self.horizon_days
                ),
            });
        }
        if let Some(cadence) = self.cadences.iter().find(|c| c.interval_days == 0) {
            return Err(Error::Config {
                message: format!("{:?} cadence has an interval of zero days", cadence.task_type),
            });
        }
        Ok(())
    }
}

impl Settings {
    /// Loads settings from the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match Self::locate() {
            Some(path) => Self::load_from_path(&path)?,
            None => {
                warn!("No config file found, using defaults");
                Self::default()
            }
        };
        settings.apply_env_overrides();
        settings.care_schedule.validate()?;
        Ok(settings)
    }

    fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PLANT_BUDDY_CONFIG") {
            return Some(PathBuf::from(path));
        }

        ["plant-buddy.toml", "config/plant-buddy.toml"]
            .into_iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Parses a TOML settings file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        debug!("Loading configuration from {:?}", path_ref);
        let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
            message: format!("Failed to read config file {path_ref:?}: {e}"),
        })?;
        Self::from_toml(&contents)
    }

    /// Parses settings from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse configuration: {e}"),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(key) = std::env::var("GOOGLE_API_KEY").or_else(|_| std::env::var("GEMINI_API_KEY"))
        {
            self.gateway.api_key = Some(key);
        }
        if let Ok(host) = std::env::var("PLANT_BUDDY_HOST") {
            self.server.host = host;
        }
        match std::env::var("PLANT_BUDDY_PORT").map(|p| p.parse::<u16>()) {
            Ok(Ok(port)) => self.server.port = port,
            Ok(Err(e)) => warn!("Ignoring invalid PLANT_BUDDY_PORT: {}", e),
            Err(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.storage.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.care_schedule.horizon_days, 28);
        assert_eq!(settings.care_schedule.cadences[0].task_type, TaskType::Watering);
        assert_eq!(settings.care_schedule.cadences[0].first_offset_days, 0);
        assert!(settings.care_schedule.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
            [server]
            port = 9000

            [gateway]
            model = "gemini-2.0-flash"

            [care_schedule]
            horizon_days = 14

            [[care_schedule.cadences]]
            task_type = "watering"
            interval_days = 3

            [[care_schedule.cadences]]
            task_type = "rotate"
            interval_days = 10
            first_offset_days = 2
            priority = "low"
        "#;

        let settings = Settings::from_toml(toml_str).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.gateway.model, "gemini-2.0-flash");
        assert_eq!(settings.gateway.timeout_secs, 30);
        assert_eq!(settings.care_schedule.horizon_days, 14);
        assert_eq!(settings.care_schedule.cadences.len(), 2);
        assert_eq!(settings.care_schedule.cadences[0].priority, TaskPriority::Normal);
        assert_eq!(settings.care_schedule.cadences[1].task_type, TaskType::Rotate);
        assert_eq!(settings.care_schedule.cadences[1].first_offset_days, 2);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let toml_str = r#"
            [[care_schedule.cadences]]
            task_type = "watering"
            interval_days = 0
        "#;

        let settings = Settings::from_toml(toml_str).unwrap();
        assert!(matches!(
            settings.care_schedule.validate(),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_horizon_upper_bound() {
        let settings = Settings::from_toml("[care_schedule]\nhorizon_days = 366\n").unwrap();
        assert!(settings.care_schedule.validate().is_ok());

        let settings =
            Settings::from_toml("[care_schedule]\nhorizon_days = 4294967295\n").unwrap();
        assert!(matches!(
            settings.care_schedule.validate(),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Settings::from_toml("[server\nport = ");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("plant-buddy.toml");
        let settings = Settings::load_from_path(path).unwrap();
        let defaults = Settings::default();

        assert_eq!(settings.server.port, defaults.server.port);
        assert_eq!(settings.database.url, defaults.database.url);
        assert_eq!(settings.storage.max_image_bytes, defaults.storage.max_image_bytes);
        assert_eq!(settings.gateway.model, defaults.gateway.model);
        assert_eq!(settings.care_schedule.horizon_days, 28);
        assert_eq!(settings.care_schedule.cadences, defaults.care_schedule.cadences);
        assert!(settings.gateway.api_key.is_none());
    }
}
