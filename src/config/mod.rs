//! # Configuration
//!
//! Settings for the practice bot, read from a TOML file. Every section and
//! field has a default, so an empty file is a valid configuration.
//!
//! ## Sections
//!
//! - [`BotConfig`] - QSO type, difficulty, speed, operator callsign, station, RNG seed
//! - [`PacingConfig`] - simulated think time and scheduler tick
//! - [`LoggingConfig`] - log level and optional log file
//! - `stations` - optional replacement for the built-in station catalog
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cwqso::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("cwqso.toml").await?;
//!     config.validate()?;
//!     println!("QSO type: {}", config.bot.qso_type);
//!     Ok(())
//! }
//! ```
//!
//! ## File Format
//!
//! ```toml
//! [bot]
//! qso_type = "casual"
//! difficulty = "beginner"
//! speed = "normal"
//! peer_callsign = "F4ABC"
//!
//! [pacing]
//! min_think_ms = 2000
//! max_think_ms = 5000
//! scheduler_tick_ms = 50
//!
//! [logging]
//! level = "info"
//! file = "cwqso.log"
//! ```
//!
//! CLI flags override values from the file.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs;

use crate::qso::dispatch::DispatchConfig;
use crate::qso::engine::{Difficulty, SessionOptions, Speed, ThinkTime};
use crate::qso::flow::QsoType;
use crate::qso::lexicon::Lexicon;
use crate::qso::profiles::Profile;
use crate::validation::{normalize_callsign, normalize_optional_callsign, validate_think_time};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Custom station catalog. Empty means the built-in stations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stations: Vec<Profile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BotConfig {
    #[serde(default)]
    pub qso_type: QsoType,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub speed: Speed,
    /// The operator's own callsign. When set, the bot always addresses this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_callsign: Option<String>,
    /// Operate as this station from the catalog instead of a random one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Fixed RNG seed for reproducible sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_min_think_ms")]
    pub min_think_ms: u64,
    #[serde(default = "default_max_think_ms")]
    pub max_think_ms: u64,
    #[serde(default = "default_scheduler_tick_ms")]
    pub scheduler_tick_ms: u64,
    /// Interval (ms) for periodic scheduler stats logging (0 disables)
    #[serde(default)]
    pub stats_interval_ms: u64,
}

fn default_min_think_ms() -> u64 {
    2000
}

fn default_max_think_ms() -> u64 {
    5000
}

fn default_scheduler_tick_ms() -> u64 {
    50
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_think_ms: default_min_think_ms(),
            max_think_ms: default_max_think_ms(),
            scheduler_tick_ms: default_scheduler_tick_ms(),
            stats_interval_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Write this configuration as TOML
    pub async fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        Config::default().save(path).await
    }

    /// Check callsigns, the think-time window and the station catalog.
    pub fn validate(&self) -> Result<()> {
        normalize_optional_callsign(self.bot.peer_callsign.as_deref())
            .map_err(|e| anyhow!("Invalid bot.peer_callsign: {}", e))?;
        validate_think_time(self.pacing.min_think_ms, self.pacing.max_think_ms)
            .map_err(|e| anyhow!("Invalid pacing: {}", e))?;
        for station in &self.stations {
            normalize_callsign(&station.callsign)
                .map_err(|e| anyhow!("Invalid station {}: {}", station.callsign, e))?;
        }
        if let Some(call) = &self.bot.profile {
            let lexicon = self.lexicon();
            if crate::qso::profiles::find_profile(lexicon.profiles(), call).is_none() {
                return Err(anyhow!("Unknown station in bot.profile: {}", call));
            }
        }
        Ok(())
    }

    /// Engine options from `[bot]` and `[pacing]`. Call [`Config::validate`] first;
    /// an unusable peer callsign is dropped here.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            qso_type: self.bot.qso_type,
            difficulty: self.bot.difficulty,
            speed: self.bot.speed,
            peer_callsign: normalize_optional_callsign(self.bot.peer_callsign.as_deref())
                .ok()
                .flatten(),
            station: self
                .bot
                .profile
                .as_deref()
                .map(|c| c.trim().to_ascii_uppercase()),
            think_time: ThinkTime {
                min_ms: self.pacing.min_think_ms,
                max_ms: self.pacing.max_think_ms,
            },
        }
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            tick_ms: self.pacing.scheduler_tick_ms,
            stats_interval_ms: self.pacing.stats_interval_ms,
        }
    }

    /// Vocabulary with the configured station catalog.
    pub fn lexicon(&self) -> Arc<Lexicon> {
        if self.stations.is_empty() {
            Lexicon::shared()
        } else {
            let stations = self
                .stations
                .iter()
                .cloned()
                .map(|mut p| {
                    p.callsign = p.callsign.trim().to_ascii_uppercase();
                    p
                })
                .collect();
            Arc::new(Lexicon::with_profiles(stations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.bot.qso_type, QsoType::Casual);
        assert_eq!(config.pacing.min_think_ms, 2000);
        assert_eq!(config.pacing.max_think_ms, 5000);
        assert_eq!(config.logging.level, "info");
        assert!(config.stations.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [bot]
            qso_type = "contest"
            peer_callsign = "f4abc"
            seed = 7

            [pacing]
            max_think_ms = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.bot.qso_type, QsoType::Contest);
        assert_eq!(config.bot.seed, Some(7));
        assert_eq!(config.pacing.min_think_ms, 2000);
        let options = config.session_options();
        assert_eq!(options.peer_callsign.as_deref(), Some("F4ABC"));
        assert_eq!(options.think_time.max_ms, 9000);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.pacing.min_think_ms = 6000;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("pacing"), "{}", err);

        let mut config = Config::default();
        config.bot.peer_callsign = Some("NOT A CALL".into());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.bot.profile = Some("ZZ9ZZ".into());
        assert!(config.validate().is_err());
        config.bot.profile = Some("dl2cw".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let res: Result<Config, _> = toml::from_str("[bot]\nqso_type = \"sprint\"\n");
        assert!(res.is_err());
    }

    #[test]
    fn test_custom_station_catalog() {
        let config: Config = toml::from_str(
            r#"
            [[stations]]
            callsign = "ok1aa"
            name = "JAN"
            qth = "PRAHA"
            country = "CZECH REPUBLIC"
            style = "formal"
            [stations.equipment]
            rig = "IC-705"
            power = 10
            antenna = "EFHW"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        let lexicon = config.lexicon();
        assert_eq!(lexicon.profiles().len(), 1);
        assert_eq!(lexicon.profiles()[0].callsign, "OK1AA");
    }

    #[test]
    fn test_level_filter() {
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
        logging.level = "debug".into();
        assert_eq!(logging.level_filter(), log::LevelFilter::Debug);
        logging.level = "chatty".into();
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
    }
}
