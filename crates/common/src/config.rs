use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading an engine configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Engine-wide tunables. Every field has a default, so a config file only
/// needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A leaked world is reported when its sighting count reaches a multiple of this.
    pub leak_warning_interval: u32,
    /// Number of tick durations kept per loaded dimension.
    pub tick_history: usize,
    /// Maximum upward steps taken while searching for a collision-free spawn.
    pub max_collision_rise: u32,
    /// Base file name of the side-channel save file (without extension).
    pub side_channel_name: String,
    /// Name of the top-level compound inside the side-channel file.
    pub ecosystem_name: String,
    /// Brand string sent to actors on join.
    pub server_brand: String,
    pub max_players: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            leak_warning_interval: 5,
            tick_history: 100,
            max_collision_rise: 256,
            side_channel_name: "level_multiverse".into(),
            ecosystem_name: "Multiverse".into(),
            server_brand: "multiverse".into(),
            max_players: 20,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leak_warning_interval == 0 {
            return Err(ConfigError::Invalid {
                field: "leak_warning_interval",
                reason: "must be at least 1".into(),
            });
        }
        if self.tick_history == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_history",
                reason: "must be at least 1".into(),
            });
        }
        if self.side_channel_name.is_empty() {
            return Err(ConfigError::Invalid {
                field: "side_channel_name",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.leak_warning_interval, 5);
        assert_eq!(config.tick_history, 100);
        assert_eq!(config.max_collision_rise, 256);
        assert_eq!(config.side_channel_name, "level_multiverse");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("engine.json");
        std::fs::write(&path, r#"{ "max_collision_rise": 16 }"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.max_collision_rise, 16);
        assert_eq!(config.leak_warning_interval, 5);
    }

    #[test]
    fn zero_leak_interval_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("engine.json");
        std::fs::write(&path, r#"{ "leak_warning_interval": 0 }"#).unwrap();

        match EngineConfig::load(&path) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "leak_warning_interval"),
            other => panic!("expected Invalid, got: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = EngineConfig::load(tmp.path().join("nope.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
