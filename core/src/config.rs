//! Logger configuration loading and management.
//! Uses injected `AppPaths` so platform shells control where files live.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::platform::AppPaths;

/// What `Logger::log_file` does when the target file already exists.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Level filter handed to the platform log backend ("error" .. "trace").
    pub level: String,
    /// Mirror every `log` line into the daily log file.
    pub mirror_to_file: bool,
    /// Stem of the daily mirror log; the file becomes `<stem>-YYYY-MM-DD.log`.
    pub log_file_stem: String,
    pub write_mode: WriteMode,
    /// Subscribe to sleep/wake/terminate events when the shared logger is created.
    pub register_for_system_events: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            mirror_to_file: true,
            log_file_stem: "vsaver".to_string(),
            write_mode: WriteMode::Overwrite,
            register_for_system_events: true,
        }
    }
}

impl LoggerConfig {
    /// Load configuration from the provided paths. Creates a default file if missing.
    pub fn load_with(paths: &dyn AppPaths) -> Result<Self, ConfigError> {
        let config_path = paths.config_path();

        if !config_path.exists() {
            info!(
                "Logger config not found at {:?}, creating default config",
                config_path
            );
            let default_config = Self::default();
            default_config.save_with(paths)?;
            return Ok(default_config);
        }

        debug!("Loading logger config from {:?}", config_path);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: config_path.clone(),
            source,
        })?;

        info!(
            "Loaded logger config (level={}, mirror_to_file={}, write_mode={:?})",
            config.level, config.mirror_to_file, config.write_mode
        );
        Ok(config)
    }

    /// Load configuration, falling back to defaults when it cannot be read.
    pub fn load_or_default(paths: &dyn AppPaths) -> Self {
        match Self::load_with(paths) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load logger config: {}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the provided paths.
    pub fn save_with(&self, paths: &dyn AppPaths) -> Result<(), ConfigError> {
        let config_path = paths.config_path();

        // Create the directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;

        info!("Saved logger config to {:?}", config_path);
        Ok(())
    }

    /// Parsed level filter; unknown names fall back to `Debug`.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.level).unwrap_or_else(|_| {
            warn!("Unknown log level '{}', using debug", self.level);
            LevelFilter::Debug
        })
    }
}
