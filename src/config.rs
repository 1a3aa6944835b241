use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::DEFAULT_BOOKEND;
use crate::Result;

pub const SETTINGS_FILE: &str = "docfill.toml";

/// Application settings for docfill
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub defaults: DefaultsConfig,
    pub logging: LoggingConfig,
}

/// Fallbacks used when a job configuration or the command line leaves a value out
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub bookend: String,
    pub overwrite: bool,
    pub job_file: PathBuf,
    pub date_placeholder: String,
    pub date_format: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub target: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            bookend: DEFAULT_BOOKEND.to_string(),
            overwrite: false,
            job_file: PathBuf::from("config.json"),
            date_placeholder: "date".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(), // pretty, json, compact
            target: "stderr".to_string(),  // stdout, stderr
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (DOCFILL_*)
    /// 2. docfill.toml file (if exists)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_dir(&std::env::current_dir()?)
    }

    /// Load configuration from a specific directory
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_with_env(dir, None)
    }

    /// Like `load_from_dir`, with an explicit environment instead of the
    /// process environment when `env` is `Some`.
    pub fn load_with_env(dir: &Path, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        let settings_file = dir.join(SETTINGS_FILE);
        if settings_file.exists() {
            builder = builder.add_source(File::from(settings_file));
        }

        // DOCFILL_DEFAULTS__BOOKEND -> defaults.bookend
        builder = builder.add_source(
            Environment::with_prefix("DOCFILL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config = builder.build()?.try_deserialize::<Config>()?;
        Ok(config)
    }

    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
                target: "stdout".to_string(),
            },
        }
    }
}
