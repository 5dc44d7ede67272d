//! CLI configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// API base used by the development profile when nothing else is configured
pub const DEFAULT_DEV_API: &str = "http://127.0.0.1:4000/api";

/// Polling interval of the development profile (milliseconds)
pub const DEFAULT_DEV_INTERVAL_MS: u64 = 1000;

/// Polling interval of the production profile (milliseconds)
pub const DEFAULT_PROD_INTERVAL_MS: u64 = 5000;

/// Get the configuration directory path
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keydesk")
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".keydesk")
    }
}

/// Get the config file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.yml")
}

/// Get the logs directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Ensure all config directories exist
pub fn ensure_dirs() -> Result<()> {
    let config = config_dir();
    let logs = logs_dir();

    fs::create_dir_all(&config).context("Failed to create config directory")?;
    fs::create_dir_all(&logs).context("Failed to create logs directory")?;

    Ok(())
}

/// Build-mode switch selecting a profile
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[value(alias = "dev")]
    Development,
    #[value(alias = "prod")]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Per-environment settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Backend API base URL (e.g. http://127.0.0.1:4000/api)
    #[serde(default)]
    pub api: Option<String>,

    /// Milliseconds between two polls of the client list
    #[serde(default)]
    pub polling_interval_ms: Option<u64>,
}

/// Main configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Environment used when neither `--env` nor `KEYDESK_ENV` is set
    #[serde(default)]
    pub environment: Option<Environment>,

    #[serde(default)]
    pub development: Profile,

    #[serde(default)]
    pub production: Profile,
}

impl Config {
    /// Load config from file
    pub fn load() -> Result<Self> {
        let path = config_file();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        Self::from_yaml(&content)
    }

    /// Parse config from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Get the profile for an environment
    pub fn profile(&self, env: Environment) -> &Profile {
        match env {
            Environment::Development => &self.development,
            Environment::Production => &self.production,
        }
    }
}

/// Values taken from command-line flags or their environment variables
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub environment: Option<Environment>,
    pub api: Option<String>,
    pub polling_interval_ms: Option<u64>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub environment: Environment,
    pub api: String,
    pub polling_interval: Duration,
}

impl Settings {
    /// Resolve settings: overrides, then the config profile, then built-in defaults
    pub fn resolve(config: &Config, overrides: &Overrides) -> Result<Self> {
        let environment = overrides
            .environment
            .or(config.environment)
            .unwrap_or_default();
        let profile = config.profile(environment);

        let api = overrides
            .api
            .clone()
            .or_else(|| profile.api.clone())
            .or_else(|| match environment {
                Environment::Development => Some(DEFAULT_DEV_API.to_string()),
                Environment::Production => None,
            })
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No API configured for the {} environment. Set `api` in {} or pass --api.",
                    environment.as_str(),
                    config_file().display()
                )
            })?;

        let interval_ms = overrides
            .polling_interval_ms
            .or(profile.polling_interval_ms)
            .unwrap_or(match environment {
                Environment::Development => DEFAULT_DEV_INTERVAL_MS,
                Environment::Production => DEFAULT_PROD_INTERVAL_MS,
            });

        if interval_ms == 0 {
            anyhow::bail!("Polling interval must be greater than zero");
        }

        Ok(Self {
            environment,
            api,
            polling_interval: Duration::from_millis(interval_ms),
        })
    }
}
