use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use deal_analyzer_core::deal::progress::FileProgressStore;

/// Base URL used in development when nothing else is configured.
pub const DEV_API_BASE_URL: &str = "http://localhost:5000";

pub const ENV_API_URL: &str = "DEAL_ANALYZER_API_URL";
pub const ENV_ENVIRONMENT: &str = "DEAL_ANALYZER_ENV";
pub const ENV_STATE_DIR: &str = "DEAL_ANALYZER_STATE_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unknown environment '{0}' (expected development or production)")]
    InvalidEnvironment(String),

    #[error("No analysis API URL configured; set DEAL_ANALYZER_API_URL, apiBaseUrl in the config file, or --api-url")]
    MissingApiUrl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

/// Effective CLI settings after every layer has been applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub api_base_url: Option<String>,
    pub environment: Environment,
    pub state_dir: PathBuf,
}

/// Shape of the optional YAML config file. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FileConfig {
    api_base_url: Option<String>,
    environment: Option<Environment>,
    state_dir: Option<PathBuf>,
}

/// Values passed explicitly on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub state_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_base_url: None,
            environment: Environment::Development,
            state_dir: default_state_dir(),
        }
    }
}

impl AppConfig {
    /// defaults, then the YAML file, then the process environment, then flags.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::load_with(file, overrides, |key| std::env::var(key).ok())
    }

    /// Same layering with an injectable environment lookup.
    pub fn load_with<F>(
        file: Option<&Path>,
        overrides: &Overrides,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();
        if let Some(path) = file {
            config.apply_file(path)?;
        }
        config.apply_env(lookup)?;
        config.apply_overrides(overrides);
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: FileConfig =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if parsed.api_base_url.is_some() {
            self.api_base_url = parsed.api_base_url;
        }
        if let Some(env) = parsed.environment {
            self.environment = env;
        }
        if let Some(dir) = parsed.state_dir {
            self.state_dir = dir;
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(env) = lookup(ENV_ENVIRONMENT) {
            self.environment = env.parse()?;
        }
        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|v| !v.trim().is_empty()) {
            self.state_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.api_url {
            self.api_base_url = Some(url.clone());
        }
        if let Some(dir) = &overrides.state_dir {
            self.state_dir = dir.clone();
        }
    }

    /// Production has no implicit host; development falls back to localhost.
    pub fn api_base_url(&self) -> Result<String, ConfigError> {
        match (&self.api_base_url, self.environment) {
            (Some(url), _) => Ok(url.trim_end_matches('/').to_string()),
            (None, Environment::Development) => Ok(DEV_API_BASE_URL.to_string()),
            (None, Environment::Production) => Err(ConfigError::MissingApiUrl),
        }
    }

    pub fn progress_store(&self) -> FileProgressStore {
        FileProgressStore::new(&self.state_dir)
    }
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("deal-analyzer"))
        .unwrap_or_else(|| PathBuf::from(".deal-analyzer"))
}
