//! Binary configuration: a TOML file with environment variable expansion.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use autoengage_engine::EngineConfig;
use autoengage_protocols::RunSettings;

/// Root configuration for the `autoengage` binary.
///
/// Every section is optional; a missing file is equivalent to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the state file and debug logs.
    /// Overridden by `--state-dir`; defaults to `~/.autoengage`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<String>,

    /// Default run settings, overridable from the command line.
    #[serde(default)]
    pub run: RunSettings,

    /// Engine deployment knobs.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Behavior of the built-in simulated browser.
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Knobs for the simulated tab controller and page actuator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Simulated page-load latency, in milliseconds.
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u64,

    /// Simulated actuation latency, in milliseconds.
    #[serde(default = "default_action_delay_ms")]
    pub action_delay_ms: u64,

    /// Every Nth URL is observed already liked (0 disables).
    #[serde(default)]
    pub already_liked_every: usize,

    /// Every Nth URL is observed already commented (0 disables).
    #[serde(default)]
    pub already_commented_every: usize,

    /// Every Nth URL fails its first attempt (0 disables).
    #[serde(default)]
    pub fail_first_attempt_every: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            load_delay_ms: default_load_delay_ms(),
            action_delay_ms: default_action_delay_ms(),
            already_liked_every: 0,
            already_commented_every: 0,
            fail_first_attempt_every: 0,
        }
    }
}

fn default_load_delay_ms() -> u64 {
    300
}

fn default_action_delay_ms() -> u64 {
    400
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<AppConfig, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: AppConfig = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g. `~/.autoengage`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}
