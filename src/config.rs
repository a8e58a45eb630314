//! Configuration for the overseer shell
//!
//! Loaded from an optional YAML file; every field has a default so an empty
//! or missing file yields a usable configuration. Command-line flags are
//! applied on top by the binary.

use crate::permissions::{PermissionFlag, PermissionGate};
use crate::provider::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("{0} not found in environment or auth.json")]
    MissingApiKey(String),
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider settings
    pub provider: ProviderConfig,

    /// Model override (falls back to the provider's default model)
    pub model: Option<String>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Agents file (JSON or YAML)
    pub agents_file: PathBuf,

    /// Working directory for file operations
    pub working_dir: PathBuf,

    /// Telemetry settings
    pub telemetry: TelemetryConfig,

    /// Initial permission values; unset flags keep their defaults
    pub permissions: BTreeMap<PermissionFlag, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Directory for log files
    pub log_dir: PathBuf,

    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            model: None,
            temperature: None,
            agents_file: PathBuf::from("agents.json"),
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            telemetry: TelemetryConfig::default(),
            permissions: BTreeMap::new(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(".overseer_logs"),
            verbose: false,
        }
    }
}

impl Config {
    /// Load from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load `path` when given, otherwise `overseer.yaml` in the current
    /// directory if present, otherwise defaults
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new("overseer.yaml");
                if local.exists() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Model to request, override first
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(&self.provider.default_model)
    }

    /// Agents file path, relative paths resolved against the working directory
    pub fn agents_path(&self) -> PathBuf {
        if self.agents_file.is_absolute() {
            self.agents_file.clone()
        } else {
            self.working_dir.join(&self.agents_file)
        }
    }

    /// Build the shared permission gate from the configured initial values
    pub fn permission_gate(&self) -> PermissionGate {
        PermissionGate::with_flags(self.permissions.iter().map(|(flag, value)| (*flag, *value)))
    }

    /// Set verbose logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.telemetry.verbose = verbose;
        self
    }

    /// Set log directory
    pub fn with_log_dir(mut self, log_dir: PathBuf) -> Self {
        self.telemetry.log_dir = log_dir;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.agents_file, PathBuf::from("agents.json"));
        assert_eq!(config.model_name(), ProviderConfig::openai().default_model);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
model: local-model
agents_file: team.yaml
working_dir: /srv/work
telemetry:
  verbose: true
permissions:
  ALLOW_RUN_SCRIPTS: true
  ALLOW_NETWORK: false
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.model_name(), "local-model");
        assert_eq!(config.agents_path(), PathBuf::from("/srv/work/team.yaml"));
        assert!(config.telemetry.verbose);
        assert_eq!(config.telemetry.log_dir, PathBuf::from(".overseer_logs"));

        let gate = config.permission_gate();
        assert!(gate.is_allowed(PermissionFlag::RunScripts));
        assert!(!gate.is_allowed(PermissionFlag::Network));
        assert!(!gate.is_allowed(PermissionFlag::Sudo));
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.yaml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Read { .. })));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "permissions: [not, a, map]").unwrap();
        assert!(matches!(Config::load(&bad), Err(ConfigError::Parse { .. })));
    }
}
