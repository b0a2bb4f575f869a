//! Configuration loading for paramtree.
//!
//! Selects the parameter store backend and its throughput settings, plus
//! logging. Kept free of async and HTTP dependencies so any entry point can
//! load it cheaply.
//!
//! # Usage
//!
//! ```rust,no_run
//! use paramconf::ParamConfig;
//!
//! let config = ParamConfig::load().expect("Failed to load config");
//! println!("backend: {}", config.backend);
//! println!("ssm rate: {}/s", config.ssm.requests_per_second);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/paramtree/config.toml` (system)
//! 2. `~/.config/paramtree/config.toml` (user)
//! 3. `./paramtree.toml` (local override)
//! 4. Environment variables (`PARAMTREE_*`)
//!
//! # Example Config
//!
//! ```toml
//! backend = "ssm"
//!
//! [ssm]
//! region = "us-west-2"
//! requests_per_second = 3
//! secure = true
//!
//! [local]
//! db_path = "~/.local/share/paramtree/parameters.db"
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod backend;
pub mod loader;

pub use backend::{BackendKind, LocalConfig, SsmConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete paramtree configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ParamConfig {
    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default)]
    pub ssm: SsmConfig,

    #[serde(default)]
    pub local: LocalConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ParamConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/paramtree/config.toml`
    /// 3. `~/.config/paramtree/config.toml`
    /// 4. `./paramtree.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with a specific file taking the place of `./paramtree.toml`.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut layers = toml::Table::new();

        for path in loader::discover_config_files_with_override(config_path) {
            let layer = loader::load_layer(&path)?;
            loader::merge_layers(&mut layers, layer);
            sources.files.push(path);
        }

        let mut config = match sources.files.last() {
            Some(last) => loader::resolve(layers, last)?,
            None => ParamConfig::default(),
        };

        loader::apply_env_overrides(&mut config, &mut sources);
        config.validate()?;

        Ok((config, sources))
    }

    /// Admission rate for the selected backend.
    pub fn requests_per_second(&self) -> u32 {
        match self.backend {
            BackendKind::Ssm => self.ssm.requests_per_second,
            BackendKind::Local => self.local.requests_per_second,
        }
    }

    /// Reject settings the backends cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssm.requests_per_second == 0 || self.local.requests_per_second == 0 {
            return Err(ConfigError::Invalid(
                "requests_per_second must be at least 1".to_string(),
            ));
        }
        if !(1..=10).contains(&self.ssm.page_size) {
            return Err(ConfigError::Invalid(format!(
                "ssm.page_size must be between 1 and 10, got {}",
                self.ssm.page_size
            )));
        }
        if !(1..=1000).contains(&self.local.page_size) {
            return Err(ConfigError::Invalid(format!(
                "local.page_size must be between 1 and 1000, got {}",
                self.local.page_size
            )));
        }
        Ok(())
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# paramtree configuration\n\n");
        output.push_str(&format!("backend = \"{}\"\n", self.backend));

        output.push_str("\n[ssm]\n");
        output.push_str(&format!("region = \"{}\"\n", self.ssm.region));
        output.push_str(&format!("endpoint = \"{}\"\n", self.ssm.endpoint));
        output.push_str(&format!("kms_key_id = \"{}\"\n", self.ssm.kms_key_id));
        output.push_str(&format!(
            "requests_per_second = {}\n",
            self.ssm.requests_per_second
        ));
        output.push_str(&format!("secure = {}\n", self.ssm.secure));
        output.push_str(&format!("page_size = {}\n", self.ssm.page_size));
        output.push_str(&format!("timeout_ms = {}\n", self.ssm.timeout_ms));

        output.push_str("\n[local]\n");
        output.push_str(&format!(
            "db_path = \"{}\"\n",
            self.local.db_path.display()
        ));
        output.push_str(&format!(
            "requests_per_second = {}\n",
            self.local.requests_per_second
        ));
        output.push_str(&format!("page_size = {}\n", self.local.page_size));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = \"{}\"\n",
            self.telemetry.log_level
        ));

        output
    }
}
