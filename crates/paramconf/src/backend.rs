//! Backend configuration - which parameter store to talk to and how fast.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which parameter store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Managed cloud parameter store (SSM JSON API).
    Ssm,
    /// Embedded SQLite database for offline use and tests.
    #[default]
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ssm => "ssm",
            BackendKind::Local => "local",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssm" | "aws" => Ok(BackendKind::Ssm),
            "local" | "sqlite" => Ok(BackendKind::Local),
            other => Err(format!("unknown backend '{}' (expected ssm or local)", other)),
        }
    }
}

/// Cloud parameter store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsmConfig {
    /// AWS region of the parameter store.
    /// Default: us-east-1
    #[serde(default = "SsmConfig::default_region")]
    pub region: String,

    /// Explicit endpoint URL, e.g. a local emulator. Empty means the regional
    /// service endpoint.
    #[serde(default)]
    pub endpoint: String,

    /// KMS key for SecureString parameters. Empty means the account default key.
    #[serde(default)]
    pub kms_key_id: String,

    /// Sustained admission rate. The standard throughput tier tops out low.
    /// Default: 3
    #[serde(default = "SsmConfig::default_requests_per_second")]
    pub requests_per_second: u32,

    /// Store values as SecureString.
    /// Default: true
    #[serde(default = "SsmConfig::default_secure")]
    pub secure: bool,

    /// MaxResults per GetParametersByPath page (service maximum is 10).
    /// Default: 10
    #[serde(default = "SsmConfig::default_page_size")]
    pub page_size: u32,

    /// Per-operation timeout in milliseconds.
    /// Default: 30000
    #[serde(default = "SsmConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl SsmConfig {
    fn default_region() -> String {
        "us-east-1".to_string()
    }

    fn default_requests_per_second() -> u32 {
        3
    }

    fn default_secure() -> bool {
        true
    }

    fn default_page_size() -> u32 {
        10
    }

    fn default_timeout_ms() -> u64 {
        30_000
    }

    /// Endpoint override, if one is configured.
    pub fn endpoint_override(&self) -> Option<&str> {
        let endpoint = self.endpoint.trim();
        (!endpoint.is_empty()).then_some(endpoint)
    }
}

impl Default for SsmConfig {
    fn default() -> Self {
        Self {
            region: Self::default_region(),
            endpoint: String::new(),
            kms_key_id: String::new(),
            requests_per_second: Self::default_requests_per_second(),
            secure: Self::default_secure(),
            page_size: Self::default_page_size(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

/// Embedded database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// SQLite database file.
    /// Default: ~/.local/share/paramtree/parameters.db
    #[serde(default = "LocalConfig::default_db_path")]
    pub db_path: PathBuf,

    /// Admission rate; effectively unlimited for a local file.
    /// Default: 1000
    #[serde(default = "LocalConfig::default_requests_per_second")]
    pub requests_per_second: u32,

    /// Rows per listing page.
    /// Default: 10
    #[serde(default = "LocalConfig::default_page_size")]
    pub page_size: u32,
}

impl LocalConfig {
    fn default_db_path() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".local/share/paramtree/parameters.db"))
            .unwrap_or_else(|| PathBuf::from(".local/share/paramtree/parameters.db"))
    }

    fn default_requests_per_second() -> u32 {
        1000
    }

    fn default_page_size() -> u32 {
        10
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            db_path: Self::default_db_path(),
            requests_per_second: Self::default_requests_per_second(),
            page_size: Self::default_page_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
