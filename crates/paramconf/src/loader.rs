//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, ParamConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a caller-supplied path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/paramtree/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("paramtree/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("paramtree.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a single TOML file, filling unset keys with defaults.
pub fn load_from_file(path: &Path) -> Result<ParamConfig, ConfigError> {
    resolve(load_layer(path)?, path)
}

/// Load the keys a TOML file sets explicitly, without applying defaults.
///
/// The layer is also resolved on its own so type errors name this file.
pub fn load_layer(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_layer(&contents, path)
}

fn parse_layer(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    let layer: toml::Table =
        toml::from_str(contents).map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    resolve(layer.clone(), path)?;
    Ok(layer)
}

/// Merge `overlay` into `base`. Tables merge key by key; any other value the
/// overlay sets replaces the base value, even when it equals the default.
pub fn merge_layers(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_layers(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

/// Turn merged layers into a typed config. `path` is only used in errors.
pub fn resolve(layers: toml::Table, path: &Path) -> Result<ParamConfig, ConfigError> {
    let mut config: ParamConfig = toml::Value::Table(layers)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    // serde hands us the raw string; expand ~ and $VAR like env values
    if let Some(raw) = config.local.db_path.to_str() {
        config.local.db_path = expand_path(raw);
    }

    Ok(config)
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut ParamConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from an arbitrary variable lookup.
pub fn apply_overrides_from<F>(config: &mut ParamConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Only values that were actually applied count as overrides.
    let mut applied = |key: &str| sources.env_overrides.push(key.to_string());

    if let Some(kind) = lookup("PARAMTREE_BACKEND").and_then(|v| v.parse().ok()) {
        config.backend = kind;
        applied("PARAMTREE_BACKEND");
    }

    if let Some(v) = lookup("PARAMTREE_SSM_REGION") {
        config.ssm.region = v;
        applied("PARAMTREE_SSM_REGION");
    }
    if let Some(v) = lookup("PARAMTREE_SSM_ENDPOINT") {
        config.ssm.endpoint = v;
        applied("PARAMTREE_SSM_ENDPOINT");
    }
    if let Some(v) = lookup("PARAMTREE_SSM_KMS_KEY_ID") {
        config.ssm.kms_key_id = v;
        applied("PARAMTREE_SSM_KMS_KEY_ID");
    }
    if let Some(rate) = lookup("PARAMTREE_SSM_REQUESTS_PER_SECOND").and_then(|v| v.parse().ok()) {
        config.ssm.requests_per_second = rate;
        applied("PARAMTREE_SSM_REQUESTS_PER_SECOND");
    }

    if let Some(v) = lookup("PARAMTREE_LOCAL_DB_PATH") {
        config.local.db_path = expand_path(&v);
        applied("PARAMTREE_LOCAL_DB_PATH");
    }
    if let Some(rate) = lookup("PARAMTREE_LOCAL_REQUESTS_PER_SECOND").and_then(|v| v.parse().ok())
    {
        config.local.requests_per_second = rate;
        applied("PARAMTREE_LOCAL_REQUESTS_PER_SECOND");
    }

    if let Some(v) = lookup("PARAMTREE_LOG_LEVEL") {
        config.telemetry.log_level = v;
        applied("PARAMTREE_LOG_LEVEL");
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        applied("RUST_LOG");
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
