//! Config loading and path resolution.

use std::fs;
use std::path::{Path, PathBuf};

use crate::db::MomentumDb;
use crate::error::SignalError;
use crate::types::Config;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "MOMENTUM_CONFIG";

/// Resolve the config path: `$MOMENTUM_CONFIG`, else `~/.momentum/config.json`.
pub fn config_path() -> Result<PathBuf, SignalError> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let home = dirs::home_dir()
        .ok_or_else(|| SignalError::Config("Could not find home directory".to_string()))?;
    Ok(home.join(".momentum").join("config.json"))
}

/// Load the config from its default location. A missing file yields defaults.
pub fn load_config() -> Result<Config, SignalError> {
    load_config_from(&config_path()?)
}

/// Load the config at `path`. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, SignalError> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| SignalError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = serde_json::from_str(&content)
        .map_err(|e| SignalError::Config(format!("Failed to parse config: {}", e)))?;

    if config.default_window_days <= 0 {
        return Err(SignalError::Config(format!(
            "defaultWindowDays must be positive, got {}",
            config.default_window_days
        )));
    }
    if config.scan_batch_size == 0 {
        return Err(SignalError::Config("scanBatchSize must be at least 1".to_string()));
    }

    Ok(config)
}

/// Database path from config, falling back to `~/.momentum/momentum.db`.
pub fn resolve_db_path(config: &Config) -> Result<PathBuf, SignalError> {
    match config.db_path.as_deref() {
        Some(p) if !p.trim().is_empty() => Ok(expand_home(p)),
        _ => Ok(MomentumDb::default_path()?),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
