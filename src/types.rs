use serde::{Deserialize, Serialize};

/// Configuration stored in `~/.momentum/config.json`.
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Database file. Defaults to `~/.momentum/momentum.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
    /// Maximum documents examined per scan pass.
    #[serde(default = "default_scan_batch_size")]
    pub scan_batch_size: usize,
    /// Trailing window for queries when none is given.
    #[serde(default = "default_window_days")]
    pub default_window_days: i64,
    /// Maximum signals returned by a query when none is given.
    #[serde(default = "default_query_limit")]
    pub query_limit: usize,
}

fn default_scan_batch_size() -> usize {
    50
}

fn default_window_days() -> i64 {
    30
}

fn default_query_limit() -> usize {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            scan_batch_size: default_scan_batch_size(),
            default_window_days: default_window_days(),
            query_limit: default_query_limit(),
        }
    }
}
