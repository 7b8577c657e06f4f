use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// On-disk configuration. Every section defaults independently so a partial
/// file only overrides what it mentions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Cap applied to each stage's pool independently.
    pub max_threads: usize,
    pub status_interval_secs: u64,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        ConcurrencyConfig {
            max_threads: 30,
            status_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub enabled: bool,
    /// Rendered per host; `{host}` is replaced before the command is split.
    pub command: String,
    pub timeout_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            enabled: true,
            command: "smbclient -N -g -L {host}".to_string(),
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub enabled: bool,
    pub scan_admin_shares: bool,
    /// Rendered per share; `{share}` is replaced before the command is split.
    pub command: String,
    pub timeout_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            enabled: true,
            scan_admin_shares: false,
            command: "smbclient {share} -N -c 'recurse; ls'".to_string(),
            timeout_ms: 600_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Append one JSON line per discovered share here, if set.
    pub events_file: Option<PathBuf>,
}
