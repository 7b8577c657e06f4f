use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::scheduler::PoolSnapshot;

/// A host to probe for shares. Opaque beyond display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetHost(String);

impl TargetHost {
    pub fn new(value: impl Into<String>) -> Self {
        TargetHost(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetHost {
    fn from(value: &str) -> Self {
        TargetHost(value.to_string())
    }
}

/// One discovered share: where it is and whether the discoverer could read it.
/// Paths are `//host/share` form; the filter rules only look at suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub path: String,
    pub scan_requested: bool,
}

impl ShareRecord {
    pub fn new(path: impl Into<String>, scan_requested: bool) -> Self {
        ShareRecord {
            path: path.into(),
            scan_requested,
        }
    }
}

/// End-of-run accounting returned by the orchestrator.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub shares_discovered: usize,
    pub scans_spawned: usize,
    pub finder: PoolSnapshot,
    pub scanner: PoolSnapshot,
    pub elapsed: Duration,
}
