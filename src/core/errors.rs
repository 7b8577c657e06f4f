use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Details of a failed probe subprocess, kept small enough to log at trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecError {
    pub tool: String,
    pub args: Vec<String>,
    pub exit_code: Option<i32>,
    pub stderr_tail: String,
    pub duration_ms: u128,
}

#[derive(Error, Debug)]
pub enum SharecrawlerError {
    /// Target enumeration failed outright. Fatal: there is nothing to probe.
    #[error("target enumeration failed: {0:#}")]
    TargetEnumeration(anyhow::Error),

    /// Enumeration succeeded but produced zero hosts. Also fatal; proceeding
    /// would report a falsely clean run.
    #[error("no target hosts found")]
    NoTargets,

    /// The result sink went away mid-run. Results would be silently dropped,
    /// so the run stops instead.
    #[error("result sink closed before the run completed")]
    SinkClosed,

    #[error("execution failed: {0:?}")]
    Exec(ExecError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
