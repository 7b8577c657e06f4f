use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::scheduler::PoolCounters;

/// Periodic progress line. Reads counter snapshots only; it can race the
/// orchestrator's transitions freely because slightly stale counts are fine.
pub struct StatusReporter;

impl StatusReporter {
    pub fn spawn(
        finder: Arc<PoolCounters>,
        scanner: Arc<PoolCounters>,
        period: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // interval fires immediately; swallow that tick so the first
            // status line lands one full period into the run.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let f = finder.snapshot();
                let s = scanner.snapshot();
                tracing::info!(
                    "status: share finder {}/{} done ({} running, {} remaining, {} faulted), \
                     share scanner {}/{} done ({} running, {} remaining, {} faulted)",
                    f.terminal(),
                    f.submitted,
                    f.running,
                    f.remaining(),
                    f.faulted,
                    s.terminal(),
                    s.submitted,
                    s.running,
                    s.remaining(),
                    s.faulted,
                );
            }
        })
    }
}
