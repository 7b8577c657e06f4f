use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Shared counters for one pool, one slot per work-item lifecycle stage
/// (pending items are `submitted` minus everything else). Completed, Faulted
/// and Cancelled are terminal; a terminal item is counted exactly once and
/// never re-counted. Writable only by the pool's own tasks; everyone else
/// (drain loop, status reporter, summary) reads snapshots.
#[derive(Debug, Default)]
pub struct PoolCounters {
    submitted: AtomicUsize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
    completed: AtomicUsize,
    faulted: AtomicUsize,
    cancelled: AtomicUsize,
}

impl PoolCounters {
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            submitted: self.submitted.load(Ordering::SeqCst),
            running: self.running.load(Ordering::SeqCst),
            peak_running: self.peak_running.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            faulted: self.faulted.load(Ordering::SeqCst),
            cancelled: self.cancelled.load(Ordering::SeqCst),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PoolSnapshot {
    pub submitted: usize,
    pub running: usize,
    pub peak_running: usize,
    pub completed: usize,
    pub faulted: usize,
    pub cancelled: usize,
}

impl PoolSnapshot {
    pub fn terminal(&self) -> usize {
        self.completed + self.faulted + self.cancelled
    }

    /// Items still pending or running.
    pub fn remaining(&self) -> usize {
        self.submitted.saturating_sub(self.terminal())
    }

    /// True once every submitted item has reached a terminal state. A pool
    /// that never received work is trivially done.
    pub fn all_terminal(&self) -> bool {
        self.terminal() == self.submitted
    }
}

/// A bounded-concurrency task pool over the tokio runtime.
///
/// At most `max_concurrency` submitted items run simultaneously; the rest
/// queue in the semaphore's FIFO acquire order. Errors raised by a work
/// future are caught at the item boundary, logged and counted as Faulted —
/// they never reach the caller. Each terminal transition pings `change` so a
/// waiter can re-examine the counters without polling.
pub struct TaskPool {
    name: &'static str,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    counters: Arc<PoolCounters>,
    change: Arc<Notify>,
    handles: Vec<JoinHandle<()>>,
}

impl TaskPool {
    pub fn new(name: &'static str, max_concurrency: usize) -> Self {
        TaskPool {
            name,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            cancel: CancellationToken::new(),
            counters: Arc::new(PoolCounters::default()),
            change: Arc::new(Notify::new()),
            handles: Vec::new(),
        }
    }

    pub fn counters(&self) -> Arc<PoolCounters> {
        Arc::clone(&self.counters)
    }

    pub fn change(&self) -> Arc<Notify> {
        Arc::clone(&self.change)
    }

    /// Cancelling the token stops items that have not started and requests
    /// cooperative stop of running ones; in-flight blocking I/O finishes its
    /// current await first.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Submit one work item. The future reports failure through its `Err`
    /// variant; a panic inside it is a bug, not a Faulted item.
    pub fn submit<F>(&mut self, label: String, work: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.counters.submitted.fetch_add(1, Ordering::SeqCst);

        let name = self.name;
        let semaphore = Arc::clone(&self.semaphore);
        let counters = Arc::clone(&self.counters);
        let change = Arc::clone(&self.change);
        let cancel = self.cancel.clone();

        let handle = tokio::spawn(async move {
            let permit = tokio::select! {
                permit = semaphore.acquire_owned() => permit,
                _ = cancel.cancelled() => {
                    tracing::debug!("{name}: {label} cancelled before start");
                    counters.cancelled.fetch_add(1, Ordering::SeqCst);
                    change.notify_one();
                    return;
                }
            };
            // The semaphore is never closed while items run; treat closure
            // like cancellation anyway so the item still turns terminal.
            let _permit = match permit {
                Ok(permit) => permit,
                Err(_) => {
                    counters.cancelled.fetch_add(1, Ordering::SeqCst);
                    change.notify_one();
                    return;
                }
            };

            if cancel.is_cancelled() {
                tracing::debug!("{name}: {label} cancelled before start");
                counters.cancelled.fetch_add(1, Ordering::SeqCst);
                change.notify_one();
                return;
            }

            let running = counters.running.fetch_add(1, Ordering::SeqCst) + 1;
            counters.peak_running.fetch_max(running, Ordering::SeqCst);

            let outcome = tokio::select! {
                result = work => Some(result),
                _ = cancel.cancelled() => None,
            };

            counters.running.fetch_sub(1, Ordering::SeqCst);
            match outcome {
                Some(Ok(())) => {
                    counters.completed.fetch_add(1, Ordering::SeqCst);
                }
                Some(Err(err)) => {
                    tracing::trace!("{name}: {label} faulted: {err:#}");
                    counters.faulted.fetch_add(1, Ordering::SeqCst);
                }
                None => {
                    tracing::debug!("{name}: {label} cancelled mid-flight");
                    counters.cancelled.fetch_add(1, Ordering::SeqCst);
                }
            }
            change.notify_one();
        });

        self.handles.push(handle);
    }

    /// Wait for every spawned item to finish. Work errors were already
    /// converted to Faulted counts, so the join results carry nothing.
    pub async fn join(&mut self) {
        let handles = std::mem::take(&mut self.handles);
        let _ = futures::future::join_all(handles).await;
    }
}
