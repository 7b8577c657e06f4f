use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use super::errors::SharecrawlerError;
use super::events::{OutputEvent, OutputSender};
use super::filter::{Admission, DedupState, SharePolicy};
use super::models::{RunSummary, ShareRecord};
use super::queue::ResultQueue;
use super::scheduler::{PoolCounters, TaskPool};
use crate::probes::types::{ShareDiscoverer, ShareScanner, TargetEnumerator};

/// The slice of configuration the pipeline itself consumes.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub max_threads: usize,
    pub share_finder_enabled: bool,
    pub share_scan_enabled: bool,
    pub scan_admin_shares: bool,
    pub dir_target: Option<String>,
}

/// Owns both pools, the result queue and the dedup state, and drives the run
/// from target enumeration to the final summary.
///
/// The share set for stage 2 is not known until stage 1 partially completes,
/// so the drain loop interleaves with the finder pool: it empties the queue,
/// then blocks until either a finder task turns terminal or another record
/// arrives, and re-checks. It exits only on observing "all finders terminal"
/// and "queue empty" together — a record emitted by the last slow finder
/// still gets drained and scanned.
pub struct Orchestrator {
    options: RunOptions,
    finder: TaskPool,
    scanner: TaskPool,
    queue: Arc<ResultQueue>,
    discoverer: Arc<dyn ShareDiscoverer>,
    share_scanner: Arc<dyn ShareScanner>,
    events: OutputSender,
}

impl Orchestrator {
    pub fn new(
        options: RunOptions,
        discoverer: Arc<dyn ShareDiscoverer>,
        share_scanner: Arc<dyn ShareScanner>,
        events: OutputSender,
    ) -> Self {
        let finder = TaskPool::new("share-finder", options.max_threads);
        let scanner = TaskPool::new("share-scanner", options.max_threads);
        Orchestrator {
            options,
            finder,
            scanner,
            queue: Arc::new(ResultQueue::new()),
            discoverer,
            share_scanner,
            events,
        }
    }

    pub fn finder_counters(&self) -> Arc<PoolCounters> {
        self.finder.counters()
    }

    pub fn scanner_counters(&self) -> Arc<PoolCounters> {
        self.scanner.counters()
    }

    /// Tokens for stopping the stages early. Cancelling the finder still
    /// lets already-queued records drain and scan; cancelling the scanner
    /// stops new scans from starting.
    pub fn cancel_handles(&self) -> (CancellationToken, CancellationToken) {
        (
            self.finder.cancellation_token(),
            self.scanner.cancellation_token(),
        )
    }

    pub async fn run(
        &mut self,
        targets: &dyn TargetEnumerator,
    ) -> Result<RunSummary, SharecrawlerError> {
        if let Some(dir_target) = self.options.dir_target.clone() {
            // Fixed-target mode: behave as if stage 1 already produced the
            // one record we care about.
            tracing::info!("using fixed target {dir_target}, skipping discovery");
            self.queue.push(ShareRecord::new(dir_target, true)).await;
        } else {
            tracing::info!("enumerating target hosts via {}", targets.name());
            let hosts = targets
                .enumerate()
                .await
                .map_err(SharecrawlerError::TargetEnumeration)?;
            if hosts.is_empty() {
                return Err(SharecrawlerError::NoTargets);
            }
            tracing::info!("got {} target hosts", hosts.len());

            if self.options.share_finder_enabled {
                for host in hosts {
                    tracing::debug!("creating share finder task for {host}");
                    let discoverer = Arc::clone(&self.discoverer);
                    let queue = Arc::clone(&self.queue);
                    self.finder.submit(host.to_string(), async move {
                        let records = discoverer.discover(&host).await?;
                        for record in records {
                            queue.push(record).await;
                        }
                        Ok(())
                    });
                }
                tracing::info!(
                    "created all {} share finder tasks",
                    self.finder.counters().snapshot().submitted
                );
            }
        }

        let summary = self.drain_and_scan().await?;
        tracing::info!(
            "finished: {} shares discovered, {} scans run in {:.1}s",
            summary.shares_discovered,
            summary.scans_spawned,
            summary.elapsed.as_secs_f32(),
        );
        Ok(summary)
    }

    async fn drain_and_scan(&mut self) -> Result<RunSummary, SharecrawlerError> {
        let started = Instant::now();
        let policy = SharePolicy::new(self.options.scan_admin_shares);
        let mut dedup = DedupState::default();
        let mut shares_discovered = 0usize;
        let mut scans_spawned = 0usize;

        let finder_counters = self.finder.counters();
        let finder_change = self.finder.change();

        loop {
            while let Some(record) = self.queue.try_take().await {
                match policy.admit(&record, &mut dedup) {
                    Admission::Drop => continue,
                    verdict => {
                        let scan =
                            verdict == Admission::Scan && self.options.share_scan_enabled;
                        shares_discovered += 1;
                        self.events
                            .send(OutputEvent::ShareDiscovered {
                                record: record.clone(),
                                scanned: scan,
                            })
                            .map_err(|_| SharecrawlerError::SinkClosed)?;
                        if scan {
                            scans_spawned += 1;
                            tracing::debug!("creating share scanner task for {}", record.path);
                            let scanner = Arc::clone(&self.share_scanner);
                            let path = record.path.clone();
                            self.scanner
                                .submit(record.path, async move { scanner.scan(&path).await });
                        }
                    }
                }
            }

            // Both halves of the exit condition must hold at one observation
            // point. Once every finder is terminal no new records can arrive,
            // so "terminal + empty" really is the end of stage 1's output.
            if finder_counters.snapshot().all_terminal() && self.queue.is_empty().await {
                break;
            }

            tokio::select! {
                _ = finder_change.notified() => {}
                _ = self.queue.arrival().notified() => {}
            }
        }
        tracing::info!("all share finder tasks completed");

        self.finder.join().await;
        self.scanner.join().await;
        tracing::info!("all share scanner tasks finished");

        Ok(RunSummary {
            shares_discovered,
            scans_spawned,
            finder: self.finder.counters().snapshot(),
            scanner: self.scanner.counters().snapshot(),
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::{mpsc, Mutex};

    use crate::core::events::OutputReceiver;
    use crate::core::models::TargetHost;

    struct StaticTargets(Vec<&'static str>);

    #[async_trait]
    impl TargetEnumerator for StaticTargets {
        fn name(&self) -> &'static str {
            "static"
        }
        async fn enumerate(&self) -> Result<Vec<TargetHost>> {
            Ok(self.0.iter().map(|h| TargetHost::from(*h)).collect())
        }
    }

    struct FailingTargets;

    #[async_trait]
    impl TargetEnumerator for FailingTargets {
        fn name(&self) -> &'static str {
            "failing"
        }
        async fn enumerate(&self) -> Result<Vec<TargetHost>> {
            anyhow::bail!("directory service unreachable")
        }
    }

    /// Scripted discoverer: shares per host, an optional delay per host, and
    /// hosts that fail outright.
    #[derive(Default)]
    struct FakeDiscoverer {
        shares: HashMap<String, Vec<ShareRecord>>,
        delays: HashMap<String, Duration>,
        failing: Vec<String>,
    }

    impl FakeDiscoverer {
        fn with_shares(mut self, host: &str, shares: &[(&str, bool)]) -> Self {
            self.shares.insert(
                host.to_string(),
                shares
                    .iter()
                    .map(|(path, scan)| ShareRecord::new(*path, *scan))
                    .collect(),
            );
            self
        }

        fn with_delay(mut self, host: &str, delay: Duration) -> Self {
            self.delays.insert(host.to_string(), delay);
            self
        }

        fn with_failure(mut self, host: &str) -> Self {
            self.failing.push(host.to_string());
            self
        }
    }

    #[async_trait]
    impl ShareDiscoverer for FakeDiscoverer {
        fn name(&self) -> &'static str {
            "fake"
        }
        async fn discover(&self, host: &TargetHost) -> Result<Vec<ShareRecord>> {
            if let Some(delay) = self.delays.get(host.as_str()) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.iter().any(|h| h == host.as_str()) {
                anyhow::bail!("access denied on {host}");
            }
            Ok(self.shares.get(host.as_str()).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct RecordingScanner {
        scanned: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ShareScanner for RecordingScanner {
        fn name(&self) -> &'static str {
            "recording"
        }
        async fn scan(&self, share_path: &str) -> Result<()> {
            self.scanned.lock().await.push(share_path.to_string());
            Ok(())
        }
    }

    struct FailingScanner;

    #[async_trait]
    impl ShareScanner for FailingScanner {
        fn name(&self) -> &'static str {
            "failing"
        }
        async fn scan(&self, _share_path: &str) -> Result<()> {
            anyhow::bail!("tree walk blew up")
        }
    }

    fn options() -> RunOptions {
        RunOptions {
            max_threads: 4,
            share_finder_enabled: true,
            share_scan_enabled: true,
            scan_admin_shares: false,
            dir_target: None,
        }
    }

    fn drain_events(rx: &mut OutputReceiver) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn one_finder_task_per_host() {
        let discoverer = Arc::new(
            FakeDiscoverer::default()
                .with_shares("h1", &[("//h1/a", true)])
                .with_shares("h2", &[])
                .with_shares("h3", &[("//h3/b", true)]),
        );
        let scanner = Arc::new(RecordingScanner::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut orchestrator = Orchestrator::new(options(), discoverer, scanner, tx);

        let summary = orchestrator
            .run(&StaticTargets(vec!["h1", "h2", "h3"]))
            .await
            .unwrap();

        assert_eq!(summary.finder.submitted, 3);
        assert!(summary.finder.all_terminal());
        assert_eq!(summary.scans_spawned, 2);
        assert_eq!(drain_events(&mut rx).len(), 2);
    }

    #[tokio::test]
    async fn domain_controller_scenario() {
        // DC1 and DC2 both replicate sysvol/netlogon plus one unique share
        // each: 6 discovered events, but only 4 scans.
        let discoverer = Arc::new(
            FakeDiscoverer::default()
                .with_shares(
                    "DC1",
                    &[
                        ("//DC/sysvol", true),
                        ("//DC/netlogon", true),
                        ("//DC1/finance", true),
                    ],
                )
                .with_shares(
                    "DC2",
                    &[
                        ("//DC/sysvol", true),
                        ("//DC/netlogon", true),
                        ("//DC2/backups", true),
                    ],
                ),
        );
        let scanner = Arc::new(RecordingScanner::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut orchestrator =
            Orchestrator::new(options(), discoverer, scanner.clone(), tx);

        let summary = orchestrator
            .run(&StaticTargets(vec!["DC1", "DC2"]))
            .await
            .unwrap();

        assert_eq!(summary.shares_discovered, 6);
        assert_eq!(summary.scans_spawned, 4);
        assert_eq!(drain_events(&mut rx).len(), 6);

        let scanned = scanner.scanned.lock().await;
        assert_eq!(scanned.len(), 4);
        assert_eq!(
            scanned.iter().filter(|p| p.ends_with("sysvol")).count(),
            1
        );
        assert_eq!(
            scanned.iter().filter(|p| p.ends_with("netlogon")).count(),
            1
        );
    }

    #[tokio::test]
    async fn late_record_from_slow_finder_is_still_scanned() {
        let discoverer = Arc::new(
            FakeDiscoverer::default()
                .with_shares("fast1", &[("//fast1/a", true)])
                .with_shares("fast2", &[("//fast2/b", true)])
                .with_shares("slow", &[("//slow/late", true)])
                .with_delay("slow", Duration::from_millis(150)),
        );
        let scanner = Arc::new(RecordingScanner::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut orchestrator =
            Orchestrator::new(options(), discoverer, scanner.clone(), tx);

        let summary = orchestrator
            .run(&StaticTargets(vec!["fast1", "fast2", "slow"]))
            .await
            .unwrap();

        assert_eq!(summary.scans_spawned, 3);
        assert!(scanner
            .scanned
            .lock()
            .await
            .iter()
            .any(|p| p == "//slow/late"));
    }

    #[tokio::test]
    async fn admin_shares_reported_but_gated() {
        let discoverer = Arc::new(FakeDiscoverer::default().with_shares(
            "h1",
            &[("//h1/C$", true), ("//h1/public", true)],
        ));
        let scanner = Arc::new(RecordingScanner::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut orchestrator =
            Orchestrator::new(options(), discoverer, scanner.clone(), tx);

        let summary = orchestrator.run(&StaticTargets(vec!["h1"])).await.unwrap();

        assert_eq!(summary.shares_discovered, 2);
        assert_eq!(summary.scans_spawned, 1);
        let events = drain_events(&mut rx);
        assert!(events.iter().any(|event| {
            let OutputEvent::ShareDiscovered { record, scanned } = event;
            record.path == "//h1/C$" && !scanned
        }));
    }

    #[tokio::test]
    async fn admin_shares_scanned_when_opted_in() {
        let discoverer =
            Arc::new(FakeDiscoverer::default().with_shares("h1", &[("//h1/C$", true)]));
        let scanner = Arc::new(RecordingScanner::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut opts = options();
        opts.scan_admin_shares = true;
        let mut orchestrator = Orchestrator::new(opts, discoverer, scanner, tx);

        let summary = orchestrator.run(&StaticTargets(vec!["h1"])).await.unwrap();
        assert_eq!(summary.scans_spawned, 1);
    }

    #[tokio::test]
    async fn faulted_work_does_not_stop_the_run() {
        let discoverer = Arc::new(
            FakeDiscoverer::default()
                .with_shares("good", &[("//good/a", true), ("//good/b", true)])
                .with_failure("bad"),
        );
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut orchestrator =
            Orchestrator::new(options(), discoverer, Arc::new(FailingScanner), tx);

        let summary = orchestrator
            .run(&StaticTargets(vec!["good", "bad"]))
            .await
            .unwrap();

        assert_eq!(summary.finder.faulted, 1);
        assert_eq!(summary.finder.completed, 1);
        assert_eq!(summary.scanner.faulted, 2);
        assert!(summary.finder.all_terminal());
        assert!(summary.scanner.all_terminal());
    }

    #[tokio::test]
    async fn dir_target_skips_discovery() {
        let discoverer = Arc::new(FakeDiscoverer::default());
        let scanner = Arc::new(RecordingScanner::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut opts = options();
        opts.dir_target = Some("//nas1/exports".to_string());
        let mut orchestrator =
            Orchestrator::new(opts, discoverer, scanner.clone(), tx);

        // The enumerator would fail if consulted; dir-target mode must not
        // touch it.
        let summary = orchestrator.run(&FailingTargets).await.unwrap();

        assert_eq!(summary.finder.submitted, 0);
        assert_eq!(summary.shares_discovered, 1);
        assert_eq!(summary.scans_spawned, 1);
        assert_eq!(drain_events(&mut rx).len(), 1);
        let scanned = scanner.scanned.lock().await;
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0], "//nas1/exports");
    }

    #[tokio::test]
    async fn enumeration_failure_is_fatal() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut orchestrator = Orchestrator::new(
            options(),
            Arc::new(FakeDiscoverer::default()),
            Arc::new(RecordingScanner::default()),
            tx,
        );
        let err = orchestrator.run(&FailingTargets).await.unwrap_err();
        assert!(matches!(err, SharecrawlerError::TargetEnumeration(_)));
    }

    #[tokio::test]
    async fn zero_hosts_is_fatal() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut orchestrator = Orchestrator::new(
            options(),
            Arc::new(FakeDiscoverer::default()),
            Arc::new(RecordingScanner::default()),
            tx,
        );
        let err = orchestrator.run(&StaticTargets(vec![])).await.unwrap_err();
        assert!(matches!(err, SharecrawlerError::NoTargets));
    }

    #[tokio::test]
    async fn scan_disabled_still_reports_discoveries() {
        let discoverer = Arc::new(FakeDiscoverer::default().with_shares(
            "h1",
            &[("//h1/a", true), ("//h1/b", true)],
        ));
        let scanner = Arc::new(RecordingScanner::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut opts = options();
        opts.share_scan_enabled = false;
        let mut orchestrator =
            Orchestrator::new(opts, discoverer, scanner.clone(), tx);

        let summary = orchestrator.run(&StaticTargets(vec!["h1"])).await.unwrap();

        assert_eq!(summary.shares_discovered, 2);
        assert_eq!(summary.scans_spawned, 0);
        assert_eq!(drain_events(&mut rx).len(), 2);
        assert!(scanner.scanned.lock().await.is_empty());
    }

    #[tokio::test]
    async fn respects_the_concurrency_bound() {
        let mut shares = FakeDiscoverer::default();
        for i in 0..10 {
            let host = format!("h{i}");
            shares = shares
                .with_shares(&host, &[])
                .with_delay(&host, Duration::from_millis(20));
        }
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut opts = options();
        opts.max_threads = 2;
        let mut orchestrator = Orchestrator::new(
            opts,
            Arc::new(shares),
            Arc::new(RecordingScanner::default()),
            tx,
        );

        let hosts: Vec<&'static str> = vec![
            "h0", "h1", "h2", "h3", "h4", "h5", "h6", "h7", "h8", "h9",
        ];
        let summary = orchestrator.run(&StaticTargets(hosts)).await.unwrap();

        assert_eq!(summary.finder.submitted, 10);
        assert!(
            summary.finder.peak_running <= 2,
            "bound violated: peak {}",
            summary.finder.peak_running
        );
    }
}
