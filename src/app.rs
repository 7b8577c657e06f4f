use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::{
    cli::args::Cli,
    config::ConfigLoader,
    core::{
        orchestrator::{Orchestrator, RunOptions},
        status::StatusReporter,
    },
    output::reporter,
    probes::{
        smb::{CommandDiscoverer, CommandScanner},
        targets::{FileTargets, StaticTargets},
        toolchain,
        types::{ShareDiscoverer, ShareScanner, TargetEnumerator},
    },
    ui::printer,
    utils::logging,
};

pub async fn run(cli: Cli) -> Result<()> {
    let level = logging::level_from_cli(&cli);
    logging::init(level)?;

    let config = ConfigLoader::load(cli.config.as_deref())?;

    let max_threads = cli.max_threads.unwrap_or(config.concurrency.max_threads);
    anyhow::ensure!(max_threads > 0, "max threads must be greater than 0");

    let options = RunOptions {
        max_threads,
        share_finder_enabled: config.discovery.enabled && !cli.no_discovery,
        share_scan_enabled: config.scan.enabled && !cli.no_scan,
        scan_admin_shares: cli.scan_admin_shares || config.scan.scan_admin_shares,
        dir_target: cli.dir_target.clone(),
    };
    tracing::info!(
        "starting sharecrawler: {} threads per stage, discovery {}, scanning {}",
        options.max_threads,
        if options.share_finder_enabled { "on" } else { "off" },
        if options.share_scan_enabled { "on" } else { "off" },
    );

    // Fail up front if a probe command's program is missing, rather than
    // faulting every task later.
    let mut probe_commands: Vec<&str> = Vec::new();
    if options.dir_target.is_none() && options.share_finder_enabled {
        probe_commands.push(&config.discovery.command);
    }
    if options.share_scan_enabled {
        probe_commands.push(&config.scan.command);
    }
    toolchain::verify_or_bail(&probe_commands)?;

    let events_file = cli.output.clone().or_else(|| config.output.events_file.clone());
    let (events_tx, reporter_handle) = reporter::spawn(events_file);

    let discoverer = Arc::new(CommandDiscoverer::new(
        config.discovery.command.clone(),
        config.discovery.timeout_ms,
    ));
    let scanner = Arc::new(CommandScanner::new(
        config.scan.command.clone(),
        config.scan.timeout_ms,
    ));
    tracing::debug!("probes: {} / {}", discoverer.name(), scanner.name());

    let mut orchestrator = Orchestrator::new(options, discoverer, scanner, events_tx.clone());

    // Ctrl-C stops new work; already-discovered shares still drain.
    let (finder_cancel, scanner_cancel) = orchestrator.cancel_handles();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping new work");
            finder_cancel.cancel();
            scanner_cancel.cancel();
        }
    });

    let status = StatusReporter::spawn(
        orchestrator.finder_counters(),
        orchestrator.scanner_counters(),
        Duration::from_secs(config.concurrency.status_interval_secs),
    );

    let enumerator: Box<dyn TargetEnumerator> = match cli.targets_file.clone() {
        Some(path) => Box::new(FileTargets::new(path)),
        None => Box::new(StaticTargets::new(cli.targets.clone())),
    };

    let result = orchestrator.run(enumerator.as_ref()).await;

    // Flush the sink before reporting the outcome, on the fatal path too.
    status.abort();
    drop(orchestrator);
    drop(events_tx);
    let _ = reporter_handle.await;

    let summary = result?;
    printer::print_summary(&summary);
    Ok(())
}
