use colored::Colorize;

use crate::core::models::RunSummary;

pub fn print_summary(summary: &RunSummary) {
    println!("\n{}", "═══════════════════════════════════════".green().bold());
    println!("{}", "sharecrawler run complete".green().bold());
    println!("{}", "═══════════════════════════════════════".green().bold());

    println!("\n{}", "Results:".yellow().bold());
    println!(
        "  Shares discovered: {}",
        summary.shares_discovered.to_string().green().bold()
    );
    println!(
        "  Scans launched: {}",
        summary.scans_spawned.to_string().green().bold()
    );

    println!("\n{}", "Execution:".yellow().bold());
    println!(
        "  Finder tasks: {}/{}",
        summary.finder.completed.to_string().green().bold(),
        summary.finder.submitted
    );
    println!(
        "  Scanner tasks: {}/{}",
        summary.scanner.completed.to_string().green().bold(),
        summary.scanner.submitted
    );
    println!(
        "  Peak concurrency: {} finder / {} scanner",
        summary.finder.peak_running, summary.scanner.peak_running
    );

    let faulted = summary.finder.faulted + summary.scanner.faulted;
    if faulted > 0 {
        println!("  Faulted: {}", faulted.to_string().red().bold());
    }
    let cancelled = summary.finder.cancelled + summary.scanner.cancelled;
    if cancelled > 0 {
        println!("  Cancelled: {}", cancelled.to_string().red());
    }

    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f32());
}
