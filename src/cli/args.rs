use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sharecrawler",
    version,
    about = "Discover network file shares and feed them to a content scanner"
)]
pub struct Cli {
    /// Target host to probe (repeatable)
    #[arg(short = 't', long = "target")]
    pub targets: Vec<String>,

    /// File with one target host per line (# comments allowed)
    #[arg(short = 'f', long = "targets-file", conflicts_with = "targets")]
    pub targets_file: Option<PathBuf>,

    /// Scan this one share/directory path directly, skipping discovery
    #[arg(short = 'i', long = "dir-target")]
    pub dir_target: Option<String>,

    /// Max concurrent tasks per pipeline stage
    #[arg(short = 'j', long = "max-threads")]
    pub max_threads: Option<usize>,

    /// Also scan administrative (C$) shares
    #[arg(long = "scan-admin-shares", action = ArgAction::SetTrue)]
    pub scan_admin_shares: bool,

    /// Discover and report shares but do not scan them
    #[arg(long = "no-scan", action = ArgAction::SetTrue)]
    pub no_scan: bool,

    /// Skip share discovery entirely
    #[arg(long = "no-discovery", action = ArgAction::SetTrue)]
    pub no_discovery: bool,

    /// Append one JSON line per discovered share to this file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file path
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Verbose human output
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Debug logs (implies verbose)
    #[arg(short = 'd', long = "debug", action = ArgAction::SetTrue)]
    pub debug: bool,
}
