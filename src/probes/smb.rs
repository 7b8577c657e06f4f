use anyhow::{Context, Result};
use async_trait::async_trait;

use super::command;
use super::types::{ShareDiscoverer, ShareScanner};
use crate::core::models::{ShareRecord, TargetHost};

/// Share discovery via an external listing command, `smbclient -N -g -L
/// {host}` by default. The `-g` (grepable) output is one `type|name|comment`
/// line per share; only `Disk` shares are worth walking.
pub struct CommandDiscoverer {
    command: String,
    timeout_ms: u64,
}

impl CommandDiscoverer {
    pub fn new(command: String, timeout_ms: u64) -> Self {
        CommandDiscoverer {
            command,
            timeout_ms,
        }
    }
}

#[async_trait]
impl ShareDiscoverer for CommandDiscoverer {
    fn name(&self) -> &'static str {
        "command discoverer"
    }

    async fn discover(&self, host: &TargetHost) -> Result<Vec<ShareRecord>> {
        let rendered = self.command.replace("{host}", host.as_str());
        let argv = shell_words::split(&rendered)
            .with_context(|| format!("bad discovery command: {rendered}"))?;
        let (tool, args) = argv
            .split_first()
            .context("discovery command is empty")?;

        let result = command::execute(tool, args, self.timeout_ms).await?;
        let records = parse_share_listing(host.as_str(), &result.stdout);
        tracing::debug!("{host}: {} shares listed", records.len());
        Ok(records)
    }
}

/// Parse grepable share-listing output into records. Lines that are not
/// `type|name|comment` triples (headers, warnings) are ignored.
pub fn parse_share_listing(host: &str, stdout: &str) -> Vec<ShareRecord> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(3, '|');
            let kind = fields.next()?;
            let name = fields.next()?;
            fields.next()?;
            if kind != "Disk" || name.is_empty() {
                return None;
            }
            Some(ShareRecord::new(format!("//{host}/{name}"), true))
        })
        .collect()
}

/// Share scanning via an external command per share, an `smbclient`
/// recursive listing by default. Only success or failure comes back; the
/// command's own output is the scan result and goes wherever the command
/// sends it.
pub struct CommandScanner {
    command: String,
    timeout_ms: u64,
}

impl CommandScanner {
    pub fn new(command: String, timeout_ms: u64) -> Self {
        CommandScanner {
            command,
            timeout_ms,
        }
    }
}

#[async_trait]
impl ShareScanner for CommandScanner {
    fn name(&self) -> &'static str {
        "command scanner"
    }

    async fn scan(&self, share_path: &str) -> Result<()> {
        let rendered = self.command.replace("{share}", share_path);
        let argv = shell_words::split(&rendered)
            .with_context(|| format!("bad scan command: {rendered}"))?;
        let (tool, args) = argv.split_first().context("scan command is empty")?;

        let result = command::execute(tool, args, self.timeout_ms).await?;
        tracing::debug!(
            "scanned {share_path} in {}ms",
            result.duration_ms
        );
        Ok(())
    }
}
