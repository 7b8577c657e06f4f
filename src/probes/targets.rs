use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::types::TargetEnumerator;
use crate::core::models::TargetHost;

/// Hosts given directly on the command line.
pub struct StaticTargets {
    hosts: Vec<TargetHost>,
}

impl StaticTargets {
    pub fn new(hosts: Vec<String>) -> Self {
        StaticTargets {
            hosts: hosts.into_iter().map(TargetHost::new).collect(),
        }
    }
}

#[async_trait]
impl TargetEnumerator for StaticTargets {
    fn name(&self) -> &'static str {
        "command line"
    }

    async fn enumerate(&self) -> Result<Vec<TargetHost>> {
        Ok(self.hosts.clone())
    }
}

/// Hosts read from a file, one per line. Blank lines and `#` comments are
/// skipped.
pub struct FileTargets {
    path: PathBuf,
}

impl FileTargets {
    pub fn new(path: PathBuf) -> Self {
        FileTargets { path }
    }
}

#[async_trait]
impl TargetEnumerator for FileTargets {
    fn name(&self) -> &'static str {
        "targets file"
    }

    async fn enumerate(&self) -> Result<Vec<TargetHost>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read targets file {:?}", self.path))?;
        Ok(parse_target_lines(&content))
    }
}

fn parse_target_lines(content: &str) -> Vec<TargetHost> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(TargetHost::from)
        .collect()
}
