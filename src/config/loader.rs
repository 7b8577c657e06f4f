use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::types::GlobalConfig;

const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./sharecrawler.toml",
    "./config/sharecrawler.toml",
    "~/.config/sharecrawler/sharecrawler.toml",
    "/etc/sharecrawler/sharecrawler.toml",
];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration, trying an explicit path first, then the default
    /// locations, then built-in defaults.
    pub fn load(custom_path: Option<&Path>) -> Result<GlobalConfig> {
        if let Some(path) = custom_path {
            return Self::load_from_file(path)
                .with_context(|| format!("failed to load config from {path:?}"));
        }

        for default_path in DEFAULT_CONFIG_PATHS {
            let path = Self::expand_path(default_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => {
                        tracing::info!("loaded configuration from {:?}", path);
                        return Ok(config);
                    }
                    Err(err) => {
                        tracing::warn!("failed to load config from {:?}: {:#}", path, err);
                        continue;
                    }
                }
            }
        }

        tracing::debug!("no configuration file found, using defaults");
        Ok(GlobalConfig::default())
    }

    fn load_from_file(path: &Path) -> Result<GlobalConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path:?}"))?;

        let config: GlobalConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse TOML config {path:?}"))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &GlobalConfig) -> Result<()> {
        if config.concurrency.max_threads == 0 {
            anyhow::bail!("max_threads must be greater than 0");
        }
        if config.concurrency.status_interval_secs == 0 {
            anyhow::bail!("status_interval_secs must be greater than 0");
        }
        if config.discovery.command.trim().is_empty() {
            anyhow::bail!("discovery command cannot be empty");
        }
        if !config.discovery.command.contains("{host}") {
            anyhow::bail!("discovery command must contain the {{host}} placeholder");
        }
        if config.discovery.timeout_ms == 0 {
            anyhow::bail!("discovery timeout_ms must be greater than 0");
        }
        if config.scan.command.trim().is_empty() {
            anyhow::bail!("scan command cannot be empty");
        }
        if !config.scan.command.contains("{share}") {
            anyhow::bail!("scan command must contain the {{share}} placeholder");
        }
        if config.scan.timeout_ms == 0 {
            anyhow::bail!("scan timeout_ms must be greater than 0");
        }
        Ok(())
    }

    fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(path)
    }
}
