use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::StoreOptions;
use crate::stats::MAX_LOOKBACK_DAYS;

fn default_stale_after_secs() -> u64 {
    300
}
fn default_read_retries() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    1000
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_busy_timeout_ms() -> u64 {
    250
}
fn default_lookback_days() -> u32 {
    30
}
fn default_tick_rate_ms() -> u64 {
    500
}
fn default_date_strip_days() -> u32 {
    13
}
fn default_log_amount() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
            read_retries: default_read_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn options(&self) -> StoreOptions {
        StoreOptions {
            stale_after: Duration::from_secs(self.stale_after_secs),
            read_retries: self.read_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Days (today included) that streaks and counters look back over
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
    /// Number of past days (today included) offered in the date strip
    #[serde(default = "default_date_strip_days")]
    pub date_strip_days: u32,
    /// Amount logged by one press of Enter
    #[serde(default = "default_log_amount")]
    pub log_amount: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate_ms(),
            date_strip_days: default_date_strip_days(),
            log_amount: default_log_amount(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "habitlog")
            .context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("habitlog.db"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).context("Parsing config.toml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.stats.lookback_days) {
            anyhow::bail!("stats.lookback_days must be between 1 and {}", MAX_LOOKBACK_DAYS);
        }
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.dashboard.date_strip_days) {
            anyhow::bail!(
                "dashboard.date_strip_days must be between 1 and {}",
                MAX_LOOKBACK_DAYS
            );
        }
        if !self.dashboard.log_amount.is_finite() || self.dashboard.log_amount <= 0.0 {
            anyhow::bail!("dashboard.log_amount must be a positive number");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.stats.lookback_days, 30);
        assert_eq!(config.store.options(), StoreOptions::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nread_retries = 0\n\n[dashboard]\nlog_amount = 0.25\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.store.read_retries, 0);
        assert_eq!(config.store.stale_after_secs, 300);
        assert_eq!(config.dashboard.log_amount, 0.25);
        assert_eq!(config.dashboard.date_strip_days, 13);
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.stats.lookback_days = 14;
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().stats.lookback_days, 14);
    }

    #[test]
    fn rejects_zero_lookback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[stats]\nlookback_days = 0\n").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn rejects_lookback_beyond_the_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[stats]\nlookback_days = 4000000000\n").unwrap();
        assert!(AppConfig::load_from(&path).is_err());

        std::fs::write(&path, "[dashboard]\ndate_strip_days = 100000\n").unwrap();
        assert!(AppConfig::load_from(&path).is_err());

        std::fs::write(&path, "[stats]\nlookback_days = 3650\n").unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().stats.lookback_days, 3650);
    }
}
