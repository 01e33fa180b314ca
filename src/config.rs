use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::payload::FREE_TIER_ID;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub free_tier_id: String,
    /// Playlist entries resolved at once when following references.
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://beacon.tv".to_string(),
            user_agent: concat!("beacon-extract/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: 15_000,
            free_tier_id: FREE_TIER_ID.to_string(),
            concurrency: 4,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file, then `BEACON_*` environment overrides.
    /// An explicit `path` must exist; the default location may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        cfg.apply_overrides(|k| std::env::var(k).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Self = toml::from_str(&text)
            .with_context(|| format!("parsing config: {}", path.display()))?;
        debug!(path = %path.display(), "loaded config file");
        Ok(cfg)
    }

    /// Unparseable numeric overrides are ignored.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("BEACON_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.base_url = v.trim().to_string();
        }
        if let Some(v) = var("BEACON_USER_AGENT").filter(|v| !v.trim().is_empty()) {
            self.user_agent = v;
        }
        if let Some(v) = var("BEACON_TIMEOUT_MS").and_then(|s| s.trim().parse().ok()) {
            self.timeout_ms = v;
        }
        if let Some(v) = var("BEACON_CONCURRENCY").and_then(|s| s.trim().parse().ok()) {
            self.concurrency = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.timeout_ms == 0 {
            bail!("timeout_ms must be at least 1");
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).with_context(|| format!("invalid base_url: {}", self.base_url))
    }
}

/// `config.toml` in the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("tv", "beacon", "beacon-extract").map(|d| d.config_dir().join("config.toml"))
}
