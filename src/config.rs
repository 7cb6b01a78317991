//! Optional drift.toml configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings loadable from `drift.toml` in the working directory. CLI flags
/// take precedence over config values; config values over built-in
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub output_dir: Option<PathBuf>,
    pub style: Option<String>,
    pub max_requests_per_hour: Option<u32>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("drift.toml"))
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}
