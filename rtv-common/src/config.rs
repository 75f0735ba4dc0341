//! Configuration loading and resolution
//!
//! Values resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file (`<config dir>/rtv/config.toml`)
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Default probability cutoff below which a child is excluded from
/// merge-survivor counting and query results
pub const DEFAULT_CUTOFF: f64 = 0.09;

/// Default sentinel end-of-text value, always included in query results
/// regardless of probability
pub const DEFAULT_SENTINEL: &str = "<|endoftext|>";

/// How the load pipeline hands the tree to the rendering layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Flatten into the id-indexed store and serve children on demand
    #[default]
    Lazy,
    /// Merge and propagate the whole tree up front, hand it over at once
    Eager,
}

impl FromStr for ProcessingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lazy" => Ok(Self::Lazy),
            "eager" => Ok(Self::Eager),
            other => Err(Error::Config(format!("unknown processing mode: {other}"))),
        }
    }
}

/// Tree engine configuration
///
/// The cutoff feeds both chain merging and query filtering; a store derived
/// under one cutoff is invalid under another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Probability cutoff for merge-survivor counting and query results
    pub cutoff: f64,
    /// End-marker value exempt from the cutoff in query results
    pub sentinel: String,
    /// Lazy (flattened store + queries) or eager (whole tree up front)
    pub mode: ProcessingMode,
    /// Payload cache database location
    pub cache_db: PathBuf,
}

/// Partial configuration as read from the TOML file
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    cutoff: Option<f64>,
    sentinel: Option<String>,
    mode: Option<String>,
    cache_db: Option<PathBuf>,
}

impl TreeConfig {
    /// Resolve configuration from CLI overrides, environment, config file,
    /// and defaults, in that order
    pub fn resolve(
        cli_cutoff: Option<f64>,
        cli_sentinel: Option<String>,
        cli_mode: Option<ProcessingMode>,
        cli_cache_db: Option<PathBuf>,
    ) -> Result<Self> {
        let file = read_config_file();

        let cutoff = cli_cutoff
            .or_else(|| env_parsed("RTV_CUTOFF"))
            .or(file.cutoff)
            .unwrap_or(DEFAULT_CUTOFF);
        if !(0.0..1.0).contains(&cutoff) {
            return Err(Error::Config(format!(
                "cutoff must be in [0, 1), got {cutoff}"
            )));
        }

        let sentinel = cli_sentinel
            .or_else(|| std::env::var("RTV_SENTINEL").ok())
            .or(file.sentinel)
            .unwrap_or_else(|| DEFAULT_SENTINEL.to_string());

        let mode = match cli_mode
            .map(Ok)
            .or_else(|| std::env::var("RTV_MODE").ok().map(|v| v.parse()))
            .or_else(|| file.mode.as_deref().map(|v| v.parse()))
        {
            Some(result) => result?,
            None => ProcessingMode::default(),
        };

        let cache_db = cli_cache_db
            .or_else(|| std::env::var("RTV_CACHE_DB").ok().map(PathBuf::from))
            .or(file.cache_db)
            .unwrap_or_else(default_cache_db);

        Ok(Self {
            cutoff,
            sentinel,
            mode,
            cache_db,
        })
    }
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Read the config file if present; a malformed file is ignored with a
/// warning rather than aborting startup
fn read_config_file() -> ConfigFile {
    let Some(path) = dirs::config_dir().map(|d| d.join("rtv").join("config.toml")) else {
        return ConfigFile::default();
    };
    let Ok(content) = std::fs::read_to_string(&path) else {
        return ConfigFile::default();
    };
    match toml::from_str(&content) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("ignoring malformed config file {}: {e}", path.display());
            ConfigFile::default()
        }
    }
}

/// OS-dependent default cache database path
fn default_cache_db() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("rtv"))
        .unwrap_or_else(|| PathBuf::from("./rtv_data"))
        .join("payload_cache.db")
}
