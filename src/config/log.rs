//! Tracing setup; stdout belongs to the terminal UI, so events go to a file

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// The logging level. Defaults to info
    #[serde(default)]
    pub level: Level,
    /// Log file; defaults to `contract-spy.log` in the data dir
    #[serde(default)]
    pub file: Option<String>,
}

/// Logging level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Off,
    Error,
    Warn,
    Debug,
    Trace,
    #[default]
    #[serde(other)]
    Info,
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> LevelFilter {
        match level {
            Level::Off => LevelFilter::OFF,
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
            Level::Info => LevelFilter::INFO,
        }
    }
}

/// Install the global subscriber writing to `path`
pub fn init(level: Level, path: &Path) -> Result<()> {
    if level == Level::Off {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log dir {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(level))
        .with_writer(Mutex::new(file))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("install tracing subscriber: {}", err))
}
