//! Tracing setup.
//!
//! Subcommands log to stderr. The TUI owns the terminal, so there logs go to a file
//! (an explicit `--log-file`, else the platform cache dir) or nowhere.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "memory-restore.log";

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `-v`.
fn filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("memory_restore={level}")))
}

pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("memory-restore").join(LOG_FILE_NAME))
}

/// Install the global subscriber. Returns the log file path when logging to a file.
pub fn init(verbose: bool, log_file: Option<&Path>, tui_mode: bool) -> Result<Option<PathBuf>> {
    let path = match log_file {
        Some(p) => Some(p.to_path_buf()),
        None if tui_mode => default_log_path(),
        None => None,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter(verbose));

    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))?;
            Ok(Some(path))
        }
        // Nowhere to write without corrupting the TUI.
        None if tui_mode => Ok(None),
        None => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))?;
            Ok(None)
        }
    }
}
