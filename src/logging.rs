//! Run-scoped log output: stderr plus an append-only log file.
//!
//! The subscriber is installed with [`tracing::subscriber::set_default`], so it
//! lives exactly as long as the returned guard. Components only emit `tracing`
//! events and never hold a logger of their own.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::data::IngestError;

/// Install console and file logging for the current run.
///
/// `filter` is an `EnvFilter` directive such as `info` or `covidproject=debug`;
/// an invalid directive falls back to `info`.
pub fn init(log_path: &Path, filter: &str) -> Result<DefaultGuard, IngestError> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| IngestError::io(parent.display().to_string(), e))?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| IngestError::io(log_path.display().to_string(), e))?;

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let logfile = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(logfile);
    Ok(tracing::subscriber::set_default(subscriber))
}
