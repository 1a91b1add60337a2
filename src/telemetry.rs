use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "codetype.log";
pub const LOG_ENV: &str = "CODETYPE_LOG";

/// Route tracing output to a file; the terminal belongs to the UI.
///
/// The returned guard must live until exit so buffered lines get written.
pub fn init(log_dir: &Path, default_filter: &str) -> Result<Option<WorkerGuard>> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = fs::remove_file(&log_path);
    }

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        // A subscriber is already installed (tests, embedding); keep using it.
        Err(_) => Ok(None),
    }
}
