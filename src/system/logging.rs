//! Logging system initialization
//!
//! Sets up the global tracing subscriber from [`LoggingConfig`]: console or
//! file output, optional daily rotation, text or JSON lines.

use std::io::Write;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::LoggingConfig;
use crate::errors::{IscogramError, Result};

const DEFAULT_LOG_FILE: &str = "iscogram.log";

type BoxedWriter = Box<dyn Write + Send + Sync>;

/// Initialize logging system based on configuration
///
/// Must be called once, after the configuration has been loaded. The
/// returned `WorkerGuard` has to stay alive for the lifetime of the
/// program so buffered log lines are flushed on exit.
///
/// `RUST_LOG`, when set, overrides `config.level`.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let writer = build_writer(config)?;
    let to_console = config.file.as_deref().is_none_or(str::is_empty);

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_target(true)
        .with_ansi(to_console);

    let installed = if config.format == "json" {
        subscriber_builder.json().try_init()
    } else {
        subscriber_builder.try_init()
    };
    installed.map_err(|e| {
        IscogramError::config(format!("Failed to install tracing subscriber: {}", e))
    })?;

    Ok(guard)
}

fn build_writer(config: &LoggingConfig) -> Result<BoxedWriter> {
    let Some(log_file) = config.file.as_deref().filter(|f| !f.is_empty()) else {
        return Ok(Box::new(std::io::stdout()));
    };

    if config.enable_rotation {
        let path = Path::new(log_file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let filename = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(DEFAULT_LOG_FILE);
        let appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(filename.trim_end_matches(".log"))
            .filename_suffix("log")
            .max_log_files(config.max_backups.max(1) as usize)
            .build(dir)
            .map_err(|e| {
                IscogramError::file_operation(format!(
                    "Failed to create rolling log appender in {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        Ok(Box::new(appender))
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        Ok(Box::new(file))
    }
}
