//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes to a size-rotated log file and
//! keeps the latest lines in memory (crash reports attach them). Records from
//! the `log` crate are bridged into the same subscriber.
//!
//! On Android every event is mirrored to logcat.

mod writer;

#[cfg(target_os = "android")]
mod logcat;

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use writer::{RollingConfig, RollingWriter};

static LOGGER: OnceLock<RollingWriter> = OnceLock::new();

/// Local wall-clock timestamps with millisecond precision
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Initialize the global logger with default rotation limits
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), String> {
    init_logger_with(log_dir, app_name, RollingConfig::default())
}

/// Initialize the global logger
///
/// Calling this twice is a no-op; the first configuration wins.
pub fn init_logger_with(log_dir: PathBuf, app_name: &str, config: RollingConfig) -> Result<(), String> {
    if LOGGER.get().is_some() {
        return Ok(());
    }

    let writer = RollingWriter::open(&log_dir, app_name, config)?;

    let level = if cfg!(debug_assertions) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer.clone())
        .with_ansi(false)
        .with_timer(LocalTime)
        .with_target(true);

    let registry = tracing_subscriber::registry().with(level).with(file_layer);

    #[cfg(target_os = "android")]
    let registry = registry.with(logcat::LogcatLayer::new(app_name));

    registry
        .try_init()
        .map_err(|e| format!("Failed to install log subscriber: {}", e))?;

    let _ = LOGGER.set(writer);
    tracing::info!(target: "rolling_logger", "Logger initialized in {}", log_dir.display());
    Ok(())
}

fn ensure_initialized() -> Result<(), String> {
    if LOGGER.get().is_some() {
        Ok(())
    } else {
        Err("Logger not initialized".to_string())
    }
}

pub fn info(message: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn warn(message: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::warn!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::error!("{}", message);
    Ok(())
}

/// Most recent log lines, oldest first (empty before initialization)
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(|w| w.recent_lines()).unwrap_or_default()
}

/// Path of the active log file, if the logger is running
pub fn current_log_file() -> Option<PathBuf> {
    LOGGER.get().map(|w| w.current_path())
}
