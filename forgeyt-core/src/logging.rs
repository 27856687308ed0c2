//! File logging for the interactive binary.
//!
//! Prompts and downloader output own the terminal, so log lines only ever go
//! to a daily-rolling file. `RUST_LOG` directives are layered on top of the
//! configured level.

use std::io;
use std::path::PathBuf;

use directories::ProjectDirs;
use once_cell::sync::Lazy;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogLevel, LogSettings};

pub const LOG_FILE_PREFIX: &str = "forgeyt.log";

static DEFAULT_LOG_DIR: Lazy<PathBuf> = Lazy::new(|| {
    ProjectDirs::from("net", "squawksquad", "forgeyt")
        .map(|dirs| dirs.data_local_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
});

/// Holds the file writer open; dropping it flushes buffered lines.
pub struct LogManager {
    _guard: WorkerGuard,
    level: Level,
    log_dir: PathBuf,
}

impl LogManager {
    /// Installs the global subscriber, or does nothing when logging is off.
    pub fn init(settings: &LogSettings) -> io::Result<Option<Self>> {
        if !settings.enabled {
            return Ok(None);
        }

        let level = level_from_config(&settings.level);
        let log_dir = log_dir_for(settings);
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env().add_directive(level.into()))
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .try_init()
            .map_err(|error| io::Error::new(io::ErrorKind::AlreadyExists, error))?;

        Ok(Some(Self {
            _guard: guard,
            level,
            log_dir,
        }))
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn log_dir(&self) -> &PathBuf {
        &self.log_dir
    }
}

fn log_dir_for(settings: &LogSettings) -> PathBuf {
    settings
        .directory
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_DIR.clone())
}

fn level_from_config(level: &LogLevel) -> Level {
    match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
    }
}
