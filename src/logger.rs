//! Logging capability handed to the engine, plus subscriber setup for the binary.
//!
//! The engine never talks to a global logger. It receives a `&dyn Logger`,
//! which the binary backs with [`TracingLogger`] and tests back with
//! [`CapturingLogger`].

use chrono::Local;
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Sink for leveled log messages.
pub trait Logger {
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

/// Forwards messages to `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "housekeep", "{message}"),
            Level::WARN => tracing::warn!(target: "housekeep", "{message}"),
            Level::INFO => tracing::info!(target: "housekeep", "{message}"),
            Level::DEBUG => tracing::debug!(target: "housekeep", "{message}"),
            _ => tracing::trace!(target: "housekeep", "{message}"),
        }
    }
}

/// Records every message in memory.
#[derive(Debug, Default)]
pub struct CapturingLogger {
    records: RefCell<Vec<(Level, String)>>,
}

impl CapturingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.borrow().clone()
    }

    /// Messages logged at exactly `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Logger for CapturingLogger {
    fn log(&self, level: Level, message: &str) {
        self.records.borrow_mut().push((level, message.to_string()));
    }
}

/// How chatty the console should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    fn console_level(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::WARN,
            Verbosity::Normal => LevelFilter::INFO,
            Verbosity::Verbose => LevelFilter::DEBUG,
        }
    }
}

/// Settings for [`init_logging`].
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    pub verbosity: Verbosity,
    /// Directory for the daily log file; `None` disables the file sink.
    pub log_dir: Option<PathBuf>,
}

/// Path of today's log file inside `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("housekeep_{}.log", Local::now().format("%Y%m%d")))
}

/// Installs the global `tracing` subscriber: console on stderr, plus a
/// DEBUG-level file sink when a log directory is configured.
///
/// If the log file cannot be opened the console sink is still installed and
/// the returned string describes why the file sink is missing.
pub fn init_logging(settings: &LogSettings) -> Option<String> {
    let console_filter = EnvFilter::builder()
        .with_default_directive(settings.verbosity.console_level().into())
        .from_env_lossy();

    let mut file_warning = None;
    let file_layer = settings.log_dir.as_deref().and_then(|dir| {
        let opened = fs::create_dir_all(dir).and_then(|()| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file_path(dir))
        });
        match opened {
            Ok(file) => Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::DEBUG),
            ),
            Err(e) => {
                file_warning = Some(format!(
                    "File logging disabled, cannot open log in {}: {}",
                    dir.display(),
                    e
                ));
                None
            }
        }
    });

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .try_init();

    if installed.is_err() {
        return Some("A global logger was already installed".to_string());
    }
    if let Some(warning) = &file_warning {
        tracing::warn!(target: "housekeep", "{warning}");
    }
    file_warning
}
