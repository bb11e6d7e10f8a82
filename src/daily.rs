//! Daily cleanup driver.
//!
//! Sequence: delete aged files, prune the directories that left empty, then
//! snapshot disk usage.

use crate::error::Result;
use crate::logger::Logger;
use crate::policy::{DEFAULT_MAX_AGE, EngineOptions, PolicyEngine};
use crate::run_result::RunResult;
use crate::scanner::ensure_exists;
use crate::system::{self, DiskUsage};
use chrono::{DateTime, Local};
use indicatif::ProgressBar;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Number of steps reported to a progress bar.
pub const DAILY_STEPS: u64 = 3;

/// Settings for [`run_daily_cleanup`].
#[derive(Debug, Clone)]
pub struct DailyOptions {
    pub max_age: Duration,
    /// Filesystem whose usage is reported.
    pub disk_path: PathBuf,
    pub engine: EngineOptions,
}

impl Default for DailyOptions {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            disk_path: PathBuf::from("/"),
            engine: EngineOptions::default(),
        }
    }
}

/// Everything the daily cleanup did.
#[derive(Debug, Clone)]
pub struct DailyReport {
    pub timestamp: DateTime<Local>,
    pub target: PathBuf,
    pub old_files: RunResult,
    pub empty_dirs: RunResult,
    /// `None` if disk usage could not be read; this does not fail the run.
    pub disk_usage: Option<DiskUsage>,
}

impl DailyReport {
    pub fn to_json(&self) -> Value {
        json!({
            "success": true,
            "timestamp": self.timestamp.to_rfc3339(),
            "target": self.target.to_string_lossy().to_string(),
            "operations": {
                "old_file_cleanup": self.old_files.to_json(),
                "empty_dir_cleanup": self.empty_dirs.to_json(),
                "disk_usage": self.disk_usage,
            },
        })
    }
}

/// Runs the daily cleanup against `target`.
///
/// # Errors
///
/// Fails with `NotFound` before doing anything if `target` is missing, and
/// propagates any operation-level failure of the individual steps.
pub fn run_daily_cleanup(
    target: &Path,
    options: &DailyOptions,
    logger: &dyn Logger,
    progress: Option<&ProgressBar>,
) -> Result<DailyReport> {
    logger.info(&format!("Daily cleanup started, target: {}", target.display()));
    if let Err(e) = ensure_exists(target) {
        logger.error(&format!("Target directory does not exist: {}", target.display()));
        return Err(e);
    }

    let engine = PolicyEngine::with_options(logger, options.engine.clone());
    let step = |message: &str| {
        if let Some(pb) = progress {
            pb.set_message(message.to_string());
        }
    };
    let done = || {
        if let Some(pb) = progress {
            pb.inc(1);
        }
    };

    logger.info("Starting old file cleanup...");
    step("Deleting old files");
    let old_files = engine.cleanup_old_files(target, options.max_age)?;
    done();

    logger.info("Starting empty directory cleanup...");
    step("Removing empty directories");
    let empty_dirs = engine.cleanup_empty_dirs(target, true)?;
    done();

    logger.info("Checking system health...");
    step("Checking disk usage");
    let disk_usage = system::check_disk_usage(&options.disk_path, logger);
    done();

    if let Some(pb) = progress {
        pb.finish_with_message("Daily cleanup complete");
    }
    logger.info("Daily cleanup completed successfully");

    Ok(DailyReport {
        timestamp: Local::now(),
        target: target.to_path_buf(),
        old_files,
        empty_dirs,
        disk_usage,
    })
}
