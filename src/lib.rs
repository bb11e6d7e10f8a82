//! housekeep - filesystem housekeeping for Linux hosts
//!
//! This library walks directory trees and applies one policy per run:
//! organizing files by extension, pruning empty directories, deleting aged
//! files, changing permissions, or finding large files. Per-entry failures are
//! collected in a [`RunResult`] instead of aborting the run. Around that engine
//! sit the daily cleanup driver, disk and host checks, TOML configuration and
//! logging setup used by the `housekeep` binary.

pub mod cli;
pub mod config;
pub mod daily;
pub mod error;
pub mod logger;
pub mod output;
pub mod policy;
pub mod report;
pub mod run_result;
pub mod scanner;
pub mod system;

pub use cli::{Cli, Command, run_cli};
pub use config::{CompiledFilters, ConfigError, HousekeepConfig};
pub use daily::{DailyOptions, DailyReport, run_daily_cleanup};
pub use error::{HousekeepError, Result};
pub use logger::{CapturingLogger, Logger, TracingLogger};
pub use policy::{EngineOptions, LargeFile, Policy, PolicyEngine, PolicyOutcome};
pub use run_result::{Counter, EntryFailure, EntryOutcome, RunResult};
pub use scanner::{Entry, EntryKind, TreeScanner};
