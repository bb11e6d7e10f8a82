//! Outcome accounting for a single policy run.

use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The success counter a policy reports under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Organized,
    Removed,
    Deleted,
    Changed,
}

impl Counter {
    /// Stable counter name used in reports and JSON output.
    pub fn name(self) -> &'static str {
        match self {
            Counter::Organized => "organized",
            Counter::Removed => "removed",
            Counter::Deleted => "deleted",
            Counter::Changed => "changed",
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The mutation completed; carries a human-readable detail line.
    Success(String),
    /// The mutation failed; carries the reason.
    Failure(String),
}

/// A per-entry failure recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Counters, detail lines and failures accumulated by one policy run.
///
/// Only the engine records outcomes. `errors()` is always the length of
/// `failures()`, and an entry lands in exactly one of the two lists.
#[derive(Debug, Clone)]
pub struct RunResult {
    counter: Counter,
    succeeded: usize,
    details: Vec<String>,
    failures: Vec<EntryFailure>,
    dry_run: bool,
}

impl RunResult {
    pub(crate) fn new(counter: Counter, dry_run: bool) -> Self {
        Self {
            counter,
            succeeded: 0,
            details: Vec::new(),
            failures: Vec::new(),
            dry_run,
        }
    }

    pub(crate) fn record(&mut self, path: &Path, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Success(detail) => {
                self.succeeded += 1;
                self.details.push(detail);
            }
            EntryOutcome::Failure(message) => self.failures.push(EntryFailure {
                path: path.to_path_buf(),
                message,
            }),
        }
    }

    pub fn counter(&self) -> Counter {
        self.counter
    }

    /// Number of entries whose mutation completed.
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn errors(&self) -> usize {
        self.failures.len()
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    pub fn failures(&self) -> &[EntryFailure] {
        &self.failures
    }

    /// True when no filesystem mutation was performed.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Counter map keyed by name, e.g. `{"deleted": 3, "errors": 1}`.
    pub fn counters(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([(self.counter.name(), self.succeeded), ("errors", self.errors())])
    }

    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "errors": self.errors(),
            "dry_run": self.dry_run,
            "details": self.details,
            "failures": self.failures.iter().map(|f| {
                json!({
                    "path": f.path.to_string_lossy().to_string(),
                    "message": f.message,
                })
            }).collect::<Vec<_>>(),
        });
        value[self.counter.name()] = json!(self.succeeded);
        value
    }
}
