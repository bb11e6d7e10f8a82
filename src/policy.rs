//! Policy engine: applies one mutation (or query) policy to a directory tree.
//!
//! Every mutating policy follows the same rule. A failure on one entry is
//! recorded in the [`RunResult`] and iteration moves on; only a missing root or
//! an invalid argument aborts the run, and it does so before any entry is
//! touched.

use crate::config::CompiledFilters;
use crate::error::{HousekeepError, Result};
use crate::logger::Logger;
use crate::run_result::{Counter, EntryOutcome, RunResult};
use crate::scanner::{
    Entry, EntryKind, ScanError, TreeScanner, Walk, ensure_exists, extension_of,
};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Bucket for files without an extension.
pub const NO_EXTENSION_BUCKET: &str = "no_extension";

/// Default age threshold for [`Policy::CleanupOldFiles`].
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 86_400);

/// Highest accepted permission value (`rwxrwxrwx` plus setuid, setgid, sticky).
pub const MAX_MODE: u32 = 0o7777;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// One housekeeping rule. Exactly one policy runs per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Move files directly inside the root into per-extension subdirectories.
    OrganizeByExtension,
    /// Remove empty directories below the root, deepest first.
    CleanupEmptyDirs { recursive: bool },
    /// Delete files last modified before `now - max_age`.
    CleanupOldFiles { max_age: Duration },
    /// Set permission bits on a target, or on everything below it.
    ChangePermissions { mode: u32, recursive: bool },
    /// Report files strictly larger than `min_size` bytes.
    FindLargeFiles { min_size: u64 },
}

impl Policy {
    pub fn name(&self) -> &'static str {
        match self {
            Policy::OrganizeByExtension => "organize-by-extension",
            Policy::CleanupEmptyDirs { .. } => "cleanup-empty-dirs",
            Policy::CleanupOldFiles { .. } => "cleanup-old-files",
            Policy::ChangePermissions { .. } => "change-permissions",
            Policy::FindLargeFiles { .. } => "find-large-files",
        }
    }
}

/// A file reported by [`Policy::FindLargeFiles`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LargeFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Size in mebibytes, rounded to two decimals.
    pub size_mb: f64,
}

impl LargeFile {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            path: entry.path.clone(),
            size_bytes: entry.size_bytes,
            size_mb: round_mib(entry.size_bytes),
        }
    }
}

fn round_mib(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MIB * 100.0).round() / 100.0
}

/// What [`PolicyEngine::run`] produced.
#[derive(Debug, Clone)]
pub enum PolicyOutcome {
    Mutated(RunResult),
    Found(Vec<LargeFile>),
}

impl PolicyOutcome {
    pub fn run_result(&self) -> Option<&RunResult> {
        match self {
            PolicyOutcome::Mutated(result) => Some(result),
            PolicyOutcome::Found(_) => None,
        }
    }

    pub fn large_files(&self) -> Option<&[LargeFile]> {
        match self {
            PolicyOutcome::Mutated(_) => None,
            PolicyOutcome::Found(files) => Some(files),
        }
    }
}

/// Engine-wide switches.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Evaluate policies without touching the filesystem.
    pub dry_run: bool,
    /// Entries these filters exclude are skipped by every policy.
    pub filters: CompiledFilters,
}

/// Returns the bucket a file is organized into.
///
/// The extension is used exactly as written (no case folding): `data.CSV`
/// goes to `CSV`, `report` and `.bashrc` go to [`NO_EXTENSION_BUCKET`].
pub fn bucket_name(path: &Path) -> String {
    extension_of(path).unwrap_or_else(|| NO_EXTENSION_BUCKET.to_string())
}

/// Errors moving a single file into its bucket.
#[derive(Debug, Error)]
enum MoveError {
    #[error("failed to create directory {}: {source}", path.display())]
    BucketCreation { path: PathBuf, source: io::Error },
    #[error("{} exists and is not a directory", .0.display())]
    BucketNotDirectory(PathBuf),
    #[error("destination {} already exists", .0.display())]
    Collision(PathBuf),
    #[error("failed to move to {}: {source}", destination.display())]
    Rename {
        destination: PathBuf,
        source: io::Error,
    },
}

/// Applies policies to directory trees, reporting through an injected logger.
pub struct PolicyEngine<'a> {
    logger: &'a dyn Logger,
    options: EngineOptions,
}

impl<'a> PolicyEngine<'a> {
    pub fn new(logger: &'a dyn Logger) -> Self {
        Self::with_options(logger, EngineOptions::default())
    }

    pub fn with_options(logger: &'a dyn Logger, options: EngineOptions) -> Self {
        Self { logger, options }
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Runs `policy` against `root`.
    ///
    /// For [`Policy::ChangePermissions`], `root` is the target, which may be a
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`HousekeepError::NotFound`] if `root` does not exist, or
    /// [`HousekeepError::InvalidArgument`] for an unusable policy parameter.
    pub fn run(&self, policy: &Policy, root: &Path) -> Result<PolicyOutcome> {
        self.logger.debug(&format!(
            "Running policy {} on {}",
            policy.name(),
            root.display()
        ));
        match *policy {
            Policy::OrganizeByExtension => self
                .organize_by_extension(root)
                .map(PolicyOutcome::Mutated),
            Policy::CleanupEmptyDirs { recursive } => self
                .cleanup_empty_dirs(root, recursive)
                .map(PolicyOutcome::Mutated),
            Policy::CleanupOldFiles { max_age } => self
                .cleanup_old_files(root, max_age)
                .map(PolicyOutcome::Mutated),
            Policy::ChangePermissions { mode, recursive } => self
                .change_permissions(root, mode, recursive)
                .map(PolicyOutcome::Mutated),
            Policy::FindLargeFiles { min_size } => self
                .find_large_files(root, min_size)
                .map(PolicyOutcome::Found),
        }
    }

    /// Moves every file directly inside `root` into `root/<extension>/`.
    pub fn organize_by_extension(&self, root: &Path) -> Result<RunResult> {
        self.logger
            .info(&format!("Starting file organization in {}", root.display()));
        let walk = self.start_walk(TreeScanner::new(false), root, "File organization")?;
        let mut result = RunResult::new(Counter::Organized, self.options.dry_run);

        for item in walk {
            let Some(entry) = self.accept(item, &mut result) else {
                continue;
            };
            if !entry.is_file() {
                continue;
            }

            let bucket = bucket_name(&entry.path);
            let name = entry.file_name();
            let outcome = match self.move_into_bucket(root, &entry, &bucket) {
                Ok(()) if self.options.dry_run => {
                    EntryOutcome::Success(format!("Would move {name} to {bucket}/"))
                }
                Ok(()) => {
                    self.logger.info(&format!("Organized: {name} -> {bucket}"));
                    EntryOutcome::Success(format!("Moved {name} to {bucket}/"))
                }
                Err(e) => {
                    self.logger
                        .error(&format!("Failed to organize {name}: {e}"));
                    EntryOutcome::Failure(e.to_string())
                }
            };
            result.record(&entry.path, outcome);
        }

        self.logger.info(&format!(
            "File organization complete: {} organized, {} errors",
            result.succeeded(),
            result.errors()
        ));
        Ok(result)
    }

    /// Creates the bucket if needed and moves the file into it, never
    /// overwriting an existing destination.
    fn move_into_bucket(
        &self,
        root: &Path,
        entry: &Entry,
        bucket: &str,
    ) -> std::result::Result<(), MoveError> {
        let bucket_path = root.join(bucket);

        match fs::symlink_metadata(&bucket_path) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(MoveError::BucketNotDirectory(bucket_path)),
            Err(_) if self.options.dry_run => {}
            Err(_) => match fs::create_dir(&bucket_path) {
                Ok(()) => {}
                // Created concurrently; the rename below reports anything wrong.
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(MoveError::BucketCreation {
                        path: bucket_path,
                        source: e,
                    });
                }
            },
        }

        let Some(file_name) = entry.path.file_name() else {
            return Err(MoveError::Rename {
                destination: bucket_path,
                source: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
            });
        };
        let destination = bucket_path.join(file_name);

        if fs::symlink_metadata(&destination).is_ok() {
            return Err(MoveError::Collision(destination));
        }
        if self.options.dry_run {
            return Ok(());
        }

        fs::rename(&entry.path, &destination).map_err(|e| MoveError::Rename {
            destination,
            source: e,
        })
    }

    /// Removes empty directories below `root`, children before parents, so a
    /// chain emptied in this run disappears in a single pass. `root` itself
    /// is never removed. A non-recursive run removes nothing.
    pub fn cleanup_empty_dirs(&self, root: &Path, recursive: bool) -> Result<RunResult> {
        self.logger
            .info(&format!("Cleaning empty directories in {}", root.display()));
        let mut result = RunResult::new(Counter::Removed, self.options.dry_run);

        if !recursive {
            ensure_exists(root).inspect_err(|e| {
                self.logger.error(&format!("Cleanup failed: {e}"));
            })?;
            self.logger
                .info("Non-recursive cleanup never removes anything below the root");
            return Ok(result);
        }

        let walk = self.start_walk(TreeScanner::new(true).deepest_first(), root, "Cleanup")?;
        // Directories chosen for removal; only consulted by dry runs, where
        // nothing is actually removed.
        let mut selected: HashSet<PathBuf> = HashSet::new();

        for item in walk {
            let Some(entry) = self.accept(item, &mut result) else {
                continue;
            };
            if !entry.is_dir() {
                continue;
            }

            let outcome = match self.remove_if_empty(&entry.path, &selected) {
                Ok(false) => continue,
                Ok(true) if self.options.dry_run => {
                    selected.insert(entry.path.clone());
                    EntryOutcome::Success(format!("Would remove {}", entry.path.display()))
                }
                Ok(true) => {
                    self.logger
                        .info(&format!("Removed empty directory: {}", entry.path.display()));
                    EntryOutcome::Success(format!("Removed {}", entry.path.display()))
                }
                Err(e) => {
                    self.logger
                        .warn(&format!("Could not remove {}: {e}", entry.path.display()));
                    EntryOutcome::Failure(e.to_string())
                }
            };
            result.record(&entry.path, outcome);
        }

        self.logger.info(&format!(
            "Cleanup complete: {} directories removed",
            result.succeeded()
        ));
        Ok(result)
    }

    /// Returns whether `dir` was (or, in a dry run, would be) removed.
    fn remove_if_empty(&self, dir: &Path, selected: &HashSet<PathBuf>) -> io::Result<bool> {
        for child in fs::read_dir(dir)? {
            if !selected.contains(&child?.path()) {
                return Ok(false);
            }
        }
        if !self.options.dry_run {
            fs::remove_dir(dir)?;
        }
        Ok(true)
    }

    /// Deletes files below `root` whose modification time is strictly older
    /// than `now - max_age`. Directories are never deleted.
    pub fn cleanup_old_files(&self, root: &Path, max_age: Duration) -> Result<RunResult> {
        self.logger.info(&format!(
            "Cleaning files older than {} days in {}",
            max_age.as_secs() / 86_400,
            root.display()
        ));
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .ok_or_else(|| HousekeepError::InvalidArgument {
                reason: format!("maximum age of {}s is out of range", max_age.as_secs()),
            })?;
        let walk = self.start_walk(TreeScanner::new(true), root, "Old file cleanup")?;
        let mut result = RunResult::new(Counter::Deleted, self.options.dry_run);

        for item in walk {
            let Some(entry) = self.accept(item, &mut result) else {
                continue;
            };
            if !entry.is_file() || entry.modified >= cutoff {
                continue;
            }

            let name = entry.file_name();
            let outcome = if self.options.dry_run {
                EntryOutcome::Success(format!("Would delete {name}"))
            } else {
                match fs::remove_file(&entry.path) {
                    Ok(()) => {
                        self.logger
                            .info(&format!("Deleted old file: {}", entry.path.display()));
                        EntryOutcome::Success(format!("Deleted {name}"))
                    }
                    Err(e) => {
                        self.logger
                            .warn(&format!("Could not delete {}: {e}", entry.path.display()));
                        EntryOutcome::Failure(e.to_string())
                    }
                }
            };
            result.record(&entry.path, outcome);
        }

        self.logger.info(&format!(
            "Old file cleanup complete: {} deleted, {} errors",
            result.succeeded(),
            result.errors()
        ));
        Ok(result)
    }

    /// Sets `mode` on `target`, or on every descendant of `target` when
    /// `recursive` is set and `target` is a directory.
    ///
    /// Recursive runs visit children before their parent directory, so a mode
    /// without search permission cannot cut the walk short. Symbolic links met
    /// during a recursive walk are skipped rather than followed.
    pub fn change_permissions(
        &self,
        target: &Path,
        mode: u32,
        recursive: bool,
    ) -> Result<RunResult> {
        self.logger.info(&format!(
            "Changing permissions for {} to {:#o}",
            target.display(),
            mode
        ));
        if mode > MAX_MODE {
            let err = HousekeepError::InvalidArgument {
                reason: format!("mode {mode:#o} exceeds {MAX_MODE:#o}"),
            };
            self.logger.error(&format!("Permission change failed: {err}"));
            return Err(err);
        }
        let metadata = ensure_exists(target).inspect_err(|e| {
            self.logger.error(&format!("Permission change failed: {e}"));
        })?;
        let mut result = RunResult::new(Counter::Changed, self.options.dry_run);

        if recursive && metadata.is_dir() {
            let walk = self.start_walk(
                TreeScanner::new(true).deepest_first(),
                target,
                "Permission change",
            )?;
            for item in walk {
                let Some(entry) = self.accept(item, &mut result) else {
                    continue;
                };
                if entry.kind == EntryKind::Symlink {
                    self.logger
                        .debug(&format!("Skipping symlink {}", entry.path.display()));
                    continue;
                }
                let outcome = self.set_mode(&entry.path, mode);
                result.record(&entry.path, outcome);
            }
        } else {
            let outcome = self.set_mode(target, mode);
            result.record(target, outcome);
        }

        self.logger.info(&format!(
            "Permission change complete: {} changed, {} errors",
            result.succeeded(),
            result.errors()
        ));
        Ok(result)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> EntryOutcome {
        if self.options.dry_run {
            return EntryOutcome::Success(format!("Would change {} to {mode:o}", path.display()));
        }
        match fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
            Ok(()) => {
                self.logger
                    .debug(&format!("Changed permissions: {}", path.display()));
                EntryOutcome::Success(format!("Changed {} to {mode:o}", path.display()))
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Could not change {}: {e}", path.display()));
                EntryOutcome::Failure(e.to_string())
            }
        }
    }

    /// Lists files below `root` strictly larger than `min_size` bytes, in
    /// visit order. Nothing is modified; unreadable entries are skipped.
    pub fn find_large_files(&self, root: &Path, min_size: u64) -> Result<Vec<LargeFile>> {
        self.logger.info(&format!(
            "Searching for files larger than {:.2}MB in {}",
            min_size as f64 / BYTES_PER_MIB,
            root.display()
        ));
        let walk = self.start_walk(TreeScanner::new(true), root, "Large file search")?;
        let mut large_files = Vec::new();

        for item in walk {
            let entry = match item {
                Ok(entry) => entry,
                Err(err) => {
                    self.logger
                        .warn(&format!("Skipping {}: {}", err.path.display(), err.message));
                    continue;
                }
            };
            if !entry.is_file() || entry.size_bytes <= min_size || self.is_excluded(&entry) {
                continue;
            }

            let found = LargeFile::from_entry(&entry);
            self.logger.info(&format!(
                "Found large file: {} ({:.2}MB)",
                entry.file_name(),
                found.size_mb
            ));
            large_files.push(found);
        }

        self.logger
            .info(&format!("Found {} large files", large_files.len()));
        Ok(large_files)
    }

    fn start_walk(&self, scanner: TreeScanner, root: &Path, operation: &str) -> Result<Walk> {
        scanner.walk(root).inspect_err(|e| {
            self.logger.error(&format!("{operation} failed: {e}"));
        })
    }

    /// Unwraps a walk item, recording scan failures and dropping filtered entries.
    fn accept(
        &self,
        item: std::result::Result<Entry, ScanError>,
        result: &mut RunResult,
    ) -> Option<Entry> {
        match item {
            Ok(entry) if self.is_excluded(&entry) => None,
            Ok(entry) => Some(entry),
            Err(err) => {
                self.logger
                    .warn(&format!("Could not read {}: {}", err.path.display(), err.message));
                result.record(&err.path, EntryOutcome::Failure(err.message));
                None
            }
        }
    }

    fn is_excluded(&self, entry: &Entry) -> bool {
        let excluded = self.options.filters.is_excluded(&entry.path);
        if excluded {
            self.logger
                .debug(&format!("Excluded by filters: {}", entry.path.display()));
        }
        excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterRules;
    use crate::logger::CapturingLogger;
    use std::fs::File;
    use tempfile::TempDir;
    use tracing::Level;

    fn age_file(path: &Path, days: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(days * 86_400))
            .unwrap();
    }

    fn dry_run_options() -> EngineOptions {
        EngineOptions {
            dry_run: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_bucket_name_is_exact_case() {
        assert_eq!(bucket_name(Path::new("/x/data.CSV")), "CSV");
        assert_eq!(bucket_name(Path::new("/x/data.csv")), "csv");
        assert_eq!(bucket_name(Path::new("/x/report")), "no_extension");
        assert_eq!(bucket_name(Path::new("/x/.bashrc")), "no_extension");
        assert_eq!(bucket_name(Path::new("/x/a.tar.gz")), "gz");
    }

    #[test]
    fn test_round_mib() {
        assert_eq!(round_mib(1024 * 1024), 1.0);
        assert_eq!(round_mib(1024 * 1024 * 3 / 2), 1.5);
        assert_eq!(round_mib(1_234_567), 1.18);
    }

    #[test]
    fn test_organize_skips_directories_and_logs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("existing.d")).unwrap();
        fs::write(root.join("notes.txt"), "n").unwrap();

        let logger = CapturingLogger::new();
        let result = PolicyEngine::new(&logger).organize_by_extension(root).unwrap();

        assert_eq!(result.succeeded(), 1);
        assert!(root.join("existing.d").is_dir());
        assert!(root.join("txt/notes.txt").is_file());
        assert_eq!(result.details(), ["Moved notes.txt to txt/"]);
        assert!(
            logger
                .messages_at(Level::INFO)
                .iter()
                .any(|m| m == "Organized: notes.txt -> txt")
        );
    }

    #[test]
    fn test_organize_bucket_blocked_by_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        // Symlinks are never organized, so "log" keeps blocking the bucket.
        std::os::unix::fs::symlink("/nonexistent", root.join("log")).unwrap();
        fs::write(root.join("a.log"), "entry").unwrap();

        let logger = CapturingLogger::new();
        let result = PolicyEngine::new(&logger).organize_by_extension(root).unwrap();

        assert_eq!(result.succeeded(), 0);
        assert_eq!(result.errors(), 1);
        assert_eq!(result.failures()[0].path, root.join("a.log"));
        assert!(root.join("a.log").is_file());
        assert_eq!(logger.messages_at(Level::ERROR).len(), 1);
    }

    #[test]
    fn test_organize_dry_run_changes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("b"), "b").unwrap();

        let logger = CapturingLogger::new();
        let engine = PolicyEngine::with_options(&logger, dry_run_options());
        let result = engine.organize_by_extension(root).unwrap();

        assert!(result.is_dry_run());
        assert_eq!(result.succeeded(), 2);
        assert!(root.join("a.txt").is_file());
        assert!(!root.join("txt").exists());
        assert!(!root.join("no_extension").exists());
        assert!(result.details().iter().all(|d| d.starts_with("Would move")));
    }

    #[test]
    fn test_cleanup_empty_dirs_non_recursive_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("empty")).unwrap();

        let logger = CapturingLogger::new();
        let result = PolicyEngine::new(&logger)
            .cleanup_empty_dirs(root, false)
            .unwrap();

        assert_eq!(result.succeeded(), 0);
        assert_eq!(result.errors(), 0);
        assert!(root.join("empty").is_dir());
    }

    #[test]
    fn test_cleanup_empty_dirs_non_recursive_missing_root() {
        let logger = CapturingLogger::new();
        let err = PolicyEngine::new(&logger)
            .cleanup_empty_dirs(Path::new("/no/such/root"), false)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_cleanup_empty_dirs_keeps_non_empty_and_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("keep/empty")).unwrap();
        fs::write(root.join("keep/file.txt"), "x").unwrap();
        fs::create_dir(root.join("gone")).unwrap();

        let logger = CapturingLogger::new();
        let result = PolicyEngine::new(&logger)
            .cleanup_empty_dirs(root, true)
            .unwrap();

        assert_eq!(result.succeeded(), 2);
        assert!(root.is_dir());
        assert!(root.join("keep/file.txt").is_file());
        assert!(!root.join("keep/empty").exists());
        assert!(!root.join("gone").exists());
    }

    #[test]
    fn test_cleanup_empty_dirs_dry_run_simulates_cascade() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("d/e")).unwrap();
        fs::write(root.join("d/file"), "x").unwrap();

        let logger = CapturingLogger::new();
        let engine = PolicyEngine::with_options(&logger, dry_run_options());
        let result = engine.cleanup_empty_dirs(root, true).unwrap();

        // a, a/b, a/b/c and d/e; d holds a file.
        assert_eq!(result.succeeded(), 4);
        assert!(root.join("a/b/c").is_dir());
        assert!(root.join("d/e").is_dir());
    }

    #[test]
    fn test_cleanup_old_files_keeps_recent_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("old_dir")).unwrap();
        fs::write(root.join("old.log"), "old").unwrap();
        fs::write(root.join("fresh.log"), "fresh").unwrap();
        age_file(&root.join("old.log"), 45);
        age_file(&root.join("fresh.log"), 2);

        let logger = CapturingLogger::new();
        let result = PolicyEngine::new(&logger)
            .cleanup_old_files(root, DEFAULT_MAX_AGE)
            .unwrap();

        assert_eq!(result.succeeded(), 1);
        assert_eq!(result.details(), ["Deleted old.log"]);
        assert!(!root.join("old.log").exists());
        assert!(root.join("fresh.log").exists());
        assert!(root.join("old_dir").is_dir());
    }

    #[test]
    fn test_cleanup_old_files_rejects_out_of_range_age() {
        let temp_dir = TempDir::new().unwrap();
        let logger = CapturingLogger::new();
        let err = PolicyEngine::new(&logger)
            .cleanup_old_files(temp_dir.path(), Duration::MAX)
            .unwrap_err();
        assert!(matches!(err, HousekeepError::InvalidArgument { .. }));
    }

    #[test]
    fn test_change_permissions_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("script.sh");
        fs::write(&file, "#!/bin/sh").unwrap();

        let logger = CapturingLogger::new();
        let result = PolicyEngine::new(&logger)
            .change_permissions(&file, 0o750, true)
            .unwrap();

        assert_eq!(result.succeeded(), 1);
        let mode = fs::metadata(&file).unwrap().permissions().mode() & MAX_MODE;
        assert_eq!(mode, 0o750);
    }

    #[test]
    fn test_change_permissions_rejects_invalid_mode() {
        let temp_dir = TempDir::new().unwrap();
        let logger = CapturingLogger::new();
        let err = PolicyEngine::new(&logger)
            .change_permissions(temp_dir.path(), 0o10000, false)
            .unwrap_err();
        assert!(matches!(err, HousekeepError::InvalidArgument { .. }));
        assert_eq!(logger.messages_at(Level::ERROR).len(), 1);
    }

    #[test]
    fn test_change_permissions_recursive_skips_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/a"), "a").unwrap();
        std::os::unix::fs::symlink("/etc/hostname", root.join("sub/link")).unwrap();

        let logger = CapturingLogger::new();
        let result = PolicyEngine::new(&logger)
            .change_permissions(root, 0o700, true)
            .unwrap();

        // sub and sub/a; the link and the target itself are not counted.
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.errors(), 0);
    }

    #[test]
    fn test_filters_protect_entries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("keep.lock"), "x").unwrap();
        fs::write(root.join("move.txt"), "x").unwrap();

        let filters = FilterRules {
            extensions: vec!["lock".to_string()],
            ..Default::default()
        }
        .compile()
        .unwrap();
        let logger = CapturingLogger::new();
        let engine = PolicyEngine::with_options(
            &logger,
            EngineOptions {
                dry_run: false,
                filters,
            },
        );
        let result = engine.organize_by_extension(root).unwrap();

        assert_eq!(result.succeeded(), 1);
        assert_eq!(result.errors(), 0);
        assert!(root.join("keep.lock").is_file());
        assert!(!root.join("lock").exists());
    }

    #[test]
    fn test_find_large_files_visit_order_and_size() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("nested/big.bin"), vec![0u8; 3 * 1024 * 1024]).unwrap();
        fs::write(root.join("small.bin"), vec![0u8; 10]).unwrap();

        let logger = CapturingLogger::new();
        let found = PolicyEngine::new(&logger)
            .find_large_files(root, 1024 * 1024)
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, root.join("nested/big.bin"));
        assert_eq!(found[0].size_mb, 3.0);
        assert_eq!(found[0].size_bytes, 3 * 1024 * 1024);
    }

    #[test]
    fn test_run_dispatches_find_large_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("f"), vec![0u8; 100]).unwrap();

        let logger = CapturingLogger::new();
        let outcome = PolicyEngine::new(&logger)
            .run(&Policy::FindLargeFiles { min_size: 50 }, temp_dir.path())
            .unwrap();

        assert!(outcome.run_result().is_none());
        assert_eq!(outcome.large_files().map(<[LargeFile]>::len), Some(1));
    }
}
