//! Directory tree traversal.
//!
//! [`TreeScanner`] yields a lazy stream of [`Entry`] snapshots for everything
//! below a root directory. The root itself is never yielded. Symbolic links are
//! reported as [`EntryKind::Symlink`] and never followed.

use crate::error::{HousekeepError, Result};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

/// What kind of filesystem object an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, FIFOs, device nodes.
    Other,
}

/// Metadata snapshot of one filesystem object, taken when it was visited.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Full path to the entry.
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Final extension without the leading dot. `None` when absent or empty.
    pub extension: Option<String>,
    pub size_bytes: u64,
    pub modified: SystemTime,
    /// Permission bits (`0o7777` mask).
    pub mode: u32,
    /// Distance from the root; direct children have depth 1.
    pub depth: usize,
}

impl Entry {
    fn from_walk_entry(entry: &walkdir::DirEntry) -> io::Result<Self> {
        let metadata = entry.metadata().map_err(io::Error::from)?;
        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };

        Ok(Self {
            path: entry.path().to_path_buf(),
            kind,
            extension: extension_of(entry.path()),
            size_bytes: metadata.len(),
            modified: metadata.modified()?,
            mode: metadata.permissions().mode() & 0o7777,
            depth: entry.depth(),
        })
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// The final path component, lossily converted.
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    }
}

/// Returns the extension of `path` exactly as written, without the dot.
///
/// Dotfiles such as `.bashrc` and names ending in a dot have no extension.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .filter(|ext| !ext.is_empty())
}

/// A failure to visit or stat a single entry during a walk.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ScanError {
    /// The entry (or directory being read) the failure belongs to.
    pub path: PathBuf,
    pub message: String,
}

/// Order in which entries are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum WalkOrder {
    /// Directories before their contents.
    #[default]
    ParentFirst,
    /// Every directory after all of its descendants (post-order).
    DeepestFirst,
}

/// Walks a directory tree and produces [`Entry`] snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeScanner {
    recursive: bool,
    order: WalkOrder,
}

impl TreeScanner {
    /// Creates a scanner. Non-recursive scanners yield direct children only.
    pub fn new(recursive: bool) -> Self {
        Self {
            recursive,
            order: WalkOrder::ParentFirst,
        }
    }

    /// Switches to post-order traversal.
    pub fn deepest_first(mut self) -> Self {
        self.order = WalkOrder::DeepestFirst;
        self
    }

    /// Starts a walk below `root`.
    ///
    /// The existence of `root` is checked once, up front. Entries are read
    /// lazily, one directory handle per level, so very wide directories are
    /// never buffered whole. A `Walk` cannot be restarted.
    ///
    /// # Errors
    ///
    /// Returns [`HousekeepError::NotFound`] if `root` does not exist.
    pub fn walk(&self, root: &Path) -> Result<Walk> {
        ensure_exists(root)?;

        let mut walker = WalkDir::new(root).follow_links(false).min_depth(1);
        if !self.recursive {
            walker = walker.max_depth(1);
        }
        if self.order == WalkOrder::DeepestFirst {
            walker = walker.contents_first(true);
        }

        Ok(Walk {
            root: root.to_path_buf(),
            inner: walker.into_iter(),
            failed: HashSet::new(),
        })
    }
}

/// Checks that `path` exists, distinguishing absence from other stat failures.
pub(crate) fn ensure_exists(path: &Path) -> Result<fs::Metadata> {
    fs::metadata(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            HousekeepError::not_found(path)
        } else {
            HousekeepError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Lazy sequence of entries produced by [`TreeScanner::walk`].
///
/// A directory that could not be read is reported once, as a [`ScanError`].
/// Post-order walks would otherwise yield it again afterwards.
pub struct Walk {
    root: PathBuf,
    inner: walkdir::IntoIter,
    failed: HashSet<PathBuf>,
}

impl Iterator for Walk {
    type Item = std::result::Result<Entry, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) if self.failed.contains(entry.path()) => continue,
                Ok(entry) => {
                    return Some(Entry::from_walk_entry(&entry).map_err(|e| ScanError {
                        path: entry.path().to_path_buf(),
                        message: e.to_string(),
                    }));
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    let message = match err.io_error() {
                        Some(io_err) => io_err.to_string(),
                        None => err.to_string(),
                    };
                    self.failed.insert(path.clone());
                    return Some(Err(ScanError { path, message }));
                }
            }
        }
    }
}
