//! Directory registry and reverse file index.
//!
//! The [`DirectoryRegistry`] is the single source of [`Directory`] identity:
//! every lookup goes through [`DirectoryRegistry::get_or_create`], so two
//! requests for the same path always yield the same `Arc<Directory>`.
//! Paths are stored in the spelling [`Path::components`] produces, so
//! `/p2/sub/`, `/p2/./sub` and `/p2/sub` register one directory whose path
//! text is `/p2/sub` no matter which spelling arrived first.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               DirectoryRegistry              │
//! │                                              │
//! │  directories: DashMap<PathBuf, Directory>    │
//! │  file_index:  name -> [Directory, ...]       │
//! │  predicate:   Option<IndexPredicate>         │
//! └───────┬──────────────────────────┬───────────┘
//!         │ contents() / scan_tree() │ find_file_in_directories()
//!         ▼                          ▼
//!   read_dir + stat,           split, lookup, suffix filter,
//!   append matches to index    closest-prefix tie-break
//! ```
//!
//! # Indexing order
//!
//! The predicate is read at scan time. Installing one after directories have
//! been scanned does not index them retroactively; install it first.

mod predicate;
mod resolve;
mod scan;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::directory::Directory;

pub use predicate::{IndexPredicate, PatternSyntax, PredicateError};
pub use resolve::{common_prefix_len, split_query, strip_dir_suffix};
pub use scan::ScanSummary;

/// Point-in-time counters for a registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Directories registered (scanned or not).
    pub directories: usize,
    /// Distinct file names in the reverse index.
    pub indexed_names: usize,
    /// Filesystem enumerations performed.
    pub scans: usize,
}

/// Registry of directories with a filename → directories index.
pub struct DirectoryRegistry {
    directories: DashMap<PathBuf, Arc<Directory>>,
    file_index: RwLock<HashMap<String, Vec<Arc<Directory>>>>,
    predicate: RwLock<Option<IndexPredicate>>,
    scans: AtomicUsize,
}

impl DirectoryRegistry {
    /// Create an empty registry without an index predicate.
    pub fn new() -> Self {
        Self {
            directories: DashMap::new(),
            file_index: RwLock::new(HashMap::new()),
            predicate: RwLock::new(None),
            scans: AtomicUsize::new(0),
        }
    }

    /// Create a registry with `predicate` already installed.
    pub fn with_predicate(predicate: IndexPredicate) -> Self {
        let registry = Self::new();
        registry.set_index_predicate(predicate);
        registry
    }

    /// Return the directory registered for `path`, creating it if needed.
    ///
    /// The directory is not checked on disk; that happens when it is scanned.
    pub fn get_or_create(&self, path: impl AsRef<Path>) -> Arc<Directory> {
        let path = normalize_spelling(path.as_ref());
        if let Some(existing) = self.directories.get(&path) {
            return Arc::clone(existing.value());
        }

        let entry = self.directories.entry(path.clone()).or_insert_with(|| {
            debug!(path = %path.display(), "Registering directory");
            Arc::new(Directory::new(path))
        });
        Arc::clone(entry.value())
    }

    /// Look up a registered directory without creating it.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Arc<Directory>> {
        self.directories
            .get(&normalize_spelling(path.as_ref()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Install the predicate used by subsequent scans.
    ///
    /// Directories scanned before this call stay unindexed.
    pub fn set_index_predicate(&self, predicate: IndexPredicate) {
        let mut slot = self.predicate.write();
        if let Some(previous) = slot.as_ref() {
            warn!(
                previous = %previous,
                replacement = %predicate,
                "Replacing index predicate; already scanned directories are not re-indexed"
            );
        } else {
            debug!(predicate = %predicate, "Installed index predicate");
        }
        *slot = Some(predicate);
    }

    /// The installed predicate, if any.
    pub fn index_predicate(&self) -> Option<IndexPredicate> {
        self.predicate.read().clone()
    }

    /// Directories known to contain `file_name`, in discovery order.
    pub fn directories_for(&self, file_name: &str) -> Vec<Arc<Directory>> {
        self.file_index
            .read()
            .get(file_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Indexed file names, sorted.
    pub fn indexed_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.file_index.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether the reverse index has no entries.
    pub fn is_index_empty(&self) -> bool {
        self.file_index.read().is_empty()
    }

    /// Number of registered directories.
    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }

    /// Snapshot of the registry counters.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            directories: self.directories.len(),
            indexed_names: self.file_index.read().len(),
            scans: self.scans.load(Ordering::Relaxed),
        }
    }

    /// Append `dir` to the index entry of each name in `names`.
    ///
    /// Called once per directory, from its only scan, so entries never repeat.
    fn index_files(&self, dir: &Arc<Directory>, names: Vec<String>) {
        if names.is_empty() {
            return;
        }

        let mut index = self.file_index.write();
        for name in names {
            index.entry(name).or_default().push(Arc::clone(dir));
        }
    }
}

/// Rebuild `path` from its components.
///
/// Drops trailing and repeated separators and interior `.` components; `..`
/// is kept since removing it lexically can change which directory is meant.
fn normalize_spelling(path: &Path) -> PathBuf {
    path.components().collect()
}

impl Default for DirectoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DirectoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryRegistry")
            .field("stats", &self.stats())
            .field("predicate", &self.index_predicate())
            .finish()
    }
}
