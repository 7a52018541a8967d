//! A single filesystem directory and its cached listing.
//!
//! A [`Directory`] is only ever created by the
//! [`DirectoryRegistry`](crate::registry::DirectoryRegistry), which guarantees
//! one instance per path. Its listing is computed at most once and then kept
//! for the lifetime of the registry.

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Name of the version-control metadata directory that is never listed.
pub const VCS_DIR_NAME: &str = ".git";

/// Immediate children of a scanned directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirContents {
    /// File names, in the order the filesystem returned them.
    pub files: Vec<String>,

    /// Subdirectory names, in filesystem order, without [`VCS_DIR_NAME`].
    pub sub_dirs: Vec<String>,
}

impl DirContents {
    /// Whether the directory held no files and no (listed) subdirectories.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.sub_dirs.is_empty()
    }
}

/// Scan state of a directory.
#[derive(Debug)]
enum ScanState {
    Unscanned,
    Scanned(Arc<DirContents>),
}

/// One filesystem directory known to a registry.
pub struct Directory {
    path: PathBuf,
    state: Mutex<ScanState>,
}

impl Directory {
    /// Only the registry constructs directories.
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: Mutex::new(ScanState::Unscanned),
        }
    }

    /// The path this directory was registered under.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path as a string, for string-structured comparisons.
    pub fn path_str(&self) -> Cow<'_, str> {
        self.path.to_string_lossy()
    }

    /// Whether the listing has been computed.
    pub fn is_scanned(&self) -> bool {
        matches!(*self.state.lock(), ScanState::Scanned(_))
    }

    /// The cached listing, if the directory has been scanned.
    pub fn cached_contents(&self) -> Option<Arc<DirContents>> {
        match &*self.state.lock() {
            ScanState::Scanned(contents) => Some(Arc::clone(contents)),
            ScanState::Unscanned => None,
        }
    }

    /// Return the cached listing or compute it with `scan`.
    ///
    /// The state lock is held across `scan`, so concurrent callers wait for
    /// the first one and then see its result. A failed scan leaves the
    /// directory unscanned.
    pub(crate) fn contents_with<F>(&self, scan: F) -> io::Result<Arc<DirContents>>
    where
        F: FnOnce(&Path) -> io::Result<DirContents>,
    {
        let mut state = self.state.lock();
        if let ScanState::Scanned(contents) = &*state {
            return Ok(Arc::clone(contents));
        }

        let contents = Arc::new(scan(&self.path)?);
        *state = ScanState::Scanned(Arc::clone(&contents));
        Ok(contents)
    }

    /// Path of this directory relative to `start`.
    ///
    /// Both paths are made absolute against the current directory and
    /// normalized lexically; symbolic links are not resolved.
    pub fn relpath(&self, start: impl AsRef<Path>) -> io::Result<PathBuf> {
        let target = normalize(&std::path::absolute(&self.path)?);
        let base = normalize(&std::path::absolute(start.as_ref())?);
        Ok(relative_to(&target, &base))
    }

    /// Path of this directory relative to the current working directory.
    pub fn relpath_from_cwd(&self) -> io::Result<PathBuf> {
        self.relpath(std::env::current_dir()?)
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("path", &self.path)
            .field("scanned", &self.is_scanned())
            .finish()
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn relative_to(target: &Path, base: &Path) -> PathBuf {
    let target: Vec<_> = target.components().collect();
    let base: Vec<_> = base.components().collect();
    let shared = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in shared..base.len() {
        out.push("..");
    }
    for component in &target[shared..] {
        out.push(component.as_os_str());
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}
