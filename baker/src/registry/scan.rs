//! Directory scanning and reverse-index population.
//!
//! A scan lists the immediate children of a directory once, classifies each
//! entry with a stat, and records files matching the index predicate. Tree
//! scans recurse through subdirectories with rayon, one task per sibling,
//! and stop at symlinks leading back to a directory already being walked.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::DirectoryRegistry;
use crate::directory::{DirContents, Directory, VCS_DIR_NAME};

/// Totals from a recursive scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Directories visited, including the root.
    pub directories: usize,
    /// Files listed across all visited directories.
    pub files: usize,
}

impl ScanSummary {
    fn merge(self, other: ScanSummary) -> ScanSummary {
        ScanSummary {
            directories: self.directories + other.directories,
            files: self.files + other.files,
        }
    }
}

impl DirectoryRegistry {
    /// Return the listing of `dir`, scanning it on first use.
    ///
    /// Later calls return the cached listing without touching the
    /// filesystem. I/O errors from listing the directory are returned as is
    /// and leave it unscanned.
    pub fn contents(&self, dir: &Arc<Directory>) -> io::Result<Arc<DirContents>> {
        dir.contents_with(|path| {
            let (contents, indexed) = self.list_directory(path)?;
            self.scans.fetch_add(1, Ordering::Relaxed);
            self.index_files(dir, indexed);
            Ok(contents)
        })
    }

    /// Convenience for `contents(&get_or_create(path))`.
    pub fn contents_of(&self, path: impl AsRef<Path>) -> io::Result<Arc<DirContents>> {
        let dir = self.get_or_create(path);
        self.contents(&dir)
    }

    /// Scan `root` and every directory below it.
    ///
    /// Sibling subtrees are scanned in parallel. Directory symlinks are
    /// followed, except one resolving to a directory already on the path
    /// from `root`: it stays listed in its parent's `sub_dirs` but is not
    /// descended into. The first I/O error aborts the walk and is returned.
    pub fn scan_tree(&self, root: impl AsRef<Path>) -> io::Result<ScanSummary> {
        let root = self.get_or_create(root);
        let summary = self.scan_subtree(&root, &[])?;

        info!(
            root = %root.path().display(),
            directories = summary.directories,
            files = summary.files,
            indexed_names = self.stats().indexed_names,
            "Directory tree scan complete"
        );

        Ok(summary)
    }

    /// `ancestors` holds the resolved paths of every directory above `dir`.
    fn scan_subtree(&self, dir: &Arc<Directory>, ancestors: &[PathBuf]) -> io::Result<ScanSummary> {
        let contents = self.contents(dir)?;

        let mut chain = ancestors.to_vec();
        chain.push(fs::canonicalize(dir.path())?);

        let mut children = Vec::with_capacity(contents.sub_dirs.len());
        for name in &contents.sub_dirs {
            let child_path = dir.path().join(name);
            let resolved = fs::canonicalize(&child_path)?;
            if chain.contains(&resolved) {
                warn!(
                    path = %child_path.display(),
                    target = %resolved.display(),
                    "Not descending into symlink cycle"
                );
                continue;
            }
            children.push(self.get_or_create(child_path));
        }

        let nested = children
            .par_iter()
            .map(|child| self.scan_subtree(child, &chain))
            .try_reduce(ScanSummary::default, |a, b| Ok(a.merge(b)))?;

        Ok(ScanSummary {
            directories: 1,
            files: contents.files.len(),
        }
        .merge(nested))
    }

    /// List `path`, returning its contents and the file names to index.
    fn list_directory(&self, path: &Path) -> io::Result<(DirContents, Vec<String>)> {
        let predicate = self.predicate.read().clone();
        let mut contents = DirContents::default();
        let mut indexed = Vec::new();

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_path = entry.path();

            // Follows symlinks; entries that cannot be stat'ed are neither
            // files nor directories.
            let metadata = match fs::metadata(&entry_path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!(path = %entry_path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if metadata.is_dir() {
                if name != VCS_DIR_NAME {
                    contents.sub_dirs.push(name);
                }
            } else if metadata.is_file() {
                if predicate.as_ref().is_some_and(|p| p.matches(&name)) {
                    indexed.push(name.clone());
                }
                contents.files.push(name);
            }
        }

        debug!(
            path = %path.display(),
            files = contents.files.len(),
            sub_dirs = contents.sub_dirs.len(),
            indexed = indexed.len(),
            "Scanned directory"
        );

        Ok((contents, indexed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::IndexPredicate;
    use tempfile::TempDir;

    fn create_tree(temp: &TempDir) {
        let root = temp.path();
        std::fs::create_dir_all(root.join("include/sub")).unwrap();
        std::fs::create_dir_all(root.join(".git/objects")).unwrap();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("include/util.h"), b"").unwrap();
        std::fs::write(root.join("include/sub/util.h"), b"").unwrap();
        std::fs::write(root.join("src/main.c"), b"").unwrap();
        std::fs::write(root.join("README"), b"").unwrap();
        std::fs::write(root.join(".git/HEAD"), b"").unwrap();
    }

    #[test]
    fn test_contents_lists_files_and_subdirs() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let registry = DirectoryRegistry::new();

        let contents = registry.contents_of(temp.path()).unwrap();

        assert_eq!(contents.files, vec!["README".to_string()]);
        let mut sub_dirs = contents.sub_dirs.clone();
        sub_dirs.sort();
        assert_eq!(sub_dirs, vec!["include".to_string(), "src".to_string()]);
    }

    #[test]
    fn test_git_directory_is_excluded() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let registry = DirectoryRegistry::with_predicate(IndexPredicate::glob("*").unwrap());

        registry.scan_tree(temp.path()).unwrap();

        let contents = registry.contents_of(temp.path()).unwrap();
        assert!(!contents.sub_dirs.iter().any(|d| d == VCS_DIR_NAME));
        // Nothing below .git was visited or indexed
        assert!(registry.directories_for("HEAD").is_empty());
        assert!(registry.get(temp.path().join(".git")).is_none());
    }

    #[test]
    fn test_contents_is_cached() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let registry = DirectoryRegistry::new();
        let dir = registry.get_or_create(temp.path().join("include"));

        let first = registry.contents(&dir).unwrap();
        std::fs::write(temp.path().join("include/late.h"), b"").unwrap();
        let second = registry.contents(&dir).unwrap();

        assert_eq!(first, second);
        assert!(!second.files.contains(&"late.h".to_string()));
        assert_eq!(registry.stats().scans, 1);
    }

    #[test]
    fn test_missing_directory_propagates_io_error() {
        let temp = TempDir::new().unwrap();
        let registry = DirectoryRegistry::new();
        let dir = registry.get_or_create(temp.path().join("missing"));

        let err = registry.contents(&dir).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!dir.is_scanned());
        assert_eq!(registry.stats().scans, 0);
    }

    #[test]
    fn test_no_predicate_means_no_index() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let registry = DirectoryRegistry::new();

        registry.scan_tree(temp.path()).unwrap();
        registry.scan_tree(temp.path()).unwrap();

        assert!(registry.is_index_empty());
    }

    #[test]
    fn test_predicate_selects_indexed_names() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let registry = DirectoryRegistry::with_predicate(IndexPredicate::glob("*.h").unwrap());

        registry.scan_tree(temp.path()).unwrap();

        assert_eq!(registry.indexed_names(), vec!["util.h".to_string()]);
        assert_eq!(registry.directories_for("util.h").len(), 2);
        assert!(registry.directories_for("main.c").is_empty());
    }

    #[test]
    fn test_late_predicate_is_not_retroactive() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let registry = DirectoryRegistry::new();

        registry.contents_of(temp.path().join("include")).unwrap();
        registry.set_index_predicate(IndexPredicate::glob("*.h").unwrap());
        registry.contents_of(temp.path().join("include/sub")).unwrap();

        let dirs = registry.directories_for("util.h");
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].path(), temp.path().join("include/sub"));
    }

    #[test]
    fn test_scan_tree_summary() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let registry = DirectoryRegistry::new();

        let summary = registry.scan_tree(temp.path()).unwrap();

        // root, include, include/sub, src
        assert_eq!(summary.directories, 4);
        // README, util.h, sub/util.h, main.c
        assert_eq!(summary.files, 4);
        assert_eq!(registry.stats().scans, 4);
    }

    #[test]
    fn test_rescanning_tree_does_not_duplicate_index_entries() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let registry = DirectoryRegistry::with_predicate(IndexPredicate::glob("*.h").unwrap());

        registry.scan_tree(temp.path()).unwrap();
        registry.scan_tree(temp.path()).unwrap();

        assert_eq!(registry.directories_for("util.h").len(), 2);
        assert_eq!(registry.stats().scans, 4);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_is_not_descended() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("a")).unwrap();
        std::fs::write(temp.path().join("a/x.h"), b"").unwrap();
        symlink("..", temp.path().join("a/loop")).unwrap();
        let registry = DirectoryRegistry::with_predicate(IndexPredicate::glob("*.h").unwrap());

        let summary = registry.scan_tree(temp.path()).unwrap();

        assert_eq!(summary.directories, 2);
        assert_eq!(summary.files, 1);
        assert_eq!(registry.directories_for("x.h").len(), 1);
        let a = registry.contents_of(temp.path().join("a")).unwrap();
        assert!(a.sub_dirs.contains(&"loop".to_string()));
        assert!(registry.get(temp.path().join("a/loop")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_links_to_several_ancestors_stay_bounded() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("a/b")).unwrap();
        std::fs::write(temp.path().join("a/b/x.h"), b"").unwrap();
        symlink("..", temp.path().join("a/b/up")).unwrap();
        symlink("../..", temp.path().join("a/b/top")).unwrap();
        let registry = DirectoryRegistry::with_predicate(IndexPredicate::glob("*.h").unwrap());

        let summary = registry.scan_tree(temp.path()).unwrap();

        // root, a, a/b
        assert_eq!(summary.directories, 3);
        assert_eq!(registry.directories_for("x.h").len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_sibling_is_followed() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("a")).unwrap();
        std::fs::write(temp.path().join("a/x.h"), b"").unwrap();
        symlink("a", temp.path().join("alias")).unwrap();
        let registry = DirectoryRegistry::with_predicate(IndexPredicate::glob("*.h").unwrap());

        registry.scan_tree(temp.path()).unwrap();

        let mut dirs: Vec<_> = registry
            .directories_for("x.h")
            .iter()
            .map(|d| d.path().to_path_buf())
            .collect();
        dirs.sort();
        assert_eq!(dirs, vec![temp.path().join("a"), temp.path().join("alias")]);
    }
}
