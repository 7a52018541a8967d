//! File resolution against the reverse file index.
//!
//! ```text
//! "sub/util.h"  ──split──▶  dir_suffix = "sub", file_name = "util.h"
//!                                         │
//!            file_index["util.h"] = [/p1, /p2/sub]
//!                                         │ suffix filter: ends with "/sub"
//!                                         ▼
//!                                  [/p2]  (parent of the matched suffix)
//!                                         │ closest-prefix tie-break
//!                                         ▼
//!                                  result set (never empty)
//! ```
//!
//! Paths are compared as strings, not as parsed components: a candidate
//! matches when its path text ends with a separator followed by the suffix
//! text. Neither side is normalized first, so `..` or doubled separators in
//! registered paths take part in the comparison literally.

use std::path::{Path, MAIN_SEPARATOR, MAIN_SEPARATOR_STR};
use std::sync::Arc;

use tracing::debug;

use super::DirectoryRegistry;
use crate::directory::Directory;

impl DirectoryRegistry {
    /// Find the directories a path-like query refers to.
    ///
    /// - An absolute `file_path` (leading separator) resolves to its parent
    ///   directory if the file exists, without consulting the index.
    /// - Otherwise the final component is looked up in the reverse index.
    ///   Leading components, if any, must match the end of a candidate's
    ///   path, and the result is the directory above that matched suffix.
    /// - With several candidates and a `closest_to` path, only the ones
    ///   sharing the longest leading character run with it are kept.
    ///
    /// Returns `None` when nothing matches; a returned set is never empty.
    pub fn find_file_in_directories(
        &self,
        file_path: &str,
        closest_to: Option<&str>,
    ) -> Option<Vec<Arc<Directory>>> {
        if file_path.starts_with(MAIN_SEPARATOR) {
            return self.resolve_absolute(file_path);
        }

        let (dir_suffix, file_name) = split_query(file_path);
        let file_dirs = self.directories_for(file_name);
        if file_dirs.is_empty() {
            debug!(file_name, "File name not in index");
            return None;
        }

        let candidates = if dir_suffix.is_empty() {
            file_dirs
        } else {
            let parents: Vec<Arc<Directory>> = file_dirs
                .iter()
                .filter_map(|dir| {
                    let path = dir.path_str();
                    strip_dir_suffix(&path, dir_suffix).map(|parent| self.get_or_create(parent))
                })
                .collect();

            if parents.is_empty() {
                debug!(
                    file_name,
                    dir_suffix,
                    candidates = file_dirs.len(),
                    "No candidate matches directory suffix"
                );
                return None;
            }
            parents
        };

        let closest_to = match closest_to {
            Some(reference) if candidates.len() > 1 => reference,
            _ => return Some(candidates),
        };

        let scored: Vec<(usize, Arc<Directory>)> = candidates
            .into_iter()
            .map(|dir| (common_prefix_len(&dir.path_str(), closest_to), dir))
            .collect();
        let best = scored.iter().map(|(len, _)| *len).max().unwrap_or(0);

        let closest: Vec<Arc<Directory>> = scored
            .into_iter()
            .filter(|(len, _)| *len == best)
            .map(|(_, dir)| dir)
            .collect();

        debug!(
            file_path,
            closest_to,
            prefix_len = best,
            results = closest.len(),
            "Resolved by closest prefix"
        );

        Some(closest)
    }

    fn resolve_absolute(&self, file_path: &str) -> Option<Vec<Arc<Directory>>> {
        let path = Path::new(file_path);
        if !path.exists() {
            debug!(file_path, "Absolute path does not exist");
            return None;
        }

        let parent = path.parent()?;
        Some(vec![self.get_or_create(parent)])
    }
}

/// Split a query into `(dir_suffix, file_name)` at the last separator.
///
/// `dir_suffix` is empty for a bare name.
pub fn split_query(file_path: &str) -> (&str, &str) {
    match file_path.rfind(MAIN_SEPARATOR) {
        Some(at) => (&file_path[..at], &file_path[at + MAIN_SEPARATOR.len_utf8()..]),
        None => ("", file_path),
    }
}

/// If `candidate` ends with `<separator><dir_suffix>`, return what precedes it.
///
/// An empty remainder means the suffix started at the root, which is
/// returned as the bare separator.
pub fn strip_dir_suffix<'a>(candidate: &'a str, dir_suffix: &str) -> Option<&'a str> {
    let head = candidate.strip_suffix(dir_suffix)?;
    let parent = head.strip_suffix(MAIN_SEPARATOR)?;
    if parent.is_empty() {
        Some(MAIN_SEPARATOR_STR)
    } else {
        Some(parent)
    }
}

/// Number of leading characters `a` and `b` have in common.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}
