//! Baker - directory registry and file resolution for build logic
//!
//! This library lets build rules resolve bare file names (an included header,
//! an imported module) to the directory that actually contains them, without
//! knowing the source tree layout in advance.
//!
//! # Overview
//!
//! - [`registry::DirectoryRegistry`] owns exactly one [`directory::Directory`]
//!   per path, scans directories on demand and maintains a reverse index from
//!   file name to the directories that contain it.
//! - [`registry::DirectoryRegistry::find_file_in_directories`] answers
//!   "which directory holds `sub/util.h`?", optionally preferring candidates
//!   closest to a reference path.
//! - [`properties`] persists per-file and per-directory metadata as JSON.
//! - [`diagnostics`] formats build messages and decides when they abort.
//!
//! # Example
//!
//! ```no_run
//! use baker::registry::{DirectoryRegistry, IndexPredicate};
//!
//! let registry = DirectoryRegistry::new();
//! registry.set_index_predicate(IndexPredicate::glob("*.h").unwrap());
//! registry.scan_tree("src").unwrap();
//!
//! if let Some(dirs) = registry.find_file_in_directories("sub/util.h", Some("src/app")) {
//!     for dir in dirs {
//!         println!("{}", dir.path().display());
//!     }
//! }
//! ```

pub mod config;
pub mod diagnostics;
pub mod directory;
pub mod logging;
pub mod properties;
pub mod registry;

/// Library version, used in diagnostics and the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
