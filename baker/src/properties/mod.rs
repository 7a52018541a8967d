//! Persisted key/value properties for files and directories.
//!
//! Build steps record small facts between runs (last seen hash, generated
//! dependency lists, ...) in JSON files. A [`PropertyStore`] wraps one such
//! file; [`PropertyStores`] hands out exactly one store per backing path.
//!
//! # File format
//!
//! ```text
//! {
//!     "deps": [
//!         "util.h"
//!     ],
//!     "hash": "0f3a"
//! }
//! ```
//!
//! Keys are written sorted with four-space indentation and a trailing
//! newline. Files are rewritten only when a value changed since load.
//!
//! # Example
//!
//! ```no_run
//! use baker::properties::PropertyStores;
//! use serde_json::json;
//!
//! let stores = PropertyStores::new();
//! let doh = stores.for_directory("src/lib").unwrap();
//! doh.lock().set("built", json!(true));
//! stores.flush_all().unwrap();
//! ```

mod error;
mod store;

pub use error::{PropertyError, PropertyResult};
pub use store::{PropertyStore, PropertyStores, SharedStore, DOH_FILE_NAME};
