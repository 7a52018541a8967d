//! Error types for property stores.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for property store operations.
pub type PropertyResult<T> = Result<T, PropertyError>;

/// Errors that can occur while loading or flushing property stores.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// A store for this file has already been constructed.
    #[error("Properties for file {} have already been read", .0.display())]
    AlreadyLoaded(PathBuf),

    /// The backing file exists but is not a JSON object.
    #[error("Can't understand contents of {}:\n'{contents}'", .path.display())]
    Malformed { path: PathBuf, contents: String },

    /// Failed to read the backing file.
    #[error("Failed to read {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write the backing file.
    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
