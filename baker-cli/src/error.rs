//! CLI error type.

use std::fmt;
use std::io;
use std::path::PathBuf;

use baker::config::ConfigError;
use baker::properties::PropertyError;
use baker::registry::PredicateError;

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded, parsed or saved.
    Config(ConfigError),

    /// The index pattern given on the command line is invalid.
    Predicate(PredicateError),

    /// A directory could not be scanned.
    Scan { path: PathBuf, source: io::Error },

    /// A filesystem path could not be accessed.
    Io { path: PathBuf, source: io::Error },

    /// A property store could not be read or written.
    Properties(PropertyError),

    /// The query matched no indexed file.
    NotFound(String),

    /// A diagnostic escalated to a build failure.
    Escalated(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Predicate(e) => write!(f, "{}", e),
            CliError::Scan { path, source } => {
                write!(f, "failed to scan {}: {}", path.display(), source)
            }
            CliError::Io { path, source } => {
                write!(f, "failed to access {}: {}", path.display(), source)
            }
            CliError::Properties(e) => write!(f, "{}", e),
            CliError::NotFound(query) => write!(f, "cannot find '{}' in any scanned directory", query),
            CliError::Escalated(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Predicate(e) => Some(e),
            CliError::Scan { source, .. } => Some(source),
            CliError::Io { source, .. } => Some(source),
            CliError::Properties(e) => Some(e),
            CliError::NotFound(_) | CliError::Escalated(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<PredicateError> for CliError {
    fn from(e: PredicateError) -> Self {
        CliError::Predicate(e)
    }
}

impl From<PropertyError> for CliError {
    fn from(e: PropertyError) -> Self {
        CliError::Properties(e)
    }
}

impl From<baker::diagnostics::Escalation> for CliError {
    fn from(e: baker::diagnostics::Escalation) -> Self {
        CliError::Escalated(e.to_string())
    }
}
