//! Index predicates decide which file names enter the reverse file index.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

/// Errors raised while building an index predicate.
#[derive(Debug, Error)]
pub enum PredicateError {
    /// The regular expression did not compile.
    #[error("Invalid index regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The glob pattern did not parse.
    #[error("Invalid index glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// The pattern syntax name was not recognised.
    #[error("Unknown pattern syntax '{0}' (expected 'glob' or 'regex')")]
    UnknownSyntax(String),
}

/// Pattern language of an index predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternSyntax {
    /// Shell-style glob such as `*.h`.
    #[default]
    Glob,
    /// Regular expression, anchored at the start of the file name.
    Regex,
}

impl fmt::Display for PatternSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSyntax::Glob => write!(f, "glob"),
            PatternSyntax::Regex => write!(f, "regex"),
        }
    }
}

impl FromStr for PatternSyntax {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "glob" => Ok(PatternSyntax::Glob),
            "regex" | "re" => Ok(PatternSyntax::Regex),
            other => Err(PredicateError::UnknownSyntax(other.to_string())),
        }
    }
}

/// Rule selecting which file names are indexed during scans.
#[derive(Debug, Clone)]
pub enum IndexPredicate {
    /// Regular expression; `source` is the pattern as given.
    Regex { source: String, compiled: Regex },
    /// Glob pattern.
    Glob(glob::Pattern),
}

impl IndexPredicate {
    /// Build a regex predicate.
    ///
    /// The expression must match at the start of the name but need not span
    /// all of it, so `util` matches `util.h` while `\.h` matches nothing.
    pub fn regex(pattern: &str) -> Result<Self, PredicateError> {
        let compiled = Regex::new(&format!("^(?:{})", pattern)).map_err(|source| {
            PredicateError::InvalidRegex {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        Ok(IndexPredicate::Regex {
            source: pattern.to_string(),
            compiled,
        })
    }

    /// Build a glob predicate matched against the whole file name.
    pub fn glob(pattern: &str) -> Result<Self, PredicateError> {
        glob::Pattern::new(pattern)
            .map(IndexPredicate::Glob)
            .map_err(|source| PredicateError::InvalidGlob {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Build a predicate in the given syntax.
    pub fn parse(syntax: PatternSyntax, pattern: &str) -> Result<Self, PredicateError> {
        match syntax {
            PatternSyntax::Glob => Self::glob(pattern),
            PatternSyntax::Regex => Self::regex(pattern),
        }
    }

    /// Whether `file_name` should be indexed.
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            IndexPredicate::Regex { compiled, .. } => compiled.is_match(file_name),
            IndexPredicate::Glob(pattern) => pattern.matches(file_name),
        }
    }

    /// The pattern text as supplied.
    pub fn as_str(&self) -> &str {
        match self {
            IndexPredicate::Regex { source, .. } => source,
            IndexPredicate::Glob(pattern) => pattern.as_str(),
        }
    }

    /// Pattern language of this predicate.
    pub fn syntax(&self) -> PatternSyntax {
        match self {
            IndexPredicate::Regex { .. } => PatternSyntax::Regex,
            IndexPredicate::Glob(_) => PatternSyntax::Glob,
        }
    }
}

impl fmt::Display for IndexPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.syntax(), self.as_str())
    }
}
