//! Configuration file handling.
//!
//! Settings live in an INI file, by default `~/.baker/config.ini`:
//!
//! ```ini
//! [index]
//! pattern = *.h
//! syntax = glob
//!
//! [scan]
//! roots = src, include
//!
//! [diagnostics]
//! verbose = false
//! warnings = true
//! fail_on_warning = false
//! ignore_errors = false
//! ```
//!
//! A missing file yields [`ConfigFile::default`]. Command-line flags are
//! applied on top by the CLI.

use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::diagnostics::DiagnosticsConfig;
use crate::registry::{IndexPredicate, PatternSyntax, PredicateError};

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("Failed to load config {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// In-memory INI text did not parse.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ini::ParseError),

    /// A key held a value of the wrong shape.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// The index pattern did not compile.
    #[error(transparent)]
    Predicate(#[from] PredicateError),

    /// Failed to write the file.
    #[error("Failed to write config {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Default configuration file path (`~/.baker/config.ini`).
pub fn config_file_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".baker")
        .join("config.ini")
}

/// `[index]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSettings {
    /// Pattern selecting indexed file names; unset disables indexing.
    pub pattern: Option<String>,
    /// Pattern language of `pattern`.
    pub syntax: PatternSyntax,
}

/// `[scan]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSettings {
    /// Directory trees scanned before resolving.
    pub roots: Vec<PathBuf>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub index: IndexSettings,
    pub scan: ScanSettings,
    pub diagnostics: DiagnosticsConfig,
}

impl ConfigFile {
    /// Load from [`config_file_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, or return defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("index")) {
            config.index.pattern = section
                .get("pattern")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string);
            if let Some(syntax) = section.get("syntax") {
                config.index.syntax = syntax.parse()?;
            }
        }

        if let Some(section) = ini.section(Some("scan")) {
            if let Some(roots) = section.get("roots") {
                config.scan.roots = roots
                    .split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
        }

        if let Some(section) = ini.section(Some("diagnostics")) {
            let flag = |key: &str, current: bool| -> Result<bool, ConfigError> {
                match section.get(key) {
                    Some(value) => parse_bool(&format!("diagnostics.{}", key), value),
                    None => Ok(current),
                }
            };

            let d = &mut config.diagnostics;
            d.verbose = flag("verbose", d.verbose)?;
            d.warnings = flag("warnings", d.warnings)?;
            d.fail_on_warning = flag("fail_on_warning", d.fail_on_warning)?;
            d.ignore_errors = flag("ignore_errors", d.ignore_errors)?;
            d.no_action = flag("no_action", d.no_action)?;
            d.identify = section
                .get("identify")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }

        Ok(config)
    }

    /// Build the configured index predicate, if a pattern is set.
    pub fn index_predicate(&self) -> Result<Option<IndexPredicate>, ConfigError> {
        self.index
            .pattern
            .as_deref()
            .map(|pattern| IndexPredicate::parse(self.index.syntax, pattern))
            .transpose()
            .map_err(ConfigError::from)
    }

    /// Render as INI.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("index"))
            .set("pattern", self.index.pattern.clone().unwrap_or_default())
            .set("syntax", self.index.syntax.to_string());

        let roots: Vec<String> = self
            .scan
            .roots
            .iter()
            .map(|r| r.display().to_string())
            .collect();
        ini.with_section(Some("scan")).set("roots", roots.join(", "));

        let d = &self.diagnostics;
        ini.with_section(Some("diagnostics"))
            .set("verbose", d.verbose.to_string())
            .set("warnings", d.warnings.to_string())
            .set("fail_on_warning", d.fail_on_warning.to_string())
            .set("ignore_errors", d.ignore_errors.to_string())
            .set("no_action", d.no_action.to_string())
            .set("identify", d.identify.clone().unwrap_or_default());

        ini
    }

    /// Write to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
