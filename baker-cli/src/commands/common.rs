//! Options and helpers shared across CLI commands.

use std::path::PathBuf;

use baker::config::ConfigFile;
use baker::registry::{DirectoryRegistry, IndexPredicate, PatternSyntax};
use clap::Args;

use crate::error::CliError;

/// Index and scan options for commands that need a populated registry.
#[derive(Debug, Clone, Args)]
pub struct IndexArgs {
    /// Directory tree to scan (repeatable; defaults to [scan] roots, then ".")
    #[arg(short, long = "root", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Pattern selecting indexed file names (overrides [index] pattern)
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Treat --pattern as a regular expression instead of a glob
    #[arg(long)]
    pub regex: bool,
}

impl IndexArgs {
    /// Predicate from CLI args, falling back to the config file.
    pub fn predicate(&self, config: &ConfigFile) -> Result<Option<IndexPredicate>, CliError> {
        match &self.pattern {
            Some(pattern) => {
                let syntax = if self.regex {
                    PatternSyntax::Regex
                } else {
                    PatternSyntax::Glob
                };
                Ok(Some(IndexPredicate::parse(syntax, pattern)?))
            }
            None => Ok(config.index_predicate()?),
        }
    }

    /// Roots from CLI args, then config, then the current directory.
    pub fn roots(&self, config: &ConfigFile) -> Vec<PathBuf> {
        if !self.roots.is_empty() {
            self.roots.clone()
        } else if !config.scan.roots.is_empty() {
            config.scan.roots.clone()
        } else {
            vec![PathBuf::from(".")]
        }
    }

    /// Install the predicate and scan every root.
    pub fn build_registry(&self, config: &ConfigFile) -> Result<DirectoryRegistry, CliError> {
        let registry = DirectoryRegistry::new();
        match self.predicate(config)? {
            Some(predicate) => registry.set_index_predicate(predicate),
            None => tracing::warn!("No index pattern configured; nothing will be indexed"),
        }

        for root in self.roots(config) {
            registry
                .scan_tree(&root)
                .map_err(|source| CliError::Scan { path: root, source })?;
        }

        Ok(registry)
    }
}
