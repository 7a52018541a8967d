//! Resolve command - find the directories a file query refers to.

use baker::config::ConfigFile;
use baker::diagnostics::Diagnostics;
use clap::Args;

use super::common::IndexArgs;
use crate::error::CliError;

/// Arguments for `baker resolve`.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// File name, relative path (e.g. sub/util.h) or absolute path
    pub query: String,

    /// Prefer directories sharing the longest path prefix with this path
    #[arg(short, long, value_name = "PATH")]
    pub closest_to: Option<String>,

    /// Print paths relative to the current directory
    #[arg(long)]
    pub relative: bool,

    #[command(flatten)]
    pub index: IndexArgs,
}

/// Run the resolve command.
pub fn run(args: ResolveArgs, config: &ConfigFile, diagnostics: &Diagnostics) -> Result<(), CliError> {
    for line in resolve_lines(&args, config, diagnostics)? {
        println!("{}", line);
    }
    Ok(())
}

/// One output line per matching directory.
fn resolve_lines(
    args: &ResolveArgs,
    config: &ConfigFile,
    diagnostics: &Diagnostics,
) -> Result<Vec<String>, CliError> {
    let registry = args.index.build_registry(config)?;

    let Some(dirs) = registry.find_file_in_directories(&args.query, args.closest_to.as_deref())
    else {
        return Err(CliError::NotFound(args.query.clone()));
    };

    if dirs.len() > 1 {
        diagnostics.warn(
            &format!(
                "'{}' is ambiguous: {} directories match",
                args.query,
                dirs.len()
            ),
            None,
        )?;
    }

    dirs.iter()
        .map(|dir| {
            if args.relative {
                let rel = dir.relpath_from_cwd().map_err(|source| CliError::Io {
                    path: dir.path().to_path_buf(),
                    source,
                })?;
                Ok(rel.display().to_string())
            } else {
                Ok(dir.path().display().to_string())
            }
        })
        .collect()
}
