//! Scan command - index directory trees and report what was found.

use baker::config::ConfigFile;
use clap::Args;

use super::common::IndexArgs;
use crate::error::CliError;

/// Arguments for `baker scan`.
#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub index: IndexArgs,

    /// List every indexed file name with the directories containing it
    #[arg(short, long)]
    pub list: bool,
}

/// Run the scan command.
pub fn run(args: ScanArgs, config: &ConfigFile) -> Result<(), CliError> {
    for line in report_lines(&args, config)? {
        println!("{}", line);
    }
    Ok(())
}

fn report_lines(args: &ScanArgs, config: &ConfigFile) -> Result<Vec<String>, CliError> {
    let registry = args.index.build_registry(config)?;
    let stats = registry.stats();

    let mut lines = vec![format!("Scanned {} directories", stats.scans)];
    match registry.index_predicate() {
        Some(predicate) => lines.push(format!("Index pattern: {}", predicate)),
        None => lines.push("Index pattern: (not set)".to_string()),
    }
    lines.push(format!("Indexed names: {}", stats.indexed_names));

    if args.list {
        lines.push(String::new());
        for name in registry.indexed_names() {
            let dirs = registry.directories_for(&name);
            lines.push(name);
            for dir in dirs {
                lines.push(format!("  {}", dir.path().display()));
            }
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scan_args(temp: &TempDir, pattern: Option<&str>, list: bool) -> ScanArgs {
        ScanArgs {
            index: IndexArgs {
                roots: vec![temp.path().to_path_buf()],
                pattern: pattern.map(str::to_string),
                regex: false,
            },
            list,
        }
    }

    #[test]
    fn test_report_lists_indexed_names() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("inc")).unwrap();
        std::fs::write(temp.path().join("inc/util.h"), b"").unwrap();
        std::fs::write(temp.path().join("main.c"), b"").unwrap();

        let lines = report_lines(&scan_args(&temp, Some("*.h"), true), &ConfigFile::default()).unwrap();

        assert_eq!(
            lines,
            vec![
                "Scanned 2 directories".to_string(),
                "Index pattern: glob:*.h".to_string(),
                "Indexed names: 1".to_string(),
                String::new(),
                "util.h".to_string(),
                format!("  {}", temp.path().join("inc").display()),
            ]
        );
    }

    #[test]
    fn test_report_without_pattern() {
        let temp = TempDir::new().unwrap();

        let lines = report_lines(&scan_args(&temp, None, false), &ConfigFile::default()).unwrap();

        assert_eq!(lines[1], "Index pattern: (not set)");
        assert_eq!(lines[2], "Indexed names: 0");
    }

    #[test]
    fn test_missing_root_fails() {
        let temp = TempDir::new().unwrap();
        let mut args = scan_args(&temp, Some("*.h"), false);
        args.index.roots = vec![temp.path().join("missing")];

        assert!(matches!(
            report_lines(&args, &ConfigFile::default()),
            Err(CliError::Scan { .. })
        ));
    }
}
