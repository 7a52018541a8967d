//! Configuration management CLI commands.

use std::path::Path;

use baker::config::ConfigFile;
use clap::Subcommand;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration as INI
    Show,

    /// Write a configuration file with current values if none exists
    Init,
}

/// Run a config subcommand against the file at `path`.
pub fn run(command: ConfigCommands, path: &Path, config: &ConfigFile) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Show => {
            let mut out = Vec::new();
            config
                .to_ini()
                .write_to(&mut out)
                .map_err(|source| CliError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            print!("{}", String::from_utf8_lossy(&out));
        }
        ConfigCommands::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                config.save_to(path)?;
                println!("Configuration file: {}", path.display());
                println!();
                println!("Edit this file to customize index and diagnostics settings.");
                println!("CLI arguments override config file values when specified.");
            }
        }
    }
    Ok(())
}
