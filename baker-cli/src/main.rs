//! Baker CLI - resolve file names against scanned source trees
//!
//! ```text
//! baker scan -r src -p '*.h' --list
//! baker resolve sub/util.h -r src -p '*.h' --closest-to src/app
//! baker props set --dir src/lib built true
//! baker config init
//! ```

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use baker::config::{config_file_path, ConfigFile};
use baker::diagnostics::{Diagnostics, DiagnosticsConfig};
use clap::{ArgAction, Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::props::PropsAction;
use commands::resolve::ResolveArgs;
use commands::scan::ScanArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "baker", version, about = "Resolve bare file names to the directories that contain them")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ~/.baker/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print warnings
    #[arg(long, global = true)]
    warnings: bool,

    /// Treat warnings as errors
    #[arg(long, global = true)]
    fail_on_warning: bool,

    /// Report errors without failing the build
    #[arg(long, global = true)]
    ignore_errors: bool,

    /// Report side effects instead of performing them
    #[arg(short = 'n', long, global = true)]
    no_action: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan directory trees and report the file index
    Scan(ScanArgs),

    /// Find the directories containing a file
    Resolve(ResolveArgs),

    /// Inspect or edit persisted properties
    Props {
        #[command(subcommand)]
        action: PropsAction,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Cli {
    /// Merge command-line flags over the configured diagnostics settings.
    fn diagnostics_config(&self, config: &ConfigFile) -> DiagnosticsConfig {
        let mut settings = config.diagnostics.clone();
        settings.verbose |= self.verbose > 0;
        settings.warnings |= self.warnings || self.fail_on_warning;
        settings.fail_on_warning |= self.fail_on_warning;
        settings.ignore_errors |= self.ignore_errors;
        settings.no_action |= self.no_action;
        settings
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    baker::logging::init_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(config_file_path);
    let config = match ConfigFile::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            let diagnostics = Diagnostics::new(DiagnosticsConfig::default());
            diagnostics.fatal(&e.to_string(), None);
            return ExitCode::FAILURE;
        }
    };
    let diagnostics = Diagnostics::new(cli.diagnostics_config(&config));

    match run(cli.command, &config_path, &config, &diagnostics) {
        Ok(()) => ExitCode::SUCCESS,
        // Already reported when it escalated
        Err(CliError::Escalated(_)) => ExitCode::FAILURE,
        Err(e) => {
            diagnostics.fatal(&e.to_string(), None);
            ExitCode::FAILURE
        }
    }
}

fn run(
    command: Commands,
    config_path: &std::path::Path,
    config: &ConfigFile,
    diagnostics: &Diagnostics,
) -> Result<(), CliError> {
    match command {
        Commands::Scan(args) => commands::scan::run(args, config),
        Commands::Resolve(args) => commands::resolve::run(args, config, diagnostics),
        Commands::Props { action } => commands::props::run(action, diagnostics),
        Commands::Config { command } => commands::config::run(command, config_path, config),
    }
}
