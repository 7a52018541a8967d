//! Property store CLI commands.
//!
//! Provides `props get`, `props set` and `props list` for inspecting and
//! editing the JSON properties persisted for a file or a directory.

use std::path::{Path, PathBuf};

use baker::diagnostics::Diagnostics;
use baker::properties::{PropertyStores, SharedStore};
use clap::Subcommand;
use serde_json::Value;

use crate::error::CliError;

/// Props subcommands.
#[derive(Debug, Subcommand)]
pub enum PropsAction {
    /// Print a property value as JSON
    Get {
        /// Property file, or a directory with --dir
        target: PathBuf,

        /// Property name
        name: String,

        /// Use the directory's baker.doh store
        #[arg(long)]
        dir: bool,
    },

    /// Set a property (VALUE is parsed as JSON, else stored as a string)
    Set {
        /// Property file, or a directory with --dir
        target: PathBuf,

        /// Property name
        name: String,

        /// New value
        value: String,

        /// Use the directory's baker.doh store
        #[arg(long)]
        dir: bool,
    },

    /// List all properties
    List {
        /// Property file, or a directory with --dir
        target: PathBuf,

        /// Use the directory's baker.doh store
        #[arg(long)]
        dir: bool,
    },
}

/// Run a props subcommand.
pub fn run(action: PropsAction, diagnostics: &Diagnostics) -> Result<(), CliError> {
    let stores = PropertyStores::new();

    match action {
        PropsAction::Get { target, name, dir } => {
            let store = open(&stores, &target, dir)?;
            let store = store.lock();
            match store.get(&name) {
                Some(value) => println!("{}", value),
                None => println!("(not set)"),
            }
        }
        PropsAction::Set {
            target,
            name,
            value,
            dir,
        } => {
            let store = open(&stores, &target, dir)?;
            let path = store.lock().path().to_path_buf();
            store.lock().set(name.clone(), parse_value(&value));

            if diagnostics.take_action(&format!("write {}", path.display())) {
                stores.flush_all()?;
                println!("Set {} = {}", name, value);
            }
        }
        PropsAction::List { target, dir } => {
            let store = open(&stores, &target, dir)?;
            let store = store.lock();
            if store.is_empty() {
                println!("(no properties)");
            }
            for name in store.names() {
                if let Some(value) = store.get(name) {
                    println!("{} = {}", name, value);
                }
            }
        }
    }

    Ok(())
}

fn open(stores: &PropertyStores, target: &Path, dir: bool) -> Result<SharedStore, CliError> {
    let store = if dir {
        stores.for_directory(target)?
    } else {
        stores.get_or_load(target)?
    };
    Ok(store)
}

/// Interpret a CLI value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
