//! CLI subcommands.

pub mod common;
pub mod config;
pub mod props;
pub mod resolve;
pub mod scan;
