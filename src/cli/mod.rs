//! Command-line interface for Reprise.
//!
//! This module provides the CLI argument parsing using clap's derive macros
//! and command implementations.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, DeleteArgs, ExportArgs, ImportArgs, KindArg, ListArgs, MarketArgs,
    MarketSubcommand, RunArgs,
};
pub use commands::{default_data_dir, Command, CommandDispatcher, CommandResult};
