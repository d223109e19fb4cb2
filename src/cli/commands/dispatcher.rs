//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::error::Result;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Default data directory: `~/.reprise`, or `.reprise` in the current
/// directory when no home is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".reprise"))
        .unwrap_or_else(|| PathBuf::from(".reprise"))
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    data_dir: PathBuf,
}

impl CommandDispatcher {
    /// Create a new dispatcher over the given data directory.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli) -> Result<CommandResult> {
        match &cli.command {
            Commands::List(args) => {
                let cmd = super::list::ListCommand::new(&self.data_dir, args.clone());
                cmd.execute()
            }
            Commands::Run(args) => {
                let cmd = super::run::RunCommand::new(&self.data_dir, args.clone());
                cmd.execute()
            }
            Commands::Delete(args) => {
                let cmd = super::delete::DeleteCommand::new(&self.data_dir, args.clone());
                cmd.execute()
            }
            Commands::Export(args) => {
                let cmd = super::export::ExportCommand::new(&self.data_dir, args.clone());
                cmd.execute()
            }
            Commands::Import(args) => {
                let cmd = super::import::ImportCommand::new(&self.data_dir, args.clone());
                cmd.execute()
            }
            Commands::Market(args) => {
                let cmd = super::market::MarketCommand::new(&self.data_dir, args.clone());
                cmd.execute()
            }
        }
    }
}
