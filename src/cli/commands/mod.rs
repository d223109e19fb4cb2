//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`reprise run`, `reprise list`)
//! - Shared initialization logic
//! - Consistent global flag handling

pub mod delete;
pub mod dispatcher;
pub mod export;
pub mod import;
pub mod list;
pub mod market;
pub mod run;

pub use dispatcher::{default_data_dir, Command, CommandDispatcher, CommandResult};
