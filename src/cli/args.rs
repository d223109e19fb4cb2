//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::market::DEFAULT_MARKET_URL;
use crate::package::PackageKind;

/// Reprise - desktop macro recording and replay.
#[derive(Debug, Parser)]
#[command(name = "reprise")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding the stores and images (defaults to ~/.reprise)
    #[arg(long, global = true, env = "REPRISE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List stored components and assemblies
    List(ListArgs),

    /// Replay a stored assembly (or component with --component)
    Run(RunArgs),

    /// Delete a stored component or assembly
    Delete(DeleteArgs),

    /// Export a stored item to a package archive
    Export(ExportArgs),

    /// Import a package archive into the store
    Import(ImportArgs),

    /// Marketplace operations
    Market(MarketArgs),
}

/// Which store an item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Component,
    Assembly,
}

impl From<KindArg> for PackageKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Component => PackageKind::Component,
            KindArg::Assembly => PackageKind::Assembly,
        }
    }
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Name of the assembly to run
    pub name: String,

    /// Run a component instead of an assembly
    #[arg(long)]
    pub component: bool,
}

/// Arguments for the `delete` command.
#[derive(Debug, Clone, clap::Args)]
pub struct DeleteArgs {
    /// Which store to delete from
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Name of the item
    pub name: String,
}

/// Arguments for the `export` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ExportArgs {
    /// Which store the item lives in
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Name of the item to export
    pub name: String,

    /// Destination archive path (defaults to <name>.zip)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Author recorded in the package metadata
    #[arg(long, default_value = "")]
    pub author: String,

    /// Description recorded in the package metadata
    #[arg(long, default_value = "")]
    pub description: String,

    /// Price recorded in the package metadata
    #[arg(long, default_value_t = 0)]
    pub price: i64,
}

/// Arguments for the `import` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ImportArgs {
    /// Which store to import into
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Path to the package archive
    pub archive: PathBuf,

    /// Store the item under this name instead of the packaged one
    #[arg(long)]
    pub rename: Option<String>,
}

/// Arguments for the marketplace command group.
#[derive(Debug, Clone, clap::Args)]
pub struct MarketArgs {
    /// Marketplace service URL
    #[arg(long, env = "REPRISE_MARKET_URL", default_value = DEFAULT_MARKET_URL)]
    pub url: String,

    /// Bearer token from an earlier login
    #[arg(long, env = "REPRISE_MARKET_TOKEN")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: MarketSubcommand,
}

/// Marketplace subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum MarketSubcommand {
    /// Create an account
    Register {
        /// Account id
        #[arg(long)]
        user: String,
        /// Account password
        #[arg(long)]
        password: String,
    },
    /// Log in and print the bearer token for later calls
    Login {
        /// Account id
        #[arg(long)]
        user: String,
        /// Account password
        #[arg(long)]
        password: String,
    },
    /// Show the point balance
    Points,
    /// List published items
    List {
        /// Which kind of item to list
        #[arg(value_enum, default_value = "assembly")]
        kind: KindArg,
    },
    /// Package a stored item and publish it for sale
    Publish {
        /// Which store the item lives in
        #[arg(value_enum)]
        kind: KindArg,
        /// Name of the item to publish
        name: String,
        /// Author shown in the listing
        #[arg(long, default_value = "")]
        author: String,
        /// Description shown in the listing
        #[arg(long, default_value = "")]
        description: String,
        /// Asking price in points
        #[arg(long, default_value_t = 0)]
        price: i64,
    },
    /// Buy an item and import it into the store
    Purchase {
        /// Which store to import into
        #[arg(value_enum)]
        kind: KindArg,
        /// Marketplace item id
        item_id: i64,
    },
}
