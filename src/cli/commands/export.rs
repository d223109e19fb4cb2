//! Export command implementation.
//!
//! The `reprise export` command writes a stored item to a package archive.

use std::path::{Path, PathBuf};

use crate::cli::args::ExportArgs;
use crate::engine::Engine;
use crate::error::Result;
use crate::input::TraceInput;
use crate::package::ExportOptions;

use super::dispatcher::{Command, CommandResult};

/// The export command implementation.
pub struct ExportCommand {
    data_dir: PathBuf,
    args: ExportArgs,
}

impl ExportCommand {
    /// Create a new export command.
    pub fn new(data_dir: &Path, args: ExportArgs) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            args,
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Destination archive path, defaulting to `<name>.zip` in the current
    /// directory.
    pub fn out_path(&self) -> PathBuf {
        self.args
            .out
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.zip", self.args.name)))
    }
}

impl Command for ExportCommand {
    fn execute(&self) -> Result<CommandResult> {
        let engine = Engine::open(&self.data_dir, TraceInput::new())?;

        let kind = self.args.kind.into();
        let opts = ExportOptions {
            author: self.args.author.clone(),
            description: self.args.description.clone(),
            price: self.args.price,
        };
        let out = self.out_path();

        engine.export_package(kind, &self.args.name, &opts, &out)?;

        println!("Exported {} '{}' to {}", kind, self.args.name, out.display());
        Ok(CommandResult::success())
    }
}
