//! Delete command implementation.
//!
//! The `reprise delete` command removes a stored component or assembly.

use std::path::{Path, PathBuf};

use crate::cli::args::{DeleteArgs, KindArg};
use crate::engine::Engine;
use crate::error::Result;
use crate::input::TraceInput;

use super::dispatcher::{Command, CommandResult};

/// The delete command implementation.
pub struct DeleteCommand {
    data_dir: PathBuf,
    args: DeleteArgs,
}

impl DeleteCommand {
    /// Create a new delete command.
    pub fn new(data_dir: &Path, args: DeleteArgs) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            args,
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Command for DeleteCommand {
    fn execute(&self) -> Result<CommandResult> {
        let mut engine = Engine::open(&self.data_dir, TraceInput::new())?;

        let (label, removed) = match self.args.kind {
            KindArg::Component => ("component", engine.delete_component(&self.args.name)?),
            KindArg::Assembly => ("assembly", engine.delete_assembly(&self.args.name)?),
        };

        if removed {
            println!("Deleted {} '{}'", label, self.args.name);
            Ok(CommandResult::success())
        } else {
            eprintln!("No {} named '{}'", label, self.args.name);
            Ok(CommandResult::failure(1))
        }
    }
}
