//! Import command implementation.
//!
//! The `reprise import` command loads a package archive into the store.

use std::path::{Path, PathBuf};

use crate::cli::args::ImportArgs;
use crate::engine::Engine;
use crate::error::Result;
use crate::input::TraceInput;

use super::dispatcher::{Command, CommandResult};

/// The import command implementation.
pub struct ImportCommand {
    data_dir: PathBuf,
    args: ImportArgs,
}

impl ImportCommand {
    /// Create a new import command.
    pub fn new(data_dir: &Path, args: ImportArgs) -> Self {
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

impl Command for ImportCommand {
    fn execute(&self) -> Result<CommandResult> {
        let mut engine = Engine::open(&self.data_dir, TraceInput::new())?;

        let report = engine.import_package(
            &self.args.archive,
            self.args.kind.into(),
            self.args.rename.as_deref(),
        )?;

        println!(
            "Imported {} '{}' ({} steps, {} images)",
            report.kind,
            report.name,
            report.steps.len(),
            report.images_imported
        );
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{ExportArgs, KindArg};
    use crate::cli::commands::export::ExportCommand;
    use crate::step::Step;
    use tempfile::TempDir;

    #[test]
    fn import_round_trips_an_exported_archive() {
        let temp = TempDir::new().unwrap();
        let mut engine = Engine::open(temp.path(), TraceInput::new()).unwrap();
        engine
            .save_component("fill", vec![Step::EnterText("hi".into())])
            .unwrap();
        drop(engine);

        let archive = temp.path().join("fill.zip");
        ExportCommand::new(
            temp.path(),
            ExportArgs {
                kind: KindArg::Component,
                name: "fill".into(),
                out: Some(archive.clone()),
                author: String::new(),
                description: String::new(),
                price: 0,
            },
        )
        .execute()
        .unwrap();

        let other = TempDir::new().unwrap();
        let args = ImportArgs {
            kind: KindArg::Component,
            archive,
            rename: None,
        };
        let result = ImportCommand::new(other.path(), args).execute().unwrap();

        assert!(result.success);
        let engine = Engine::open(other.path(), TraceInput::new()).unwrap();
        assert!(engine.components().contains("fill"));
    }

    #[test]
    fn import_missing_archive_fails() {
        let temp = TempDir::new().unwrap();
        let args = ImportArgs {
            kind: KindArg::Component,
            archive: temp.path().join("nope.zip"),
            rename: None,
        };

        assert!(ImportCommand::new(temp.path(), args).execute().is_err());
    }
}
