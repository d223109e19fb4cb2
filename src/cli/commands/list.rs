//! List command implementation.
//!
//! The `reprise list` command lists stored components and assemblies.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::args::ListArgs;
use crate::engine::Engine;
use crate::error::Result;
use crate::input::TraceInput;
use crate::store::StepStore;

use super::dispatcher::{Command, CommandResult};

/// The list command implementation.
pub struct ListCommand {
    data_dir: PathBuf,
    args: ListArgs,
}

#[derive(Serialize)]
struct ListEntry {
    name: String,
    steps: usize,
}

#[derive(Serialize)]
struct ListOutput {
    components: Vec<ListEntry>,
    assemblies: Vec<ListEntry>,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(data_dir: &Path, args: ListArgs) -> Self {
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

impl Command for ListCommand {
    fn execute(&self) -> Result<CommandResult> {
        let engine = Engine::open(&self.data_dir, TraceInput::new())?;

        if self.args.json {
            let output = ListOutput {
                components: entries_of(engine.components()),
                assemblies: entries_of(engine.assemblies()),
            };
            print_json(&output)?;
            return Ok(CommandResult::success());
        }

        if engine.components().is_empty() && engine.assemblies().is_empty() {
            println!("Nothing stored yet");
            return Ok(CommandResult::success());
        }

        print_store("Components", engine.components());
        print_store("Assemblies", engine.assemblies());

        Ok(CommandResult::success())
    }
}

fn print_json(output: &ListOutput) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

fn entries_of(store: &StepStore) -> Vec<ListEntry> {
    store
        .names()
        .into_iter()
        .map(|name| {
            let steps = store.get(&name).map(<[_]>::len).unwrap_or(0);
            ListEntry { name, steps }
        })
        .collect()
}

fn print_store(label: &str, store: &StepStore) {
    println!("{} ({}):", label, store.len());
    for name in store.names() {
        let steps = store.get(&name).map(<[_]>::len).unwrap_or(0);
        println!("  {} ({} steps)", name, steps);
    }
}
