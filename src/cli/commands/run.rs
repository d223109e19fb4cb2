//! Run command implementation.
//!
//! The `reprise run` command replays a stored assembly or component against
//! the trace backend. The replay happens on a worker thread while the
//! foreground thread waits, keeping it free for the stop signal. Ctrl-C
//! requests cancellation; the in-flight step finishes before the run stops.

use std::path::{Path, PathBuf};
use std::thread;

use tracing::warn;

use crate::cli::args::RunArgs;
use crate::engine::{CancelToken, Engine, RunReport};
use crate::error::Result;
use crate::input::TraceInput;

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    data_dir: PathBuf,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(data_dir: &Path, args: RunArgs) -> Self {
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

impl Command for RunCommand {
    fn execute(&self) -> Result<CommandResult> {
        let mut engine = Engine::open(&self.data_dir, TraceInput::new())?;

        let cancel = CancelToken::new();
        let handler_token = cancel.clone();
        // A second handler registration fails; the run is then simply not
        // cancellable from the keyboard.
        if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
            warn!("Ctrl-C handler unavailable: {}", e);
        }

        let name = self.args.name.clone();
        let component = self.args.component;
        let run_token = cancel.clone();
        let worker = thread::spawn(move || -> Result<RunReport> {
            if component {
                engine.run_component(&name, &run_token)
            } else {
                engine.run_assembly(&name, &run_token)
            }
        });
        let report = worker
            .join()
            .map_err(|_| anyhow::anyhow!("run worker panicked"))??;

        print_report(&self.args.name, &report);

        Ok(if report.cancelled {
            CommandResult::failure(130)
        } else {
            CommandResult::success()
        })
    }
}

fn print_report(name: &str, report: &RunReport) {
    println!(
        "'{}': {} steps run, {} skipped in {:.1}s",
        name,
        report.steps_run,
        report.steps_skipped,
        report.duration.as_secs_f64()
    );
    if report.cancelled {
        println!("Run was cancelled before completion");
    }
}
