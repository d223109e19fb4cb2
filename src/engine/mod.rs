//! The macro engine.
//!
//! [`Engine`] owns the component and assembly stores plus one input
//! capability, and exposes every operation a shell builds on: run, save,
//! delete, export, and import. It is generic over [`InputCapability`], so
//! tests replay against a mock while a desktop build wires in a real
//! automation backend. An engine is `Send` when its capability is, which
//! lets a shell run it on a worker thread and keep the foreground free for
//! the stop signal.
//!
//! Only one run may be active per engine. The guard is a swap on an atomic
//! flag, released when the run's guard drops, so a second start while a run
//! is live fails fast with [`RepriseError::RunInProgress`] instead of
//! interleaving input events.

pub mod cancel;
pub mod dispatch;
pub mod interpreter;
pub mod loops;
pub mod wait;

pub use cancel::CancelToken;
pub use dispatch::{Dispatcher, StepOutcome, Timing, CLICK_IMAGE_CONFIDENCE};
pub use interpreter::{RunReport, MAX_INVOKE_DEPTH};
pub use wait::{diff_bounding_box, smart_wait, Frame, WaitOutcome};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::context::ExecutionContext;
use crate::error::{RepriseError, Result};
use crate::input::InputCapability;
use crate::package::{self, ExportOptions, ImportReport, PackageKind};
use crate::step::Step;
use crate::store::StepStore;

/// Stores, replay, and packaging behind one handle.
pub struct Engine<C: InputCapability> {
    components: StepStore,
    assemblies: StepStore,
    input: C,
    timing: Timing,
    images_dir: PathBuf,
    captures_dir: PathBuf,
    running: Arc<AtomicBool>,
}

impl<C: InputCapability> Engine<C> {
    /// Build an engine from already-loaded stores. Reference images and
    /// screen captures live under `data_dir`.
    pub fn new(
        components: StepStore,
        assemblies: StepStore,
        input: C,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        let data_dir = data_dir.into();
        Self {
            components,
            assemblies,
            input,
            timing: Timing::default(),
            images_dir: data_dir.join("images"),
            captures_dir: data_dir.join("captures"),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load both stores from their conventional files under `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>, input: C) -> Result<Self> {
        let data_dir = data_dir.into();
        let components = StepStore::load(data_dir.join("components.json"))?;
        let assemblies = StepStore::load(data_dir.join("assemblies.json"))?;
        Ok(Self::new(components, assemblies, input, data_dir))
    }

    /// Replace the replay pauses, e.g. with [`Timing::instant`] in tests.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn components(&self) -> &StepStore {
        &self.components
    }

    pub fn assemblies(&self) -> &StepStore {
        &self.assemblies
    }

    pub fn input(&self) -> &C {
        &self.input
    }

    /// Mutable capability access, e.g. to script a mock between runs.
    pub fn input_mut(&mut self) -> &mut C {
        &mut self.input
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Store a component under `name`, replacing any previous steps, and
    /// persist the store.
    pub fn save_component(&mut self, name: impl Into<String>, steps: Vec<Step>) -> Result<()> {
        self.components.insert(name, steps);
        self.components.save()
    }

    /// Store an assembly under `name` and persist the store.
    pub fn save_assembly(&mut self, name: impl Into<String>, steps: Vec<Step>) -> Result<()> {
        self.assemblies.insert(name, steps);
        self.assemblies.save()
    }

    /// Delete a component. Assemblies that invoke it keep their reference
    /// and skip it at run time. Returns whether anything was removed.
    pub fn delete_component(&mut self, name: &str) -> Result<bool> {
        let removed = self.components.remove(name).is_some();
        if removed {
            self.components.save()?;
        }
        Ok(removed)
    }

    /// Delete an assembly. Returns whether anything was removed.
    pub fn delete_assembly(&mut self, name: &str) -> Result<bool> {
        let removed = self.assemblies.remove(name).is_some();
        if removed {
            self.assemblies.save()?;
        }
        Ok(removed)
    }

    /// Run a stored assembly to completion or cancellation.
    pub fn run_assembly(&mut self, name: &str, cancel: &CancelToken) -> Result<RunReport> {
        let steps = self
            .assemblies
            .get(name)
            .map(<[Step]>::to_vec)
            .ok_or_else(|| RepriseError::UnknownAssembly {
                name: name.to_string(),
            })?;
        let _guard = self.begin_run()?;
        info!("running assembly '{}' ({} steps)", name, steps.len());

        let mut ctx = ExecutionContext::new();
        let mut dispatcher = Dispatcher {
            input: &mut self.input,
            timing: &self.timing,
            captures_dir: &self.captures_dir,
            cancel,
        };
        let report =
            interpreter::run_assembly_steps(&steps, &self.components, &mut ctx, &mut dispatcher, cancel);
        log_report(name, &report);
        Ok(report)
    }

    /// Run a stored component directly, outside any assembly.
    pub fn run_component(&mut self, name: &str, cancel: &CancelToken) -> Result<RunReport> {
        let steps = self
            .components
            .get(name)
            .map(<[Step]>::to_vec)
            .ok_or_else(|| RepriseError::UnknownComponent {
                name: name.to_string(),
            })?;
        let _guard = self.begin_run()?;
        info!("running component '{}' ({} steps)", name, steps.len());

        let mut ctx = ExecutionContext::new();
        let mut dispatcher = Dispatcher {
            input: &mut self.input,
            timing: &self.timing,
            captures_dir: &self.captures_dir,
            cancel,
        };
        let report =
            interpreter::run_component_steps(&steps, &self.components, &mut ctx, &mut dispatcher, cancel);
        log_report(name, &report);
        Ok(report)
    }

    /// Export a stored item as a package archive at `out_path`.
    pub fn export_package(
        &self,
        kind: PackageKind,
        name: &str,
        opts: &ExportOptions,
        out_path: &Path,
    ) -> Result<()> {
        let steps = self.steps_of(kind, name)?;
        package::export_package(kind, name, steps, opts, out_path)
    }

    /// Export a stored item as in-memory archive bytes, e.g. for upload.
    pub fn export_package_bytes(
        &self,
        kind: PackageKind,
        name: &str,
        opts: &ExportOptions,
    ) -> Result<Vec<u8>> {
        let steps = self.steps_of(kind, name)?;
        package::export_package_bytes(kind, name, steps, opts)
    }

    /// Import a package archive into the matching store.
    pub fn import_package(
        &mut self,
        archive: &Path,
        kind: PackageKind,
        rename: Option<&str>,
    ) -> Result<ImportReport> {
        let store = match kind {
            PackageKind::Component => &mut self.components,
            PackageKind::Assembly => &mut self.assemblies,
        };
        package::import_package(archive, kind, rename, store, &self.images_dir)
    }

    /// Import archive bytes, e.g. a marketplace download.
    pub fn import_package_bytes(
        &mut self,
        bytes: &[u8],
        kind: PackageKind,
        rename: Option<&str>,
    ) -> Result<ImportReport> {
        let store = match kind {
            PackageKind::Component => &mut self.components,
            PackageKind::Assembly => &mut self.assemblies,
        };
        package::import_package_bytes(bytes, kind, rename, store, &self.images_dir)
    }

    fn steps_of(&self, kind: PackageKind, name: &str) -> Result<&[Step]> {
        match kind {
            PackageKind::Component => {
                self.components
                    .get(name)
                    .ok_or_else(|| RepriseError::UnknownComponent {
                        name: name.to_string(),
                    })
            }
            PackageKind::Assembly => {
                self.assemblies
                    .get(name)
                    .ok_or_else(|| RepriseError::UnknownAssembly {
                        name: name.to_string(),
                    })
            }
        }
    }

    fn begin_run(&self) -> Result<RunGuard> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(RepriseError::RunInProgress);
        }
        Ok(RunGuard {
            flag: Arc::clone(&self.running),
        })
    }
}

/// Clears the running flag when a run ends, on every exit path.
#[derive(Debug)]
struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

fn log_report(name: &str, report: &RunReport) {
    if report.cancelled {
        info!(
            "'{}' cancelled after {} steps ({} skipped) in {:?}",
            name, report.steps_run, report.steps_skipped, report.duration
        );
    } else {
        info!(
            "'{}' finished: {} steps run, {} skipped in {:?}",
            name, report.steps_run, report.steps_skipped, report.duration
        );
    }
}
