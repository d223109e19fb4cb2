//! Step sequencing for assemblies and components.
//!
//! An assembly run walks its steps with an explicit program counter and a
//! loop stack. Loop-start steps resolve their items and bind the first one;
//! loop-end rewinds the counter while items remain and advances the binding,
//! pasting the fresh item over the target's selection for plain values.
//! Component invocations execute synchronously in the same context. A step
//! that fails logs a warning and the run continues; only cancellation stops
//! it early, and only at a step boundary.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::context::ExecutionContext;
use crate::engine::cancel::CancelToken;
use crate::engine::dispatch::{Dispatcher, StepOutcome};
use crate::engine::loops::{self, LoopFrame, LoopItems, LoopStack};
use crate::input::InputCapability;
use crate::step::Step;
use crate::store::StepStore;

/// Most invocation hops allowed before further invokes are skipped, so a
/// component that invokes itself cannot hang a run.
pub const MAX_INVOKE_DEPTH: usize = 16;

/// Tally of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub steps_run: usize,
    pub steps_skipped: usize,
    pub duration: Duration,
    pub cancelled: bool,
}

/// Run an assembly's steps to completion, cancellation, or the end.
pub fn run_assembly_steps<C: InputCapability>(
    steps: &[Step],
    components: &StepStore,
    ctx: &mut ExecutionContext,
    dispatcher: &mut Dispatcher<'_, C>,
    cancel: &CancelToken,
) -> RunReport {
    let started = Instant::now();
    let mut interp = Interpreter {
        components,
        ctx,
        dispatcher,
        cancel,
        report: RunReport::default(),
    };
    interp.run_assembly(steps);
    let mut report = interp.report;
    report.duration = started.elapsed();
    report
}

/// Run a component's steps directly. Loop markers are ignored with a
/// warning; invocations still execute, up to the depth cap.
pub fn run_component_steps<C: InputCapability>(
    steps: &[Step],
    components: &StepStore,
    ctx: &mut ExecutionContext,
    dispatcher: &mut Dispatcher<'_, C>,
    cancel: &CancelToken,
) -> RunReport {
    let started = Instant::now();
    let mut interp = Interpreter {
        components,
        ctx,
        dispatcher,
        cancel,
        report: RunReport::default(),
    };
    interp.run_component(steps, 0);
    let mut report = interp.report;
    report.duration = started.elapsed();
    report
}

struct Interpreter<'r, 'a, C: InputCapability> {
    components: &'r StepStore,
    ctx: &'r mut ExecutionContext,
    dispatcher: &'r mut Dispatcher<'a, C>,
    cancel: &'r CancelToken,
    report: RunReport,
}

impl<C: InputCapability> Interpreter<'_, '_, C> {
    fn run_assembly(&mut self, steps: &[Step]) {
        let starts = steps.iter().filter(|s| s.is_loop_start()).count();
        let ends = steps.iter().filter(|s| matches!(s, Step::LoopEnd)).count();
        if starts != ends {
            warn!(
                "unbalanced loop markers: {} starts, {} ends; stray markers run as no-ops",
                starts, ends
            );
        }

        let mut stack = LoopStack::new();
        let mut pc = 0usize;
        while pc < steps.len() {
            if self.cancel.is_cancelled() {
                info!("run cancelled before step {}", pc + 1);
                self.report.cancelled = true;
                return;
            }
            let step = &steps[pc];
            debug!("step [{}/{}] {}", pc + 1, steps.len(), step.kind());
            match step {
                Step::LoopStartByData(payload) => self.open_data_loop(payload, pc, &mut stack),
                Step::LoopStartByList(payload) => self.open_list_loop(payload, pc, &mut stack),
                Step::LoopEnd => self.close_loop(&mut stack, &mut pc),
                Step::InvokeComponent(name) => {
                    self.invoke(name, 1);
                    if self.report.cancelled {
                        return;
                    }
                }
                step => self.dispatch_soft(step, pc),
            }
            pc += 1;
        }
    }

    fn run_component(&mut self, steps: &[Step], depth: usize) {
        for (index, step) in steps.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("run cancelled before step {}", index + 1);
                self.report.cancelled = true;
                return;
            }
            debug!("step [{}/{}] {}", index + 1, steps.len(), step.kind());
            match step {
                Step::LoopStartByData(_) | Step::LoopStartByList(_) | Step::LoopEnd => {
                    warn!("{} inside a component is ignored", step.kind());
                    self.report.steps_skipped += 1;
                }
                Step::InvokeComponent(name) => {
                    self.invoke(name, depth + 1);
                    if self.report.cancelled {
                        return;
                    }
                }
                step => self.dispatch_soft(step, index),
            }
        }
    }

    /// Open a loop over spreadsheet rows or a numeric count.
    fn open_data_loop(&mut self, payload: &str, pc: usize, stack: &mut LoopStack) {
        let resolved = self.ctx.render(payload);
        match loops::load_loop_data(&resolved) {
            Ok(items) if items.is_empty() => {
                warn!("loop data '{}' has no items; skipping loop", resolved);
                self.report.steps_skipped += 1;
            }
            Ok(items) => {
                let frame = LoopFrame::new(pc, items, stack.depth());
                self.bind_item(&frame);
                stack.push(frame);
                self.report.steps_run += 1;
            }
            Err(err) => {
                warn!(
                    "loop data '{}' failed to load: {:#}; skipping loop",
                    resolved, err
                );
                self.report.steps_skipped += 1;
            }
        }
    }

    /// Open a loop over the lines of a free-text list. The first item is
    /// pasted over the target's selection right away.
    fn open_list_loop(&mut self, payload: &str, pc: usize, stack: &mut LoopStack) {
        let resolved = self.ctx.render(payload);
        let values = loops::split_list(&resolved);
        if values.is_empty() {
            warn!("list loop has no items; skipping loop");
            self.report.steps_skipped += 1;
            return;
        }
        let first = values[0].clone();
        let frame = LoopFrame::new(pc, LoopItems::Unkeyed(values), stack.depth());
        self.bind_item(&frame);
        self.paste_item(&first);
        stack.push(frame);
        self.report.steps_run += 1;
    }

    /// Advance the innermost loop or pop it when its items are spent.
    fn close_loop(&mut self, stack: &mut LoopStack, pc: &mut usize) {
        let Some(frame) = stack.top_mut() else {
            warn!("loop-end without an open loop; ignoring");
            self.report.steps_skipped += 1;
            return;
        };
        frame.cursor += 1;
        if frame.cursor < frame.items.len() {
            // Rewind; the normal increment resumes the body after the start.
            *pc = frame.start_index;
            match &frame.items {
                LoopItems::Keyed(rows) => self.ctx.merge(rows[frame.cursor].clone()),
                LoopItems::Unkeyed(values) => {
                    let value = values[frame.cursor].clone();
                    self.ctx.set(frame.var_name(), value.clone());
                    if let Err(err) = self.dispatcher.paste_over_selection(&value) {
                        warn!("failed to paste loop item: {:#}; continuing", err);
                    }
                }
            }
            self.report.steps_run += 1;
        } else {
            stack.pop();
            self.report.steps_run += 1;
        }
    }

    /// Bind the frame's current item into the context: spreadsheet rows
    /// merge all their columns, plain values set the frame's variable.
    fn bind_item(&mut self, frame: &LoopFrame) {
        match &frame.items {
            LoopItems::Keyed(rows) => self.ctx.merge(rows[frame.cursor].clone()),
            LoopItems::Unkeyed(values) => {
                self.ctx.set(frame.var_name(), values[frame.cursor].clone());
            }
        }
    }

    fn paste_item(&mut self, value: &str) {
        if let Err(err) = self.dispatcher.paste_over_selection(value) {
            warn!("failed to paste loop item: {:#}; continuing", err);
        }
    }

    fn invoke(&mut self, name: &str, depth: usize) {
        let resolved = self.ctx.render(name);
        if depth > MAX_INVOKE_DEPTH {
            warn!(
                "component '{}' not run: invocation depth {} exceeds {}",
                resolved, depth, MAX_INVOKE_DEPTH
            );
            self.report.steps_skipped += 1;
            return;
        }
        let Some(steps) = self.components.get(&resolved) else {
            warn!("unknown component '{}'; skipping invocation", resolved);
            self.report.steps_skipped += 1;
            return;
        };
        info!("invoking component '{}' ({} steps)", resolved, steps.len());
        self.report.steps_run += 1;
        self.run_component(steps, depth);
    }

    fn dispatch_soft(&mut self, step: &Step, index: usize) {
        match self.dispatcher.execute(step, self.ctx) {
            Ok(StepOutcome::Done) => {
                self.report.steps_run += 1;
            }
            Ok(StepOutcome::Skipped(reason)) => {
                warn!("step {} ({}) skipped: {}", index + 1, step.kind(), reason);
                self.report.steps_skipped += 1;
            }
            Err(err) => {
                warn!(
                    "step {} ({}) failed: {:#}; continuing",
                    index + 1,
                    step.kind(),
                    err
                );
                self.report.steps_skipped += 1;
            }
        }
    }
}
