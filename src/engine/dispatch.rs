//! Atomic step dispatch.
//!
//! A [`Dispatcher`] turns one atomic [`Step`] into calls on the input
//! capability: clipboard shortcuts are composed from key events with settle
//! pauses in between, text entry goes through the clipboard, waits block in
//! place. Control steps (loop markers, invocations) carry no direct action
//! and are reported back as skipped; sequencing them is the caller's job.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::context::ExecutionContext;
use crate::engine::cancel::CancelToken;
use crate::engine::wait;
use crate::input::InputCapability;
use crate::step::{Region, Step};

/// Match confidence for locating a reference image on screen.
pub const CLICK_IMAGE_CONFIDENCE: f64 = 0.8;

/// Modifier used for clipboard shortcuts.
const MODIFIER_KEY: &str = "ctrl";

/// Pauses used while replaying steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    /// Pause after each key event in a composed shortcut.
    pub settle: Duration,
    /// Duration of a pointer drag.
    pub drag: Duration,
    /// Poll interval of a smart wait.
    pub check_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(200),
            drag: Duration::from_millis(800),
            check_interval: Duration::from_millis(500),
        }
    }
}

impl Timing {
    /// All pauses zeroed, for tests that replay against a mock.
    pub fn instant() -> Self {
        Self {
            settle: Duration::ZERO,
            drag: Duration::ZERO,
            check_interval: Duration::ZERO,
        }
    }
}

/// What dispatching one step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    /// The step performed nothing; carries the reason for the caller to log.
    Skipped(String),
}

/// Executes atomic steps against an input capability.
pub struct Dispatcher<'a, C: InputCapability> {
    pub input: &'a mut C,
    pub timing: &'a Timing,
    pub captures_dir: &'a Path,
    pub cancel: &'a CancelToken,
}

impl<'a, C: InputCapability> Dispatcher<'a, C> {
    /// Dispatch one step. Placeholders in string payloads are resolved
    /// against `ctx` first. Errors are capability failures; a reference
    /// image that is not on screen is a skip, not an error.
    pub fn execute(&mut self, step: &Step, ctx: &ExecutionContext) -> anyhow::Result<StepOutcome> {
        match step {
            Step::SelectAll => self.shortcut("a")?,
            Step::Copy => self.shortcut("c")?,
            Step::Paste => self.shortcut("v")?,
            Step::OpenUrl(url) => self.input.open_url(&ctx.render(url))?,
            Step::ClickByImage(template) => return self.click_by_image(template, ctx),
            Step::ClickAtPoint(point) => self.input.click(*point)?,
            Step::RightClickAtPoint(point) => self.input.right_click(*point)?,
            Step::Drag { from, to } => self.input.drag(*from, *to, self.timing.drag)?,
            Step::CaptureRegion(region) => self.capture_region(*region)?,
            Step::EnterText(text) => self.enter_text(text, ctx)?,
            Step::PressKey(key) => self.input.press_key(&ctx.render(key))?,
            Step::WaitFixed(secs) => thread::sleep(Duration::from_secs_f64(secs.max(0.0))),
            Step::WaitSmart(secs) => {
                wait::smart_wait(
                    &mut *self.input,
                    Duration::from_secs_f64(secs.max(0.0)),
                    self.timing.check_interval,
                    self.cancel,
                )?;
            }
            Step::LoopStartByData(_)
            | Step::LoopStartByList(_)
            | Step::LoopEnd
            | Step::InvokeComponent(_) => {
                return Ok(StepOutcome::Skipped(format!(
                    "{} is a control step with no direct action",
                    step.kind()
                )));
            }
        }
        Ok(StepOutcome::Done)
    }

    /// Select the focused element's content and paste `text` over it.
    /// Loop iterations use this to push the fresh item into the target.
    pub fn paste_over_selection(&mut self, text: &str) -> anyhow::Result<()> {
        self.shortcut("a")?;
        self.paste_text(text)
    }

    fn enter_text(&mut self, raw: &str, ctx: &ExecutionContext) -> anyhow::Result<()> {
        let resolved = ctx.render(raw);
        // A bare `{i}` field overwrites the previous iteration's value
        // instead of appending after it.
        if raw == "{i}" && ctx.get("i").is_some() {
            self.paste_over_selection(&resolved)
        } else {
            self.paste_text(&resolved)
        }
    }

    fn paste_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.input.write_clipboard(text)?;
        self.shortcut("v")
    }

    /// Modifier-plus-key shortcut with settle pauses after each event.
    fn shortcut(&mut self, key: &str) -> anyhow::Result<()> {
        self.input.key_down(MODIFIER_KEY)?;
        self.settle();
        self.input.press_key(key)?;
        self.settle();
        self.input.key_up(MODIFIER_KEY)?;
        self.settle();
        Ok(())
    }

    fn settle(&self) {
        thread::sleep(self.timing.settle);
    }

    fn click_by_image(
        &mut self,
        template: &Path,
        ctx: &ExecutionContext,
    ) -> anyhow::Result<StepOutcome> {
        let resolved = PathBuf::from(ctx.render(&template.to_string_lossy()));
        match self.input.locate_image(&resolved, CLICK_IMAGE_CONFIDENCE)? {
            Some(point) => {
                self.input.click(point)?;
                Ok(StepOutcome::Done)
            }
            None => Ok(StepOutcome::Skipped(format!(
                "image {} not found on screen",
                resolved.display()
            ))),
        }
    }

    fn capture_region(&mut self, region: Region) -> anyhow::Result<()> {
        std::fs::create_dir_all(self.captures_dir)?;
        let dest = self.captures_dir.join(capture_filename());
        self.input.capture_region(region.normalized(), &dest)?;
        info!("captured {} to {}", region.normalized(), dest.display());
        Ok(())
    }
}

/// Timestamped capture filename with a random suffix so rapid captures
/// never collide.
fn capture_filename() -> String {
    let millis = Utc::now().timestamp_millis();
    let mut suffix = [0u8; 4];
    if getrandom::getrandom(&mut suffix).is_err() {
        suffix = Utc::now().timestamp_subsec_nanos().to_le_bytes();
    }
    format!("capture_{}_{}.png", millis, hex::encode(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Action, MockInput};
    use crate::step::Point;

    struct Rig {
        input: MockInput,
        timing: Timing,
        captures: tempfile::TempDir,
        cancel: CancelToken,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                input: MockInput::new(),
                timing: Timing::instant(),
                captures: tempfile::TempDir::new().unwrap(),
                cancel: CancelToken::new(),
            }
        }

        fn execute(&mut self, step: &Step, ctx: &ExecutionContext) -> StepOutcome {
            let mut dispatcher = Dispatcher {
                input: &mut self.input,
                timing: &self.timing,
                captures_dir: self.captures.path(),
                cancel: &self.cancel,
            };
            dispatcher.execute(step, ctx).unwrap()
        }
    }

    #[test]
    fn select_all_composes_the_shortcut() {
        let mut rig = Rig::new();
        rig.execute(&Step::SelectAll, &ExecutionContext::new());

        assert_eq!(
            rig.input.actions(),
            &[
                Action::KeyDown("ctrl".into()),
                Action::PressKey("a".into()),
                Action::KeyUp("ctrl".into()),
            ]
        );
    }

    #[test]
    fn enter_text_resolves_and_pastes() {
        let mut rig = Rig::new();
        let mut ctx = ExecutionContext::new();
        ctx.set("name", "ada");

        rig.execute(&Step::EnterText("hello {name}".into()), &ctx);

        assert_eq!(rig.input.clipboard_writes(), vec!["hello ada"]);
        assert_eq!(rig.input.key_press_count("v"), 1);
        assert_eq!(rig.input.key_press_count("a"), 0);
    }

    #[test]
    fn bare_loop_variable_field_overwrites_selection() {
        let mut rig = Rig::new();
        let mut ctx = ExecutionContext::new();
        ctx.set("i", "7");

        rig.execute(&Step::EnterText("{i}".into()), &ctx);

        // Select-all fires before the paste.
        assert_eq!(rig.input.key_press_count("a"), 1);
        assert_eq!(rig.input.key_press_count("v"), 1);
        assert_eq!(rig.input.clipboard_writes(), vec!["7"]);
    }

    #[test]
    fn bare_loop_variable_without_binding_pastes_plainly() {
        let mut rig = Rig::new();

        rig.execute(&Step::EnterText("{i}".into()), &ExecutionContext::new());

        // No binding: the placeholder stays verbatim and nothing is selected.
        assert_eq!(rig.input.key_press_count("a"), 0);
        assert_eq!(rig.input.clipboard_writes(), vec!["{i}"]);
    }

    #[test]
    fn click_by_image_hits_the_located_point() {
        let mut rig = Rig::new();
        rig.input
            .set_locate_result("button.png", Some(Point::new(50, 60)));

        let outcome = rig.execute(
            &Step::ClickByImage("button.png".into()),
            &ExecutionContext::new(),
        );

        assert_eq!(outcome, StepOutcome::Done);
        assert!(rig
            .input
            .has_action(|a| *a == Action::Click(Point::new(50, 60))));
    }

    #[test]
    fn click_by_image_miss_is_a_skip_not_an_error() {
        let mut rig = Rig::new();

        let outcome = rig.execute(
            &Step::ClickByImage("missing.png".into()),
            &ExecutionContext::new(),
        );

        match outcome {
            StepOutcome::Skipped(reason) => assert!(reason.contains("missing.png")),
            StepOutcome::Done => panic!("expected a skip"),
        }
        assert!(!rig.input.has_action(|a| matches!(a, Action::Click(_))));
    }

    #[test]
    fn click_by_image_path_resolves_placeholders() {
        let mut rig = Rig::new();
        rig.input
            .set_locate_result("shots/row3.png", Some(Point::new(1, 1)));
        let mut ctx = ExecutionContext::new();
        ctx.set("i", "3");

        let outcome = rig.execute(&Step::ClickByImage("shots/row{i}.png".into()), &ctx);

        assert_eq!(outcome, StepOutcome::Done);
    }

    #[test]
    fn capture_region_writes_unique_files() {
        let mut rig = Rig::new();
        let region = Step::CaptureRegion(Region::new(4, 4, 0, 0));

        rig.execute(&region, &ExecutionContext::new());
        rig.execute(&region, &ExecutionContext::new());

        let captures = rig.input.captures();
        assert_eq!(captures.len(), 2);
        assert_ne!(captures[0], captures[1]);
        // Coordinates are normalized before capture.
        assert!(rig
            .input
            .has_action(|a| matches!(a, Action::CaptureRegion { region, .. }
                if *region == Region::new(0, 0, 4, 4))));
    }

    #[test]
    fn drag_uses_configured_duration() {
        let mut rig = Rig::new();

        rig.execute(
            &Step::Drag {
                from: Point::new(0, 0),
                to: Point::new(9, 9),
            },
            &ExecutionContext::new(),
        );

        assert!(rig.input.has_action(|a| matches!(a, Action::Drag { .. })));
    }

    #[test]
    fn control_steps_have_no_direct_action() {
        let mut rig = Rig::new();

        let outcome = rig.execute(&Step::LoopEnd, &ExecutionContext::new());

        assert!(matches!(outcome, StepOutcome::Skipped(_)));
        assert!(rig.input.actions().is_empty());
    }

    #[test]
    fn capture_filenames_do_not_collide() {
        let a = capture_filename();
        let b = capture_filename();
        assert!(a.starts_with("capture_"));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }
}
