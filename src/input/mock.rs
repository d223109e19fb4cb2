//! Mock input capability for testing.
//!
//! `MockInput` implements the [`InputCapability`] trait and captures every
//! action for later assertion. Screenshots and image-locate results can be
//! scripted ahead of time.
//!
//! # Example
//!
//! ```
//! use reprise::input::{Action, InputCapability, MockInput};
//! use reprise::step::Point;
//!
//! let mut input = MockInput::new();
//! input.set_locate_result("button.png", Some(Point::new(40, 40)));
//!
//! // Use input in code under test...
//! input.click(Point::new(1, 2)).unwrap();
//!
//! assert_eq!(input.actions()[0], Action::Click(Point::new(1, 2)));
//! ```

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::step::{Point, Region};

use super::{InputCapability, Screenshot};

/// One captured interaction, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Click(Point),
    RightClick(Point),
    Drag { from: Point, to: Point },
    KeyDown(String),
    KeyUp(String),
    PressKey(String),
    WriteClipboard(String),
    ReadClipboard,
    Screenshot,
    CaptureRegion { region: Region, dest: PathBuf },
    LocateImage { template: PathBuf },
    OpenUrl(String),
}

/// Mock input capability for testing.
///
/// Captures all actions and serves pre-configured screenshots and locate
/// results. Screenshots are consumed from a queue; once the queue is empty
/// the last served frame repeats, so an unscripted screen simply never
/// changes.
#[derive(Debug, Default)]
pub struct MockInput {
    actions: Vec<Action>,
    clipboard: String,
    locate_results: HashMap<PathBuf, Option<Point>>,
    screenshot_queue: VecDeque<Screenshot>,
    last_screenshot: Option<Screenshot>,
}

impl MockInput {
    /// Create a new MockInput with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the result of locating one reference image.
    pub fn set_locate_result(&mut self, template: impl Into<PathBuf>, result: Option<Point>) {
        self.locate_results.insert(template.into(), result);
    }

    /// Queue a frame to be served by the next `screenshot()` call.
    pub fn push_screenshot(&mut self, frame: Screenshot) {
        self.screenshot_queue.push_back(frame);
    }

    /// Queue the same frame `count` times.
    pub fn push_screenshots(&mut self, frame: Screenshot, count: usize) {
        for _ in 0..count {
            self.screenshot_queue.push_back(frame.clone());
        }
    }

    /// Everything the code under test did, in order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Current clipboard contents.
    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    /// Every string written to the clipboard, in order.
    pub fn clipboard_writes(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::WriteClipboard(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Count of taps of one key (e.g. how many times "v" was pressed).
    pub fn key_press_count(&self, key: &str) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::PressKey(k) if k == key))
            .count()
    }

    /// Check whether any captured action satisfies a predicate.
    pub fn has_action(&self, pred: impl Fn(&Action) -> bool) -> bool {
        self.actions.iter().any(pred)
    }

    /// Files written by capture-region calls, in order.
    pub fn captures(&self) -> Vec<&Path> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::CaptureRegion { dest, .. } => Some(dest.as_path()),
                _ => None,
            })
            .collect()
    }

    /// Forget all captured actions (scripts stay in place).
    pub fn clear(&mut self) {
        self.actions.clear();
    }
}

impl InputCapability for MockInput {
    fn click(&mut self, point: Point) -> Result<()> {
        self.actions.push(Action::Click(point));
        Ok(())
    }

    fn right_click(&mut self, point: Point) -> Result<()> {
        self.actions.push(Action::RightClick(point));
        Ok(())
    }

    fn drag(&mut self, from: Point, to: Point, _duration: Duration) -> Result<()> {
        self.actions.push(Action::Drag { from, to });
        Ok(())
    }

    fn key_down(&mut self, key: &str) -> Result<()> {
        self.actions.push(Action::KeyDown(key.to_string()));
        Ok(())
    }

    fn key_up(&mut self, key: &str) -> Result<()> {
        self.actions.push(Action::KeyUp(key.to_string()));
        Ok(())
    }

    fn press_key(&mut self, key: &str) -> Result<()> {
        self.actions.push(Action::PressKey(key.to_string()));
        Ok(())
    }

    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        self.actions.push(Action::WriteClipboard(text.to_string()));
        self.clipboard = text.to_string();
        Ok(())
    }

    fn read_clipboard(&mut self) -> Result<String> {
        self.actions.push(Action::ReadClipboard);
        Ok(self.clipboard.clone())
    }

    fn screenshot(&mut self) -> Result<Screenshot> {
        self.actions.push(Action::Screenshot);
        if let Some(frame) = self.screenshot_queue.pop_front() {
            self.last_screenshot = Some(frame.clone());
            return Ok(frame);
        }
        if let Some(frame) = &self.last_screenshot {
            return Ok(frame.clone());
        }
        // Nothing scripted at all: a screen that never changes.
        Ok(Screenshot::solid(8, 8, 0))
    }

    fn capture_region(&mut self, region: Region, dest: &Path) -> Result<()> {
        self.actions.push(Action::CaptureRegion {
            region,
            dest: dest.to_path_buf(),
        });
        std::fs::write(dest, b"mock-capture")?;
        Ok(())
    }

    fn locate_image(&mut self, template: &Path, _confidence: f64) -> Result<Option<Point>> {
        self.actions.push(Action::LocateImage {
            template: template.to_path_buf(),
        });
        Ok(self
            .locate_results
            .get(template)
            .copied()
            .unwrap_or(None))
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        self.actions.push(Action::OpenUrl(url.to_string()));
        Ok(())
    }
}
