//! The input/screen capability boundary.
//!
//! Everything the engine does to the outside world goes through
//! [`InputCapability`]: pointer actions, key events, clipboard access,
//! screenshots, on-screen image lookup, and URL opening. The OS-level
//! adapter lives outside this crate; shipped here are
//! [`MockInput`](mock::MockInput), which records every action for tests and
//! embedders, and [`TraceInput`](trace::TraceInput), which logs actions and
//! performs nothing (the CLI's rehearsal backend).
//!
//! Methods return `anyhow::Result` so adapters can surface their backend's
//! errors without depending on this crate's error enum; the engine treats
//! any per-step capability failure as log-and-skip.

pub mod mock;
pub mod trace;

pub use mock::{Action, MockInput};
pub use trace::TraceInput;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::step::{Point, Region};

/// One full-screen frame as tightly packed RGBA rows, top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Screenshot {
    /// Build a frame, checking the buffer matches the dimensions.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            anyhow::bail!(
                "screenshot buffer is {} bytes, expected {} for {}x{}",
                rgba.len(),
                expected,
                width,
                height
            );
        }
        Ok(Self { width, height, rgba })
    }

    /// A uniform frame of one gray level, handy for tests and stub adapters.
    pub fn solid(width: u32, height: u32, level: u8) -> Self {
        Self {
            width,
            height,
            rgba: vec![level; width as usize * height as usize * 4],
        }
    }
}

/// Low-level input simulation and screen capture.
///
/// Implementations take `&mut self`: the engine is strictly sequential and
/// adapters commonly hold OS handles that are not shareable.
pub trait InputCapability {
    /// Left-click at a screen coordinate.
    fn click(&mut self, point: Point) -> Result<()>;

    /// Right-click at a screen coordinate.
    fn right_click(&mut self, point: Point) -> Result<()>;

    /// Press at `from`, glide to `to` over `duration`, release.
    fn drag(&mut self, from: Point, to: Point, duration: Duration) -> Result<()>;

    /// Hold a key or modifier down.
    fn key_down(&mut self, key: &str) -> Result<()>;

    /// Release a held key or modifier.
    fn key_up(&mut self, key: &str) -> Result<()>;

    /// Tap a single key.
    fn press_key(&mut self, key: &str) -> Result<()>;

    /// Replace the clipboard contents.
    fn write_clipboard(&mut self, text: &str) -> Result<()>;

    /// Read the clipboard contents.
    fn read_clipboard(&mut self) -> Result<String>;

    /// Capture the full screen.
    fn screenshot(&mut self) -> Result<Screenshot>;

    /// Save a region of the screen to `dest` as an image file.
    fn capture_region(&mut self, region: Region, dest: &Path) -> Result<()>;

    /// Find a reference image on the current screen.
    ///
    /// Returns the center of the best match at or above `confidence`, or
    /// `None` when the image is not visible.
    fn locate_image(&mut self, template: &Path, confidence: f64) -> Result<Option<Point>>;

    /// Open a URL in the platform's default handler.
    fn open_url(&mut self, url: &str) -> Result<()>;
}
