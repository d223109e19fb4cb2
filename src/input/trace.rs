//! Logging-only input capability.
//!
//! `TraceInput` narrates every action at info level and performs nothing.
//! The CLI uses it as the rehearsal backend for `reprise run`: the full
//! interpreter runs (loops, bindings, waits, invocations) while the desktop
//! stays untouched. Embedders can also use it to preview an Assembly before
//! wiring a real adapter.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::step::{Point, Region};

use super::{InputCapability, Screenshot};

/// Input capability that logs actions instead of performing them.
///
/// Keeps an internal clipboard so text flows behave; the simulated screen
/// never changes, so smart waits run to their timeout.
#[derive(Debug, Default)]
pub struct TraceInput {
    clipboard: String,
}

impl TraceInput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputCapability for TraceInput {
    fn click(&mut self, point: Point) -> Result<()> {
        info!("click at {}", point);
        Ok(())
    }

    fn right_click(&mut self, point: Point) -> Result<()> {
        info!("right-click at {}", point);
        Ok(())
    }

    fn drag(&mut self, from: Point, to: Point, duration: Duration) -> Result<()> {
        info!("drag {} -> {} over {:?}", from, to, duration);
        Ok(())
    }

    fn key_down(&mut self, key: &str) -> Result<()> {
        info!("key down: {}", key);
        Ok(())
    }

    fn key_up(&mut self, key: &str) -> Result<()> {
        info!("key up: {}", key);
        Ok(())
    }

    fn press_key(&mut self, key: &str) -> Result<()> {
        info!("press key: {}", key);
        Ok(())
    }

    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        info!("clipboard <- {:?}", text);
        self.clipboard = text.to_string();
        Ok(())
    }

    fn read_clipboard(&mut self) -> Result<String> {
        Ok(self.clipboard.clone())
    }

    fn screenshot(&mut self) -> Result<Screenshot> {
        Ok(Screenshot::solid(8, 8, 0))
    }

    fn capture_region(&mut self, region: Region, dest: &Path) -> Result<()> {
        info!("capture {} -> {}", region, dest.display());
        Ok(())
    }

    fn locate_image(&mut self, template: &Path, confidence: f64) -> Result<Option<Point>> {
        info!(
            "locate {} (confidence {}): nothing on a rehearsal screen",
            template.display(),
            confidence
        );
        Ok(None)
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        info!("open url: {}", url);
        Ok(())
    }
}
