//! Adaptive waiting on screen change.
//!
//! A smart wait captures a baseline screenshot, then polls: sleep one check
//! interval, re-capture, and compare against the baseline in grayscale. The
//! first differing pixel set ends the wait with the bounding box of the
//! change; an unchanged screen ends it at the timeout. Cancellation is
//! honoured between polls.

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::engine::cancel::CancelToken;
use crate::input::{InputCapability, Screenshot};
use crate::step::Region;

/// Grayscale reduction of a screenshot, one luma byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    luma: Vec<u8>,
}

impl Frame {
    /// Reduce RGBA pixels with ITU-R 601 weights; alpha is ignored.
    pub fn from_screenshot(shot: &Screenshot) -> Self {
        let luma = shot
            .rgba
            .chunks_exact(4)
            .map(|px| {
                let weighted =
                    u32::from(px[0]) * 299 + u32::from(px[1]) * 587 + u32::from(px[2]) * 114;
                (weighted / 1000) as u8
            })
            .collect();
        Self {
            width: shot.width,
            height: shot.height,
            luma,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Bounding box of every pixel that differs between two frames, with
/// exclusive right and bottom edges. `None` means the frames are identical.
/// Frames of different sizes count as a whole-frame change.
pub fn diff_bounding_box(baseline: &Frame, current: &Frame) -> Option<Region> {
    if baseline.width != current.width || baseline.height != current.height {
        return Some(Region::new(0, 0, current.width as i32, current.height as i32));
    }

    let width = current.width as usize;
    let mut min_x = usize::MAX;
    let mut max_x = 0usize;
    let mut min_y = usize::MAX;
    let mut max_y = 0usize;

    for (y, (row_a, row_b)) in baseline
        .luma
        .chunks_exact(width)
        .zip(current.luma.chunks_exact(width))
        .enumerate()
    {
        if row_a == row_b {
            continue;
        }
        for (x, (a, b)) in row_a.iter().zip(row_b.iter()).enumerate() {
            if a != b {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = y;
            }
        }
    }

    if min_x == usize::MAX {
        None
    } else {
        Some(Region::new(
            min_x as i32,
            min_y as i32,
            (max_x + 1) as i32,
            (max_y + 1) as i32,
        ))
    }
}

/// How a smart wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The screen changed; carries the bounding box of the change.
    Changed(Region),
    /// The timeout elapsed with no change. Not an error.
    TimedOut,
    /// Cancellation was requested between polls.
    Cancelled,
}

/// Wait until the screen differs from a baseline captured on entry.
///
/// Polls every `check_interval` until `timeout` has elapsed. Returns
/// [`WaitOutcome::TimedOut`] rather than an error when nothing changes;
/// capture failures are the only error path.
pub fn smart_wait<C: InputCapability>(
    input: &mut C,
    timeout: Duration,
    check_interval: Duration,
    cancel: &CancelToken,
) -> anyhow::Result<WaitOutcome> {
    // A zero interval would spin; one millisecond is the floor.
    let interval = check_interval.max(Duration::from_millis(1));
    let baseline = Frame::from_screenshot(&input.screenshot()?);
    let started = Instant::now();

    loop {
        if cancel.is_cancelled() {
            debug!("smart wait cancelled after {:?}", started.elapsed());
            return Ok(WaitOutcome::Cancelled);
        }
        thread::sleep(interval);
        if started.elapsed() >= timeout {
            debug!("smart wait timed out after {:?}", started.elapsed());
            return Ok(WaitOutcome::TimedOut);
        }
        let current = Frame::from_screenshot(&input.screenshot()?);
        if let Some(region) = diff_bounding_box(&baseline, &current) {
            debug!(
                "screen changed in {} after {:?}",
                region,
                started.elapsed()
            );
            return Ok(WaitOutcome::Changed(region));
        }
    }
}
