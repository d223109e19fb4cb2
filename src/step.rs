//! The step model.
//!
//! A [`Step`] is one tagged, immutable instruction inside a Component or
//! Assembly: either an atomic action (click, type, wait, ...) or a control
//! marker (loop start/end, component invocation). On the wire and in the
//! persisted stores every step is the flat pair `{"type": ..., "value": ...}`;
//! in memory each kind carries its own typed payload so an invalid
//! kind/value combination cannot be represented at all.
//!
//! - [`Step`] - closed sum type, one variant per kind
//! - [`Point`] - literal screen coordinate (`"x,y"` on the wire)
//! - [`Region`] - rectangle as two corner points (`"x1,y1,x2,y2"`)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::RepriseError;

/// Default smart-wait timeout when the step carries no value, in seconds.
pub const DEFAULT_SMART_WAIT_SECS: f64 = 5.0;

/// A literal screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A rectangle given as two corner points, in the order the user dragged
/// them. Call [`Region::normalized`] before treating it as top-left /
/// bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Region {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Corner-order independent form: (x1,y1) top-left, (x2,y2) bottom-right.
    pub fn normalized(&self) -> Region {
        Region {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn width(&self) -> u32 {
        let n = self.normalized();
        (n.x2 - n.x1) as u32
    }

    pub fn height(&self) -> u32 {
        let n = self.normalized();
        (n.y2 - n.y1) as u32
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.x1, self.y1, self.x2, self.y2)
    }
}

/// One recorded instruction.
///
/// Variants mirror the wire `type` tags exactly; see [`Step::kind`] for the
/// mapping. Steps are value objects: cheap to clone, compared structurally
/// in tests and round-trip checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireStep", into = "WireStep")]
pub enum Step {
    /// Select-all shortcut in the focused element.
    SelectAll,
    /// Copy shortcut.
    Copy,
    /// Paste shortcut.
    Paste,
    /// Open a URL in the platform's default handler.
    OpenUrl(String),
    /// Locate a reference image on screen and click its center.
    ClickByImage(PathBuf),
    /// Left-click at literal coordinates.
    ClickAtPoint(Point),
    /// Right-click at literal coordinates.
    RightClickAtPoint(Point),
    /// Press at `from`, drag to `to`.
    Drag { from: Point, to: Point },
    /// Screenshot a region of the screen to the captures directory.
    CaptureRegion(Region),
    /// Type text (with `{name}` template substitution) via the clipboard.
    EnterText(String),
    /// Press a single named key.
    PressKey(String),
    /// Sleep for a fixed number of seconds.
    WaitFixed(f64),
    /// Wait until the screen changes, up to a timeout in seconds.
    WaitSmart(f64),
    /// Begin a loop over spreadsheet rows or a fixed count.
    LoopStartByData(String),
    /// Begin a loop over newline-separated list items.
    LoopStartByList(String),
    /// End of the innermost loop body.
    LoopEnd,
    /// Run a named Component inline.
    InvokeComponent(String),
}

impl Step {
    /// The wire `type` tag for this step.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::SelectAll => "select-all",
            Step::Copy => "copy",
            Step::Paste => "paste",
            Step::OpenUrl(_) => "open-url",
            Step::ClickByImage(_) => "click-by-image",
            Step::ClickAtPoint(_) => "click-at-point",
            Step::RightClickAtPoint(_) => "right-click-at-point",
            Step::Drag { .. } => "drag",
            Step::CaptureRegion(_) => "capture-region",
            Step::EnterText(_) => "enter-text",
            Step::PressKey(_) => "press-key",
            Step::WaitFixed(_) => "wait-fixed",
            Step::WaitSmart(_) => "wait-smart",
            Step::LoopStartByData(_) => "loop-start-by-data",
            Step::LoopStartByList(_) => "loop-start-by-list",
            Step::LoopEnd => "loop-end",
            Step::InvokeComponent(_) => "invoke-component",
        }
    }

    /// True for either loop-start kind.
    pub fn is_loop_start(&self) -> bool {
        matches!(self, Step::LoopStartByData(_) | Step::LoopStartByList(_))
    }

    /// True for loop markers and invocations, false for atomic actions.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Step::LoopStartByData(_)
                | Step::LoopStartByList(_)
                | Step::LoopEnd
                | Step::InvokeComponent(_)
        )
    }

    /// The wire `value` string for this step.
    pub fn value_string(&self) -> String {
        match self {
            Step::SelectAll | Step::Copy | Step::Paste | Step::LoopEnd => String::new(),
            Step::OpenUrl(s)
            | Step::EnterText(s)
            | Step::PressKey(s)
            | Step::LoopStartByData(s)
            | Step::LoopStartByList(s)
            | Step::InvokeComponent(s) => s.clone(),
            Step::ClickByImage(p) => p.to_string_lossy().into_owned(),
            Step::ClickAtPoint(p) | Step::RightClickAtPoint(p) => p.to_string(),
            Step::Drag { from, to } => format!("{},{}", from, to),
            Step::CaptureRegion(r) => r.to_string(),
            Step::WaitFixed(s) | Step::WaitSmart(s) => format_seconds(*s),
        }
    }
}

/// The flat persisted/interchange form of a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireStep {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: String,
}

impl From<Step> for WireStep {
    fn from(step: Step) -> Self {
        WireStep {
            value: step.value_string(),
            kind: step.kind().to_string(),
        }
    }
}

impl TryFrom<WireStep> for Step {
    type Error = RepriseError;

    fn try_from(wire: WireStep) -> Result<Self, Self::Error> {
        let WireStep { kind, value } = wire;
        let step = match kind.as_str() {
            "select-all" => Step::SelectAll,
            "copy" => Step::Copy,
            "paste" => Step::Paste,
            "open-url" => Step::OpenUrl(value),
            "click-by-image" => Step::ClickByImage(PathBuf::from(value)),
            "click-at-point" => Step::ClickAtPoint(parse_point(&kind, &value)?),
            "right-click-at-point" => Step::RightClickAtPoint(parse_point(&kind, &value)?),
            "drag" => {
                let r = parse_region(&kind, &value)?;
                Step::Drag {
                    from: Point::new(r.x1, r.y1),
                    to: Point::new(r.x2, r.y2),
                }
            }
            "capture-region" => Step::CaptureRegion(parse_region(&kind, &value)?),
            "enter-text" => Step::EnterText(value),
            "press-key" => Step::PressKey(value),
            "wait-fixed" => Step::WaitFixed(parse_seconds(&kind, &value, None)?),
            "wait-smart" => {
                Step::WaitSmart(parse_seconds(&kind, &value, Some(DEFAULT_SMART_WAIT_SECS))?)
            }
            "loop-start-by-data" => Step::LoopStartByData(value),
            "loop-start-by-list" => Step::LoopStartByList(value),
            "loop-end" => Step::LoopEnd,
            "invoke-component" => Step::InvokeComponent(value),
            other => {
                return Err(RepriseError::InvalidStep {
                    kind: other.to_string(),
                    message: "unknown step type".to_string(),
                })
            }
        };
        Ok(step)
    }
}

fn parse_numbers(kind: &str, value: &str, expected: usize, shape: &str) -> Result<Vec<i32>, RepriseError> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != expected {
        return Err(RepriseError::InvalidStep {
            kind: kind.to_string(),
            message: format!("expected \"{}\", got \"{}\"", shape, value),
        });
    }
    parts
        .iter()
        .map(|p| {
            p.parse::<i32>().map_err(|_| RepriseError::InvalidStep {
                kind: kind.to_string(),
                message: format!("\"{}\" is not an integer coordinate", p),
            })
        })
        .collect()
}

fn parse_point(kind: &str, value: &str) -> Result<Point, RepriseError> {
    let n = parse_numbers(kind, value, 2, "x,y")?;
    Ok(Point::new(n[0], n[1]))
}

fn parse_region(kind: &str, value: &str) -> Result<Region, RepriseError> {
    let n = parse_numbers(kind, value, 4, "x1,y1,x2,y2")?;
    Ok(Region::new(n[0], n[1], n[2], n[3]))
}

fn parse_seconds(kind: &str, value: &str, default: Option<f64>) -> Result<f64, RepriseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        if let Some(d) = default {
            return Ok(d);
        }
    }
    let secs: f64 = trimmed.parse().map_err(|_| RepriseError::InvalidStep {
        kind: kind.to_string(),
        message: format!("\"{}\" is not a number of seconds", value),
    })?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(RepriseError::InvalidStep {
            kind: kind.to_string(),
            message: format!("seconds must be non-negative, got \"{}\"", value),
        });
    }
    Ok(secs)
}

/// Keeps whole seconds free of a trailing ".0" so wire values stay tidy.
fn format_seconds(secs: f64) -> String {
    if secs.fract() == 0.0 {
        format!("{}", secs as i64)
    } else {
        format!("{}", secs)
    }
}
