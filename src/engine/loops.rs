//! Loop bookkeeping for the interpreter.
//!
//! Each active loop is a [`LoopFrame`] on a [`LoopStack`]. A frame remembers
//! where its body starts, the items it iterates, the cursor into them, and
//! the nesting level it was opened at. The level decides which variable the
//! frame binds: the outermost loop owns `i`, a loop opened one level deeper
//! owns `i2`, the next `i3`, and so on, so inner iterations never clobber
//! the outer binding.

use std::path::Path;

use anyhow::Context as _;

/// One spreadsheet row as `(column, cell)` pairs in column order.
pub type Record = Vec<(String, String)>;

/// The items a loop iterates over.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopItems {
    /// Spreadsheet rows; each iteration merges a whole row into the context.
    Keyed(Vec<Record>),
    /// Plain values; each iteration binds the frame's own loop variable.
    Unkeyed(Vec<String>),
}

impl LoopItems {
    pub fn len(&self) -> usize {
        match self {
            LoopItems::Keyed(rows) => rows.len(),
            LoopItems::Unkeyed(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One active loop.
#[derive(Debug, Clone)]
pub struct LoopFrame {
    /// Index of the loop-start step. After a rewind the program counter is
    /// set here and the normal increment resumes the body at `start + 1`.
    pub start_index: usize,
    pub items: LoopItems,
    /// Index of the item bound for the current iteration.
    pub cursor: usize,
    /// Stack depth when this frame was pushed; 0 for the outermost loop.
    pub level: usize,
}

impl LoopFrame {
    pub fn new(start_index: usize, items: LoopItems, level: usize) -> Self {
        Self {
            start_index,
            items,
            cursor: 0,
            level,
        }
    }

    /// Name of the variable this frame binds: `i` at level 0, `i2` at
    /// level 1, `i3` at level 2, and so on.
    pub fn var_name(&self) -> String {
        if self.level == 0 {
            "i".to_string()
        } else {
            format!("i{}", self.level + 1)
        }
    }
}

/// Stack of active loops, innermost on top.
#[derive(Debug, Default)]
pub struct LoopStack {
    frames: Vec<LoopFrame>,
}

impl LoopStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, frame: LoopFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<LoopFrame> {
        self.frames.pop()
    }

    pub fn top_mut(&mut self) -> Option<&mut LoopFrame> {
        self.frames.last_mut()
    }
}

/// Resolve a data-loop payload into items.
///
/// A payload that parses as a decimal count `N` becomes the unkeyed values
/// `"1"` through `"N"`; anything else is treated as a spreadsheet path and
/// read as CSV with a header row. An unreadable file or a count of zero
/// yields an error or an empty set for the caller to report.
pub fn load_loop_data(payload: &str) -> anyhow::Result<LoopItems> {
    let trimmed = payload.trim();
    if let Ok(count) = trimmed.parse::<u64>() {
        let values = (1..=count).map(|n| n.to_string()).collect();
        return Ok(LoopItems::Unkeyed(values));
    }
    load_spreadsheet(Path::new(trimmed))
}

fn load_spreadsheet(path: &Path) -> anyhow::Result<LoopItems> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open spreadsheet {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header row of {}", path.display()))?
        .clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let row = result.with_context(|| format!("failed to read row of {}", path.display()))?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(column, cell)| (column.to_string(), cell.to_string()))
            .collect();
        rows.push(record);
    }
    Ok(LoopItems::Keyed(rows))
}

/// Split a list-loop payload into its items: one per line, trimmed, with
/// blank lines dropped.
pub fn split_list(payload: &str) -> Vec<String> {
    payload
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn count_payload_expands_to_one_through_n() {
        let items = load_loop_data("3").unwrap();
        assert_eq!(
            items,
            LoopItems::Unkeyed(vec!["1".into(), "2".into(), "3".into()])
        );
    }

    #[test]
    fn zero_count_is_empty() {
        let items = load_loop_data("0").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn count_payload_tolerates_whitespace() {
        let items = load_loop_data(" 2 ").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn spreadsheet_rows_become_keyed_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.csv");
        fs::write(&path, "name,email\nada,ada@example.com\ngrace,grace@example.com\n").unwrap();

        let items = load_loop_data(path.to_str().unwrap()).unwrap();
        match items {
            LoopItems::Keyed(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(
                    rows[0],
                    vec![
                        ("name".to_string(), "ada".to_string()),
                        ("email".to_string(), "ada@example.com".to_string()),
                    ]
                );
                assert_eq!(rows[1][1].1, "grace@example.com");
            }
            LoopItems::Unkeyed(_) => panic!("expected keyed rows"),
        }
    }

    #[test]
    fn missing_spreadsheet_is_an_error() {
        let err = load_loop_data("/no/such/sheet.csv").unwrap_err();
        assert!(err.to_string().contains("sheet.csv"));
    }

    #[test]
    fn list_payload_trims_and_drops_blanks() {
        let items = split_list("alpha\n\n  beta \n\t\ngamma");
        assert_eq!(items, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn empty_list_payload_has_no_items() {
        assert!(split_list("\n  \n").is_empty());
    }

    #[test]
    fn frame_variable_name_follows_level() {
        let items = LoopItems::Unkeyed(vec!["1".into()]);
        assert_eq!(LoopFrame::new(0, items.clone(), 0).var_name(), "i");
        assert_eq!(LoopFrame::new(0, items.clone(), 1).var_name(), "i2");
        assert_eq!(LoopFrame::new(0, items, 4).var_name(), "i5");
    }

    #[test]
    fn stack_orders_frames_innermost_on_top() {
        let mut stack = LoopStack::new();
        stack.push(LoopFrame::new(0, LoopItems::Unkeyed(vec!["a".into()]), 0));
        stack.push(LoopFrame::new(3, LoopItems::Unkeyed(vec!["b".into()]), 1));

        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.top_mut().unwrap().start_index, 3);
        assert_eq!(stack.pop().unwrap().level, 1);
        assert_eq!(stack.depth(), 1);
    }
}
