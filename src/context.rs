//! Run-time variable bindings and `{name}` template substitution.
//!
//! Reprise steps may embed `{variable}` placeholders in their textual
//! payloads. During a run the [`ExecutionContext`] holds the live bindings:
//! loop variables (`i`, `i2`, ...) and any spreadsheet columns merged in by a
//! keyed loop.
//!
//! # Syntax
//!
//! - `{variable_name}` - replaced with the bound value
//! - a placeholder with no binding stays in the output verbatim, so a step
//!   typing literal braces keeps working with an empty context
//! - a `{` with no closing `}` is plain text

use std::collections::HashMap;

/// A segment of a templated string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Placeholder: {name}
    Placeholder(String),
}

/// Parse a string containing `{name}` placeholders.
///
/// Every brace-delimited span becomes a [`Segment::Placeholder`]; whether it
/// resolves is decided later against a context. Unterminated braces fall back
/// to literal text.
pub fn parse_template(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();
    let mut current_literal = String::new();

    while let Some(c) = chars.next() {
        if c != '{' {
            current_literal.push(c);
            continue;
        }

        // Read the placeholder name up to the closing brace.
        let mut name = String::new();
        let mut closed = false;
        for nc in chars.by_ref() {
            if nc == '}' {
                closed = true;
                break;
            }
            name.push(nc);
        }

        if closed {
            if !current_literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
            }
            segments.push(Segment::Placeholder(name));
        } else {
            // No closing brace until end of input: keep everything as typed.
            current_literal.push('{');
            current_literal.push_str(&name);
        }
    }

    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    segments
}

/// Check whether a string contains at least one complete placeholder.
pub fn has_placeholder(input: &str) -> bool {
    parse_template(input)
        .iter()
        .any(|seg| matches!(seg, Segment::Placeholder(_)))
}

/// Live name → value bindings for one run.
///
/// Owned exclusively by the active run: created fresh at run start, shared
/// down into invoked Components, and dropped when the run ends. Loop frames
/// write their variables here; keyed spreadsheet rows merge whole records.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    vars: HashMap<String, String>,
}

impl ExecutionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind one variable, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Look up a binding.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Merge a whole record, e.g. one spreadsheet row, into the context.
    pub fn merge<K, V>(&mut self, record: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in record {
            self.vars.insert(k.into(), v.into());
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Resolve every placeholder in `input` against the current bindings.
    ///
    /// Never fails: a placeholder with no binding is emitted verbatim,
    /// braces included.
    pub fn render(&self, input: &str) -> String {
        // Fast path: nothing that could be a placeholder.
        if !input.contains('{') {
            return input.to_string();
        }

        let mut result = String::with_capacity(input.len());
        for segment in parse_template(input) {
            match segment {
                Segment::Literal(text) => result.push_str(&text),
                Segment::Placeholder(name) => match self.vars.get(&name) {
                    Some(value) => result.push_str(value),
                    None => {
                        result.push('{');
                        result.push_str(&name);
                        result.push('}');
                    }
                },
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_only() {
        let result = parse_template("hello world");
        assert_eq!(result, vec![Segment::Literal("hello world".to_string())]);
    }

    #[test]
    fn parse_single_placeholder() {
        let result = parse_template("{name}");
        assert_eq!(result, vec![Segment::Placeholder("name".to_string())]);
    }

    #[test]
    fn parse_placeholder_with_surrounding_text() {
        let result = parse_template("hello {name}!");
        assert_eq!(
            result,
            vec![
                Segment::Literal("hello ".to_string()),
                Segment::Placeholder("name".to_string()),
                Segment::Literal("!".to_string()),
            ]
        );
    }

    #[test]
    fn parse_adjacent_placeholders() {
        let result = parse_template("{a}{b}");
        assert_eq!(
            result,
            vec![
                Segment::Placeholder("a".to_string()),
                Segment::Placeholder("b".to_string()),
            ]
        );
    }

    #[test]
    fn parse_unterminated_brace_is_literal() {
        let result = parse_template("broken {name");
        assert_eq!(result, vec![Segment::Literal("broken {name".to_string())]);
    }

    #[test]
    fn parse_empty_string() {
        assert!(parse_template("").is_empty());
    }

    #[test]
    fn has_placeholder_detects_complete_pairs() {
        assert!(has_placeholder("row {i}"));
        assert!(!has_placeholder("plain text"));
        assert!(!has_placeholder("only { open"));
    }

    #[test]
    fn render_replaces_bound_placeholder() {
        let mut ctx = ExecutionContext::new();
        ctx.set("x", "5");
        assert_eq!(ctx.render("{x}"), "5");
    }

    #[test]
    fn render_keeps_missing_placeholder_verbatim() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.render("{missing}"), "{missing}");
    }

    #[test]
    fn render_mixes_bound_and_missing() {
        let mut ctx = ExecutionContext::new();
        ctx.set("i", "3");
        assert_eq!(
            ctx.render("row {i} of {total}"),
            "row 3 of {total}"
        );
    }

    #[test]
    fn render_passes_through_plain_text() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.render("no braces here"), "no braces here");
    }

    #[test]
    fn render_handles_nested_loop_variables() {
        let mut ctx = ExecutionContext::new();
        ctx.set("i", "A");
        ctx.set("i2", "1");
        assert_eq!(ctx.render("{i}-{i2}"), "A-1");
    }

    #[test]
    fn set_overwrites_previous_binding() {
        let mut ctx = ExecutionContext::new();
        ctx.set("i", "1");
        ctx.set("i", "2");
        assert_eq!(ctx.get("i"), Some("2"));
    }

    #[test]
    fn merge_inserts_whole_record() {
        let mut ctx = ExecutionContext::new();
        ctx.merge(vec![("name", "kim"), ("email", "kim@example.com")]);
        assert_eq!(ctx.get("name"), Some("kim"));
        assert_eq!(ctx.get("email"), Some("kim@example.com"));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn merged_record_feeds_render() {
        let mut ctx = ExecutionContext::new();
        ctx.merge(vec![("url", "https://example.com")]);
        assert_eq!(ctx.render("open {url} now"), "open https://example.com now");
    }
}
