//! Line predicates and provenance markers.
//!
//! - Task header: `- [c]` where `c` is one character other than `>`, `x`, `X`, `-`.
//! - Continuation: a line starting with `>` or a tab.
//! - Forward marker: `>YYYY-MM-DD`, the explicit reschedule target.
//! - Origin marker: `<YYYY-MM-DD`, the day a task was moved from.
//!
//! Marker lookups use the first textual match in the line.

use once_cell::sync::Lazy;
use regex::Regex;

static TASK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^- \[[^\]>xX\-]\]").expect("valid task regex"));
static CONTINUATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[>\t]").expect("valid continuation regex"));
static FORWARD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r">(\d{4}-\d{2}-\d{2})").expect("valid forward marker regex"));
static ORIGIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(\d{4}-\d{2}-\d{2})").expect("valid origin marker regex"));

pub const RESCHEDULED_CHECKBOX: &str = "- [>]";

pub fn is_task_line(line: &str) -> bool {
	TASK_RE.is_match(line)
}

pub fn is_continuation_line(line: &str) -> bool {
	CONTINUATION_RE.is_match(line)
}

/// Date text of the first `>YYYY-MM-DD`, not yet calendar-checked.
pub fn forward_marker(line: &str) -> Option<&str> {
	FORWARD_RE.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Date text of the first `<YYYY-MM-DD`, not yet calendar-checked.
pub fn origin_marker(line: &str) -> Option<&str> {
	ORIGIN_RE.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

pub fn strip_forward_marker(line: &str) -> String {
	FORWARD_RE.replacen(line, 1, "").into_owned()
}

/// Swaps the leading checkbox for `- [>]`; non-task lines come back unchanged.
pub fn mark_rescheduled(line: &str) -> String {
	TASK_RE.replacen(line, 1, RESCHEDULED_CHECKBOX).into_owned()
}
