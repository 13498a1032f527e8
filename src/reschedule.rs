use crate::blocks::TaskBlock;
use crate::date::DateIdentity;
use crate::markers::{forward_marker, mark_rescheduled, origin_marker, strip_forward_marker};
use crate::resolver::implicit_date;

/// What moving one task block produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rescheduled {
	pub target_date: DateIdentity,
	/// Rewritten header followed by the untouched continuation lines.
	pub append_lines: Vec<String>,
	/// New text for the header line left behind in the source note.
	pub replacement_source_line: String,
}

/// Computes where `block` goes and how its header is rewritten.
///
/// `>DATE` in the header wins over the day after the source note. A marker
/// that fails calendar validation falls back to `today`, as does a source
/// note that is not a daily note.
pub fn apply(block: &TaskBlock, source_basename: &str, today: DateIdentity) -> Rescheduled {
	let header = block.header();
	let target_date = match forward_marker(header) {
		Some(marker) => implicit_date(Some(marker), 0, today),
		None => implicit_date(Some(source_basename), 1, today),
	};

	let mut rewritten = strip_forward_marker(header);
	if DateIdentity::parse_strict(source_basename).is_err() {
		rewritten.push_str(&format!(" [[{source_basename}]]"));
	} else if origin_marker(&rewritten).is_none() {
		rewritten.push_str(&format!(" <{source_basename}"));
	}

	let mut append_lines = Vec::with_capacity(block.lines().len());
	append_lines.push(rewritten);
	append_lines.extend(block.continuation().iter().cloned());

	Rescheduled { target_date, append_lines, replacement_source_line: mark_rescheduled(header) }
}
