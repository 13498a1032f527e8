use crate::date::DateIdentity;
use crate::markers::origin_marker;
use crate::resolver::implicit_date;

/// Day to jump back to from `line`: its `<DATE` marker, else the day before
/// the current note (or before today when the note is not a daily note).
pub fn origin_date(line: &str, current_basename: Option<&str>, today: DateIdentity) -> DateIdentity {
	match origin_marker(line) {
		Some(marker) => implicit_date(Some(marker), 0, today),
		None => implicit_date(current_basename, -1, today),
	}
}
