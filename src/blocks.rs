use crate::buffer::TextBuffer;
use crate::markers::{is_continuation_line, is_task_line};

/// A task header plus the quoted/indented lines directly under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskBlock {
	/// Buffer index of the header line.
	pub start: usize,
	lines: Vec<String>,
}

impl TaskBlock {
	/// `None` unless `header` is a task line and every other line continues it.
	pub fn new(start: usize, header: &str, continuation: Vec<String>) -> Option<Self> {
		if !is_task_line(header) || !continuation.iter().all(|l| is_continuation_line(l)) {
			return None;
		}
		let mut lines = Vec::with_capacity(continuation.len() + 1);
		lines.push(header.to_string());
		lines.extend(continuation);
		Some(Self { start, lines })
	}

	pub fn header(&self) -> &str {
		&self.lines[0]
	}

	pub fn continuation(&self) -> &[String] {
		&self.lines[1..]
	}

	pub fn lines(&self) -> &[String] {
		&self.lines
	}

	/// One past the last line of the block.
	pub fn end(&self) -> usize {
		self.start + self.lines.len()
	}
}

/// Lazily yields the task blocks whose header lies in `first..=last`.
///
/// Continuation lines are read past `last` until the first line that does
/// not continue the block or the buffer ends.
pub struct TaskBlocks<'a, B: TextBuffer + ?Sized> {
	buffer: &'a B,
	line: usize,
	last: usize,
}

pub fn scan<B: TextBuffer + ?Sized>(buffer: &B, first: usize, last: usize) -> TaskBlocks<'_, B> {
	let last = last.min(buffer.line_count().saturating_sub(1));
	TaskBlocks { buffer, line: first, last }
}

impl<B: TextBuffer + ?Sized> Iterator for TaskBlocks<'_, B> {
	type Item = TaskBlock;

	fn next(&mut self) -> Option<TaskBlock> {
		while self.line <= self.last {
			let Some(header) = self.buffer.line(self.line) else {
				self.line = self.last.saturating_add(1);
				return None;
			};
			if !is_task_line(header) {
				self.line += 1;
				continue;
			}
			let start = self.line;
			let mut lines = vec![header.to_string()];
			self.line += 1;
			while let Some(next) = self.buffer.line(self.line) {
				if !is_continuation_line(next) { break; }
				lines.push(next.to_string());
				self.line += 1;
			}
			return Some(TaskBlock { start, lines });
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::buffer::LineBuffer;

	fn buffer(lines: &[&str]) -> LineBuffer {
		LineBuffer::from_text(&lines.join("\n"))
	}

	#[test]
	fn groups_header_with_quoted_and_indented_lines() {
		let buf = buffer(&["- [ ] A", "> note", "\tsub", "- [x] done", "plain text"]);
		let blocks: Vec<_> = scan(&buf, 0, 4).collect();
		assert_eq!(blocks.len(), 1);
		assert_eq!(blocks[0].lines(), &["- [ ] A", "> note", "\tsub"]);
		assert_eq!(blocks[0].start, 0);
		assert_eq!(blocks[0].end(), 3);
	}

	#[test]
	fn last_line_task_is_a_single_line_block() {
		let buf = buffer(&["intro", "- [ ] last"]);
		let blocks: Vec<_> = scan(&buf, 0, 1).collect();
		assert_eq!(blocks.len(), 1);
		assert_eq!(blocks[0].lines(), &["- [ ] last"]);
		assert!(blocks[0].continuation().is_empty());
	}

	#[test]
	fn orphan_continuations_are_skipped() {
		let buf = buffer(&["> orphan", "\tindent", "- [ ] A", "plain", "> stray", "- [ ] B", "\tb1"]);
		let blocks: Vec<_> = scan(&buf, 0, 6).collect();
		assert_eq!(blocks.len(), 2);
		assert_eq!(blocks[0].lines(), &["- [ ] A"]);
		assert_eq!(blocks[1].lines(), &["- [ ] B", "\tb1"]);
		assert_eq!(blocks[1].start, 5);
	}

	#[test]
	fn adjacent_tasks_form_separate_blocks() {
		let buf = buffer(&["- [ ] A", "- [ ] B", "> b"]);
		let starts: Vec<_> = scan(&buf, 0, 2).map(|b| b.start).collect();
		assert_eq!(starts, vec![0, 1]);
	}

	#[test]
	fn continuation_may_extend_past_selection_end() {
		let buf = buffer(&["- [ ] A", "> a1", "> a2", "- [ ] B"]);
		let blocks: Vec<_> = scan(&buf, 0, 0).collect();
		assert_eq!(blocks.len(), 1);
		assert_eq!(blocks[0].lines().len(), 3);
	}

	#[test]
	fn headers_outside_the_range_are_ignored() {
		let buf = buffer(&["- [ ] A", "- [ ] B", "- [ ] C"]);
		let starts: Vec<_> = scan(&buf, 1, 1).map(|b| b.start).collect();
		assert_eq!(starts, vec![1]);
	}

	#[test]
	fn range_past_buffer_end_terminates() {
		let buf = buffer(&["- [ ] A"]);
		assert_eq!(scan(&buf, 0, 50).count(), 1);
		assert_eq!(scan(&buf, 3, 50).count(), 0);
		assert_eq!(scan(&LineBuffer::from_text(""), 0, usize::MAX).count(), 0);
	}

	#[test]
	fn task_block_new_validates_shape() {
		assert!(TaskBlock::new(0, "- [ ] A", vec!["> ok".into()]).is_some());
		assert!(TaskBlock::new(0, "- [x] A", vec![]).is_none());
		assert!(TaskBlock::new(0, "- [ ] A", vec!["plain".into()]).is_none());
	}
}
