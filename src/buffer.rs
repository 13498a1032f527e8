use std::collections::BTreeMap;

use crate::error::Result;
use crate::store::NoteStore;

/// Which end of the selection to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorEnd {
	From,
	To,
}

/// Line-addressed text being edited. Indices are 0-based.
pub trait TextBuffer {
	/// `None` past the last line.
	fn line(&self, index: usize) -> Option<&str>;
	fn set_line(&mut self, index: usize, text: &str);
	fn line_count(&self) -> usize;
	fn cursor_line(&self, end: CursorEnd) -> usize;
}

/// A note held in memory with a selection and a record of edited lines.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
	path: Option<String>,
	lines: Vec<String>,
	from: usize,
	to: usize,
	edited: BTreeMap<usize, String>,
}

impl LineBuffer {
	/// Buffer not backed by a note; selection covers every line.
	pub fn from_text(text: &str) -> Self {
		let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
		let to = lines.len().saturating_sub(1);
		Self { path: None, lines, from: 0, to, edited: BTreeMap::new() }
	}

	pub async fn load(store: &dyn NoteStore, path: &str) -> Result<Self> {
		let text = store.read(path).await?;
		let mut buffer = Self::from_text(&text);
		buffer.path = Some(path.to_string());
		Ok(buffer)
	}

	/// Clamps both ends into the buffer and orders them.
	pub fn select(&mut self, from: usize, to: usize) {
		let last = self.lines.len().saturating_sub(1);
		let (a, b) = if from <= to { (from, to) } else { (to, from) };
		self.from = a.min(last);
		self.to = b.min(last);
	}

	pub fn lines(&self) -> &[String] {
		&self.lines
	}

	pub fn is_dirty(&self) -> bool {
		!self.edited.is_empty()
	}

	/// Writes edited lines back into the note.
	///
	/// The note is re-read first and only edited indices are patched, so lines
	/// appended to the same note since `load` survive.
	pub async fn flush(&mut self, store: &dyn NoteStore) -> Result<bool> {
		let Some(path) = self.path.clone() else { return Ok(false) };
		if self.edited.is_empty() {
			return Ok(false);
		}
		let current = store.read(&path).await?;
		let newline = if current.contains("\r\n") { "\r\n" } else { "\n" };
		let mut lines: Vec<String> = current.lines().map(|l| l.to_string()).collect();
		for (idx, text) in &self.edited {
			if let Some(slot) = lines.get_mut(*idx) {
				*slot = text.clone();
			}
		}
		let mut contents = lines.join(newline);
		if current.ends_with('\n') { contents.push_str(newline); }
		store.write(&path, &contents).await?;
		log::debug!("event=buffer_flush module=buffer status=ok path={} lines={}", path, self.edited.len());
		self.edited.clear();
		Ok(true)
	}
}

impl TextBuffer for LineBuffer {
	fn line(&self, index: usize) -> Option<&str> {
		self.lines.get(index).map(|l| l.as_str())
	}

	fn set_line(&mut self, index: usize, text: &str) {
		if let Some(slot) = self.lines.get_mut(index) {
			*slot = text.to_string();
			self.edited.insert(index, text.to_string());
		}
	}

	fn line_count(&self) -> usize {
		self.lines.len()
	}

	fn cursor_line(&self, end: CursorEnd) -> usize {
		match end {
			CursorEnd::From => self.from,
			CursorEnd::To => self.to,
		}
	}
}
