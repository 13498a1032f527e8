//! Note storage. Paths are vault-relative and `/`-separated.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::normalize_path;
use crate::error::{Result, TaskNavError};

#[async_trait]
pub trait NoteStore: Send + Sync {
	async fn exists(&self, path: &str) -> bool;

	async fn read(&self, path: &str) -> Result<String>;

	/// Copies `src` to a new note at `dst`; fails with `NoteExists` if `dst` is present.
	async fn copy(&self, src: &str, dst: &str) -> Result<()>;

	/// Creates a new note; fails with `NoteExists` if `path` is present.
	async fn create(&self, path: &str, initial_text: &str) -> Result<()>;

	/// Writes `text` verbatim at the end of an existing note.
	async fn append(&self, path: &str, text: &str) -> Result<()>;

	/// Replaces the whole content of an existing note.
	async fn write(&self, path: &str, text: &str) -> Result<()>;

	async fn open(&self, path: &str) -> Result<()>;
}

/// Notes as files under a vault directory.
#[derive(Debug, Clone)]
pub struct FsNoteStore {
	root: PathBuf,
	opener: Option<PathBuf>,
}

impl FsNoteStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into(), opener: None }
	}

	/// Program launched with the note's file path on `open`.
	pub fn with_opener(mut self, opener: PathBuf) -> Self {
		self.opener = Some(opener);
		self
	}

	pub fn full_path(&self, path: &str) -> PathBuf {
		let mut full = self.root.clone();
		for part in normalize_path(path).split('/') {
			full.push(part);
		}
		full
	}

	async fn create_new(&self, path: &str, contents: &[u8], op: &'static str) -> Result<()> {
		let full = self.full_path(path);
		if let Some(parent) = full.parent() {
			fs::create_dir_all(parent).await.map_err(|e| TaskNavError::store(op, path, e))?;
		}
		let mut file = match OpenOptions::new().write(true).create_new(true).open(&full).await {
			Ok(f) => f,
			Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(TaskNavError::NoteExists(path.to_string())),
			Err(e) => return Err(TaskNavError::store(op, path, e)),
		};
		file.write_all(contents).await.map_err(|e| TaskNavError::store(op, path, e))?;
		file.flush().await.map_err(|e| TaskNavError::store(op, path, e))?;
		Ok(())
	}
}

fn not_found_or(op: &'static str, path: &str, e: std::io::Error) -> TaskNavError {
	if e.kind() == ErrorKind::NotFound {
		TaskNavError::NoteNotFound(path.to_string())
	} else {
		TaskNavError::store(op, path, e)
	}
}

#[async_trait]
impl NoteStore for FsNoteStore {
	async fn exists(&self, path: &str) -> bool {
		fs::try_exists(self.full_path(path)).await.unwrap_or(false)
	}

	async fn read(&self, path: &str) -> Result<String> {
		fs::read_to_string(self.full_path(path)).await.map_err(|e| not_found_or("read", path, e))
	}

	async fn copy(&self, src: &str, dst: &str) -> Result<()> {
		let contents = fs::read(self.full_path(src)).await.map_err(|e| not_found_or("copy", src, e))?;
		self.create_new(dst, &contents, "copy").await
	}

	async fn create(&self, path: &str, initial_text: &str) -> Result<()> {
		self.create_new(path, initial_text.as_bytes(), "create").await
	}

	async fn append(&self, path: &str, text: &str) -> Result<()> {
		let mut file = OpenOptions::new().append(true).open(self.full_path(path)).await.map_err(|e| not_found_or("append", path, e))?;
		file.write_all(text.as_bytes()).await.map_err(|e| TaskNavError::store("append", path, e))?;
		file.flush().await.map_err(|e| TaskNavError::store("append", path, e))?;
		Ok(())
	}

	async fn write(&self, path: &str, text: &str) -> Result<()> {
		let full = self.full_path(path);
		if !self.exists(path).await {
			return Err(TaskNavError::NoteNotFound(path.to_string()));
		}
		fs::write(&full, text).await.map_err(|e| TaskNavError::store("write", path, e))
	}

	async fn open(&self, path: &str) -> Result<()> {
		let full = self.full_path(path);
		if !self.exists(path).await {
			return Err(TaskNavError::NoteNotFound(path.to_string()));
		}
		println!("{}", full.display());
		if let Some(opener) = &self.opener {
			let status = tokio::process::Command::new(opener).arg(&full).status().await.map_err(|e| TaskNavError::store("open", path, e))?;
			if !status.success() {
				log::warn!("event=note_open module=store status=error path={} opener={} code={:?}", path, opener.display(), status.code());
			}
		}
		Ok(())
	}
}

/// In-memory notes with operation counters, latency and failure injection.
#[derive(Debug, Default)]
pub struct MemoryNoteStore {
	notes: Mutex<HashMap<String, String>>,
	failing: Mutex<HashSet<String>>,
	latency: Mutex<Option<Duration>>,
	opened: Mutex<Vec<String>>,
	creates: AtomicUsize,
	copies: AtomicUsize,
	appends: AtomicUsize,
}

impl MemoryNoteStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds a note without touching the counters.
	pub fn insert(&self, path: &str, text: &str) {
		self.notes.lock().unwrap_or_else(PoisonError::into_inner).insert(normalize_path(path), text.to_string());
	}

	pub fn contents(&self, path: &str) -> Option<String> {
		self.notes.lock().unwrap_or_else(PoisonError::into_inner).get(&normalize_path(path)).cloned()
	}

	/// Makes every write to `path` fail with an I/O error.
	pub fn fail_writes_to(&self, path: &str) {
		self.failing.lock().unwrap_or_else(PoisonError::into_inner).insert(normalize_path(path));
	}

	/// Delay applied before every operation completes.
	pub fn set_latency(&self, latency: Duration) {
		*self.latency.lock().unwrap_or_else(PoisonError::into_inner) = Some(latency);
	}

	pub fn create_count(&self) -> usize {
		self.creates.load(Ordering::SeqCst)
	}

	pub fn copy_count(&self) -> usize {
		self.copies.load(Ordering::SeqCst)
	}

	pub fn append_count(&self) -> usize {
		self.appends.load(Ordering::SeqCst)
	}

	pub fn opened(&self) -> Vec<String> {
		self.opened.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}

	async fn pause(&self) {
		let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
		match latency {
			Some(d) => tokio::time::sleep(d).await,
			None => tokio::task::yield_now().await,
		}
	}

	fn check_writable(&self, op: &'static str, path: &str) -> Result<()> {
		if self.failing.lock().unwrap_or_else(PoisonError::into_inner).contains(path) {
			return Err(TaskNavError::store(op, path, std::io::Error::new(ErrorKind::Other, "injected failure")));
		}
		Ok(())
	}

	fn insert_new(&self, op: &'static str, path: &str, text: String) -> Result<()> {
		self.check_writable(op, path)?;
		let mut notes = self.notes.lock().unwrap_or_else(PoisonError::into_inner);
		if notes.contains_key(path) {
			return Err(TaskNavError::NoteExists(path.to_string()));
		}
		notes.insert(path.to_string(), text);
		Ok(())
	}
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
	async fn exists(&self, path: &str) -> bool {
		self.pause().await;
		self.notes.lock().unwrap_or_else(PoisonError::into_inner).contains_key(&normalize_path(path))
	}

	async fn read(&self, path: &str) -> Result<String> {
		self.pause().await;
		let path = normalize_path(path);
		self.notes.lock().unwrap_or_else(PoisonError::into_inner).get(&path).cloned().ok_or(TaskNavError::NoteNotFound(path))
	}

	async fn copy(&self, src: &str, dst: &str) -> Result<()> {
		self.pause().await;
		self.copies.fetch_add(1, Ordering::SeqCst);
		let text = self.contents(src).ok_or_else(|| TaskNavError::NoteNotFound(src.to_string()))?;
		self.insert_new("copy", &normalize_path(dst), text)
	}

	async fn create(&self, path: &str, initial_text: &str) -> Result<()> {
		self.pause().await;
		self.creates.fetch_add(1, Ordering::SeqCst);
		self.insert_new("create", &normalize_path(path), initial_text.to_string())
	}

	async fn append(&self, path: &str, text: &str) -> Result<()> {
		self.pause().await;
		self.appends.fetch_add(1, Ordering::SeqCst);
		let path = normalize_path(path);
		self.check_writable("append", &path)?;
		let mut notes = self.notes.lock().unwrap_or_else(PoisonError::into_inner);
		let note = notes.get_mut(&path).ok_or_else(|| TaskNavError::NoteNotFound(path.clone()))?;
		note.push_str(text);
		Ok(())
	}

	async fn write(&self, path: &str, text: &str) -> Result<()> {
		self.pause().await;
		let path = normalize_path(path);
		self.check_writable("write", &path)?;
		let mut notes = self.notes.lock().unwrap_or_else(PoisonError::into_inner);
		let note = notes.get_mut(&path).ok_or_else(|| TaskNavError::NoteNotFound(path.clone()))?;
		*note = text.to_string();
		Ok(())
	}

	async fn open(&self, path: &str) -> Result<()> {
		let path = normalize_path(path);
		if !self.exists(&path).await {
			return Err(TaskNavError::NoteNotFound(path));
		}
		self.opened.lock().unwrap_or_else(PoisonError::into_inner).push(path);
		Ok(())
	}
}
