//! Date-note resolution and on-demand creation.
//!
//! # Invariants
//! - A non-daily reference falls back to today; the offset still applies.
//! - At most one creation per note path is in flight inside one resolver.
//!   Concurrent `ensure_exists` calls for the same path share a single
//!   creation attempt and later callers observe its outcome.
//! - Creation never overwrites an existing note.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use crate::config::{DailyNoteConfig, NoteIdentity};
use crate::date::{Clock, DateIdentity};
use crate::error::{Result, TaskNavError};
use crate::notify::Notifier;
use crate::store::NoteStore;

/// `reference + offset` days, where an absent or non-date reference means today.
pub fn implicit_date(reference: Option<&str>, offset: i64, today: DateIdentity) -> DateIdentity {
	let base = reference.and_then(|r| DateIdentity::parse_strict(r).ok()).unwrap_or(today);
	base.add_days(offset)
}

type CreationSlot = Arc<OnceCell<()>>;

pub struct DateNoteResolver {
	config: DailyNoteConfig,
	store: Arc<dyn NoteStore>,
	clock: Arc<dyn Clock>,
	notifier: Arc<dyn Notifier>,
	in_flight: Mutex<HashMap<String, CreationSlot>>,
}

impl DateNoteResolver {
	pub fn new(config: DailyNoteConfig, store: Arc<dyn NoteStore>, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
		Self { config, store, clock, notifier, in_flight: Mutex::new(HashMap::new()) }
	}

	pub fn today(&self) -> DateIdentity {
		self.clock.today()
	}

	pub fn resolve(&self, reference: Option<&str>, offset: i64) -> NoteIdentity {
		self.config.note_for(implicit_date(reference, offset, self.today()))
	}

	pub fn note_for(&self, date: DateIdentity) -> NoteIdentity {
		self.config.note_for(date)
	}

	/// Makes sure the note exists. Returns `true` only for the call that created it.
	pub async fn ensure_exists(&self, note: &NoteIdentity) -> Result<bool> {
		let slot = self.slot_for(&note.path);
		let mut created = false;
		let created_flag = &mut created;
		let this = self;
		let path = note.path.as_str();
		let outcome = slot
			.get_or_try_init(|| async move {
				if this.store.exists(path).await {
					return Ok::<(), TaskNavError>(());
				}
				*created_flag = this.create_note(path).await?;
				Ok(())
			})
			.await
			.map(|_| ());
		self.release_slot(&note.path, &slot);
		outcome?;
		if created {
			log::info!("event=daily_note_create module=resolver status=ok path={}", note.path);
		}
		Ok(created)
	}

	/// `resolve` followed by `ensure_exists`.
	pub async fn referenced_note(&self, reference: Option<&str>, offset: i64) -> Result<NoteIdentity> {
		let note = self.resolve(reference, offset);
		self.ensure_exists(&note).await?;
		Ok(note)
	}

	fn slot_for(&self, path: &str) -> CreationSlot {
		let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
		Arc::clone(in_flight.entry(path.to_string()).or_default())
	}

	// Drops the registry entry once its attempt settled; callers already holding
	// the slot still see the result, new callers re-check the store.
	fn release_slot(&self, path: &str, slot: &CreationSlot) {
		let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
		if in_flight.get(path).is_some_and(|current| Arc::ptr_eq(current, slot)) && slot.initialized() {
			in_flight.remove(path);
		}
	}

	async fn create_note(&self, path: &str) -> Result<bool> {
		let template = match self.config.template_path() {
			Some(t) if self.store.exists(&t).await => Some(t),
			Some(t) => {
				log::debug!("event=template_lookup module=resolver status=missing template={}", t);
				None
			}
			None => None,
		};
		let result = match template {
			Some(template) => {
				self.notifier.notice(&format!("Copying template for daily note at {path}"));
				self.store.copy(&template, path).await
			}
			None => {
				self.notifier.notice(&format!("Creating empty daily note at {path}"));
				self.store.create(path, "").await
			}
		};
		match result {
			Ok(()) => Ok(true),
			Err(TaskNavError::NoteExists(_)) => {
				log::debug!("event=daily_note_create module=resolver status=exists path={}", path);
				Ok(false)
			}
			Err(e) => {
				log::warn!("event=daily_note_create module=resolver status=error path={} error={}", path, e);
				Err(e)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::date::FixedClock;
	use crate::notify::RecordingNotifier;
	use crate::store::MemoryNoteStore;
	use std::time::Duration;

	fn d(s: &str) -> DateIdentity {
		DateIdentity::parse_strict(s).expect("valid date")
	}

	fn resolver(config: DailyNoteConfig, store: &Arc<MemoryNoteStore>, notifier: &Arc<RecordingNotifier>) -> DateNoteResolver {
		DateNoteResolver::new(config, Arc::clone(store) as Arc<dyn NoteStore>, Arc::new(FixedClock(d("2024-06-15"))), Arc::clone(notifier) as Arc<dyn Notifier>)
	}

	#[test]
	fn implicit_date_applies_offset_to_reference_or_today() {
		let today = d("2024-06-15");
		assert_eq!(implicit_date(Some("2024-01-05"), 1, today), d("2024-01-06"));
		assert_eq!(implicit_date(Some("ProjectNotes"), 1, today), d("2024-06-16"));
		assert_eq!(implicit_date(Some("2024-02-30"), -1, today), d("2024-06-14"));
		assert_eq!(implicit_date(None, 0, today), today);
	}

	#[test]
	fn resolve_builds_path_from_config() {
		let store = Arc::new(MemoryNoteStore::new());
		let notifier = Arc::new(RecordingNotifier::default());
		let r = resolver(DailyNoteConfig { folder: "Daily".into(), ..DailyNoteConfig::default() }, &store, &notifier);
		let note = r.resolve(Some("2024-01-05"), 1);
		assert_eq!(note.path, "Daily/2024-01-06.md");
		assert_eq!(note.date, d("2024-01-06"));
		assert_eq!(r.resolve(Some("Inbox"), -1).path, "Daily/2024-06-14.md");
	}

	#[tokio::test]
	async fn ensure_exists_is_idempotent() {
		let store = Arc::new(MemoryNoteStore::new());
		let notifier = Arc::new(RecordingNotifier::default());
		let r = resolver(DailyNoteConfig::default(), &store, &notifier);
		let note = r.resolve(Some("2024-01-05"), 1);

		assert!(r.ensure_exists(&note).await.expect("first"));
		assert!(!r.ensure_exists(&note).await.expect("second"));
		assert_eq!(store.create_count(), 1);
		assert_eq!(store.contents(&note.path).as_deref(), Some(""));
		assert_eq!(notifier.notices(), vec!["Creating empty daily note at 2024-01-06.md"]);
	}

	#[tokio::test]
	async fn existing_note_is_left_alone() {
		let store = Arc::new(MemoryNoteStore::new());
		store.insert("2024-01-06.md", "keep me");
		let notifier = Arc::new(RecordingNotifier::default());
		let r = resolver(DailyNoteConfig::default(), &store, &notifier);
		assert!(!r.ensure_exists(&r.resolve(Some("2024-01-05"), 1)).await.expect("ensure"));
		assert_eq!(store.contents("2024-01-06.md").as_deref(), Some("keep me"));
		assert_eq!(store.create_count(), 0);
	}

	#[tokio::test]
	async fn template_is_copied_when_present() {
		let store = Arc::new(MemoryNoteStore::new());
		store.insert("Templates/Daily.md", "# Plan\n");
		let notifier = Arc::new(RecordingNotifier::default());
		let config = DailyNoteConfig { template: "Templates/Daily".into(), ..DailyNoteConfig::default() };
		let r = resolver(config, &store, &notifier);
		let note = r.referenced_note(None, 0).await.expect("ensure");
		assert_eq!(note.path, "2024-06-15.md");
		assert_eq!(store.contents("2024-06-15.md").as_deref(), Some("# Plan\n"));
		assert_eq!(store.copy_count(), 1);
		assert_eq!(store.create_count(), 0);
	}

	#[tokio::test]
	async fn missing_template_falls_back_to_empty_note() {
		let store = Arc::new(MemoryNoteStore::new());
		let notifier = Arc::new(RecordingNotifier::default());
		let config = DailyNoteConfig { template: "Templates/Gone".into(), ..DailyNoteConfig::default() };
		let r = resolver(config, &store, &notifier);
		r.referenced_note(Some("2024-01-05"), 0).await.expect("ensure");
		assert_eq!(store.contents("2024-01-05.md").as_deref(), Some(""));
		assert_eq!(store.copy_count(), 0);
		assert!(notifier.failures().is_empty());
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn concurrent_ensure_exists_creates_once() {
		let store = Arc::new(MemoryNoteStore::new());
		store.insert("Templates/Daily.md", "# Plan\n");
		store.set_latency(Duration::from_millis(20));
		let notifier = Arc::new(RecordingNotifier::default());
		let config = DailyNoteConfig { template: "Templates/Daily".into(), ..DailyNoteConfig::default() };
		let r = Arc::new(resolver(config, &store, &notifier));
		let note = r.resolve(Some("2024-01-05"), 1);

		let mut tasks = tokio::task::JoinSet::new();
		for _ in 0..8 {
			let r = Arc::clone(&r);
			let note = note.clone();
			tasks.spawn(async move { r.ensure_exists(&note).await });
		}
		let mut created = 0;
		while let Some(joined) = tasks.join_next().await {
			if joined.expect("task").expect("ensure") { created += 1; }
		}

		assert_eq!(created, 1);
		assert_eq!(store.copy_count(), 1);
		assert_eq!(store.create_count(), 0);
		assert_eq!(store.contents(&note.path).as_deref(), Some("# Plan\n"));
		assert_eq!(notifier.notices().len(), 1);
	}

	#[tokio::test]
	async fn failed_creation_surfaces_and_can_be_retried() {
		let store = Arc::new(MemoryNoteStore::new());
		store.fail_writes_to("2024-01-06.md");
		let notifier = Arc::new(RecordingNotifier::default());
		let r = resolver(DailyNoteConfig::default(), &store, &notifier);
		let note = r.resolve(Some("2024-01-05"), 1);
		let err = r.ensure_exists(&note).await.expect_err("injected failure");
		assert!(matches!(err, TaskNavError::Store { op: "create", .. }));
		assert!(r.ensure_exists(&note).await.is_err());
		assert_eq!(store.create_count(), 2);
		assert!(!store.exists(&note.path).await);
	}
}
