use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError};

use tasknav::{
	CommandOutcome, DailyNoteConfig, DateIdentity, EditorView, FixedClock, FsNoteStore, LineBuffer, NoteStore, RecordingNotifier, TaskNav,
};

fn today() -> DateIdentity {
	DateIdentity::parse_strict("2024-06-15").expect("valid date")
}

fn setup(vault: &Path, config: DailyNoteConfig) -> (Arc<FsNoteStore>, Arc<RecordingNotifier>, TaskNav) {
	let store = Arc::new(FsNoteStore::new(vault));
	let notifier = Arc::new(RecordingNotifier::default());
	let nav = TaskNav::new(config, store.clone(), Arc::new(FixedClock(today())), notifier.clone());
	(store, notifier, nav)
}

async fn view(store: &FsNoteStore, path: &str, basename: &str) -> EditorView<LineBuffer> {
	let buffer = LineBuffer::load(store, path).await.expect("load note");
	EditorView::new(buffer, basename)
}

async fn flush(store: &FsNoteStore, view: EditorView<LineBuffer>) {
	let mut buffer = Arc::try_unwrap(view.buffer).ok().expect("buffer released").into_inner().unwrap_or_else(PoisonError::into_inner);
	buffer.flush(store).await.expect("flush");
}

#[tokio::test]
async fn reschedules_daily_note_into_template_backed_next_day() {
	let dir = tempfile::tempdir().expect("tempdir");
	let vault = dir.path();
	fs::create_dir_all(vault.join("Daily")).expect("mkdir");
	fs::create_dir_all(vault.join("Templates")).expect("mkdir");
	fs::write(vault.join("Templates/Daily.md"), "# Tasks").expect("template");
	fs::write(vault.join("Daily/2024-01-05.md"), "# Tasks\n- [ ] Buy milk\n> whole, not skim\n- [x] Done thing\n- [ ] Call Bob >2024-02-01\n").expect("source");

	let config = DailyNoteConfig { folder: "Daily".into(), template: "Templates/Daily".into(), ..DailyNoteConfig::default() };
	let (store, notifier, nav) = setup(vault, config);
	let v = view(&store, "Daily/2024-01-05.md", "2024-01-05").await;

	let CommandOutcome::Completed(report) = nav.reschedule_selection(Some(&v)).await else { panic!("expected completion") };
	assert_eq!(report.moved.len(), 2);
	flush(&store, v).await;

	let next = fs::read_to_string(vault.join("Daily/2024-01-06.md")).expect("next day");
	assert_eq!(next, "# Tasks\n- [ ] Buy milk <2024-01-05\n> whole, not skim");
	let feb = fs::read_to_string(vault.join("Daily/2024-02-01.md")).expect("forward target");
	assert_eq!(feb, "# Tasks\n- [ ] Call Bob  <2024-01-05");
	let source = fs::read_to_string(vault.join("Daily/2024-01-05.md")).expect("source");
	assert_eq!(source, "# Tasks\n- [>] Buy milk\n> whole, not skim\n- [x] Done thing\n- [>] Call Bob >2024-02-01\n");
	assert_eq!(notifier.notices().len(), 2);
	assert!(notifier.failures().is_empty());
}

#[tokio::test]
async fn project_note_tasks_link_back_and_land_tomorrow() {
	let dir = tempfile::tempdir().expect("tempdir");
	let vault = dir.path();
	fs::write(vault.join("ProjectNotes.md"), "- [ ] Review PR\n\t- check tests").expect("source");

	let (store, _notifier, nav) = setup(vault, DailyNoteConfig::default());
	let v = view(&store, "ProjectNotes.md", "ProjectNotes").await;
	nav.reschedule_selection(Some(&v)).await;
	flush(&store, v).await;

	assert_eq!(fs::read_to_string(vault.join("2024-06-16.md")).expect("tomorrow"), "\n- [ ] Review PR [[ProjectNotes]]\n\t- check tests");
	assert_eq!(fs::read_to_string(vault.join("ProjectNotes.md")).expect("source"), "- [>] Review PR\n\t- check tests");
}

#[tokio::test]
async fn back_navigation_follows_origin_marker_after_a_move() {
	let dir = tempfile::tempdir().expect("tempdir");
	let vault = dir.path();
	fs::write(vault.join("2024-01-05.md"), "- [ ] Buy milk").expect("source");

	let (store, _notifier, nav) = setup(vault, DailyNoteConfig::default());
	let v = view(&store, "2024-01-05.md", "2024-01-05").await;
	nav.reschedule_selection(Some(&v)).await;
	flush(&store, v).await;

	let mut moved = LineBuffer::load(store.as_ref(), "2024-01-06.md").await.expect("load target");
	moved.select(1, 1);
	let target_view = EditorView::new(moved, "2024-01-06");
	let CommandOutcome::Completed(note) = nav.navigate_to_origin(Some(&target_view)).await else { panic!("expected completion") };
	assert_eq!(note.path, "2024-01-05.md");
}

#[tokio::test]
async fn task_moved_into_its_own_note_keeps_both_edits() {
	let dir = tempfile::tempdir().expect("tempdir");
	let vault = dir.path();
	fs::write(vault.join("2024-01-05.md"), "- [ ] Again >2024-01-05\n").expect("source");

	let (store, _notifier, nav) = setup(vault, DailyNoteConfig::default());
	let v = view(&store, "2024-01-05.md", "2024-01-05").await;
	nav.reschedule_selection(Some(&v)).await;
	flush(&store, v).await;

	let text = store.read("2024-01-05.md").await.expect("read");
	assert_eq!(text, "- [>] Again >2024-01-05\n\n- [ ] Again  <2024-01-05");
}
