//! The four host-facing commands.
//!
//! Every command needs an active editing view; without one it reports
//! itself unavailable and does nothing.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;

use crate::blocks;
use crate::buffer::{CursorEnd, TextBuffer};
use crate::config::{DailyNoteConfig, NoteIdentity};
use crate::date::{Clock, DateIdentity};
use crate::error::{Result, TaskNavError};
use crate::navigate;
use crate::notify::Notifier;
use crate::reschedule::{self, Rescheduled};
use crate::resolver::{implicit_date, DateNoteResolver};
use crate::store::NoteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	RescheduleSelection,
	NavigateToOrigin,
	NextDayNote,
	PreviousDayNote,
}

impl Command {
	pub const ALL: [Command; 4] = [Command::RescheduleSelection, Command::NavigateToOrigin, Command::NextDayNote, Command::PreviousDayNote];

	pub fn id(self) -> &'static str {
		match self {
			Command::RescheduleSelection => "tasknav-reschedule-command",
			Command::NavigateToOrigin => "tasknav-navigate-back-command",
			Command::NextDayNote => "tasknav-next-command",
			Command::PreviousDayNote => "tasknav-prev-command",
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Command::RescheduleSelection => "Reschedule tasks in the selection",
			Command::NavigateToOrigin => "Daily note of original task date",
			Command::NextDayNote => "Next day note (create if needed)",
			Command::PreviousDayNote => "Previous day note (create if needed)",
		}
	}

	/// Suggested default key binding.
	pub fn hotkey(self) -> &'static str {
		match self {
			Command::RescheduleSelection => "Ctrl+Shift+ArrowRight",
			Command::NavigateToOrigin => "Ctrl+Shift+ArrowLeft",
			Command::NextDayNote => "Ctrl+ArrowRight",
			Command::PreviousDayNote => "Ctrl+ArrowLeft",
		}
	}
}

/// The note being edited: its buffer and the basename of its file.
pub struct EditorView<B> {
	pub buffer: Arc<Mutex<B>>,
	pub basename: String,
}

impl<B> EditorView<B> {
	pub fn new(buffer: B, basename: impl Into<String>) -> Self {
		Self { buffer: Arc::new(Mutex::new(buffer)), basename: basename.into() }
	}
}

#[derive(Debug)]
pub enum CommandOutcome<T> {
	/// No active view.
	Unavailable,
	Completed(T),
	/// Already reported through the notifier.
	Failed(TaskNavError),
}

impl<T> CommandOutcome<T> {
	pub fn is_available(&self) -> bool {
		!matches!(self, CommandOutcome::Unavailable)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedBlock {
	/// Index of the header line in the source buffer.
	pub source_line: usize,
	pub target: NoteIdentity,
	pub lines: usize,
}

#[derive(Debug, Default)]
pub struct RescheduleReport {
	pub moved: Vec<MovedBlock>,
	/// Header line index and the error that stopped that block.
	pub failed: Vec<(usize, TaskNavError)>,
	/// Chains that panicked or were cancelled before reporting.
	pub aborted: usize,
}

#[derive(Debug)]
pub enum CommandResult {
	Rescheduled(RescheduleReport),
	Opened(NoteIdentity),
}

pub struct TaskNav {
	resolver: Arc<DateNoteResolver>,
	store: Arc<dyn NoteStore>,
	notifier: Arc<dyn Notifier>,
}

impl TaskNav {
	pub fn new(config: DailyNoteConfig, store: Arc<dyn NoteStore>, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
		let resolver = Arc::new(DateNoteResolver::new(config, Arc::clone(&store), clock, Arc::clone(&notifier)));
		Self { resolver, store, notifier }
	}

	pub fn is_available<B>(view: Option<&EditorView<B>>) -> bool {
		view.is_some()
	}

	pub async fn run<B>(&self, command: Command, view: Option<&EditorView<B>>) -> CommandOutcome<CommandResult>
	where
		B: TextBuffer + Send + 'static,
	{
		let outcome = match command {
			Command::RescheduleSelection => return map(self.reschedule_selection(view).await, CommandResult::Rescheduled),
			Command::NavigateToOrigin => self.navigate_to_origin(view).await,
			Command::NextDayNote => self.go_to_next_day(view).await,
			Command::PreviousDayNote => self.go_to_previous_day(view).await,
		};
		map(outcome, CommandResult::Opened)
	}

	/// Moves every task block whose header is in the selection.
	///
	/// Blocks are scanned in one synchronous pass; each block's
	/// resolve, append and mark chain then runs as its own task. A failing
	/// block is reported and does not stop the others.
	pub async fn reschedule_selection<B>(&self, view: Option<&EditorView<B>>) -> CommandOutcome<RescheduleReport>
	where
		B: TextBuffer + Send + 'static,
	{
		let Some(view) = view else { return CommandOutcome::Unavailable };
		let today = self.resolver.today();
		let mut chains = JoinSet::new();
		{
			let buffer = view.buffer.lock().unwrap_or_else(PoisonError::into_inner);
			let from = buffer.cursor_line(CursorEnd::From);
			let to = buffer.cursor_line(CursorEnd::To);
			for block in blocks::scan(&*buffer, from, to) {
				let plan = reschedule::apply(&block, &view.basename, today);
				log::debug!("event=block_scan module=commands line={} lines={} target={}", block.start, block.lines().len(), plan.target_date);
				let resolver = Arc::clone(&self.resolver);
				let store = Arc::clone(&self.store);
				let shared = Arc::clone(&view.buffer);
				let start = block.start;
				chains.spawn(async move { (start, move_block(resolver, store, shared, start, plan).await) });
			}
		}

		let mut report = RescheduleReport::default();
		while let Some(joined) = chains.join_next().await {
			let (line, result) = match joined {
				Ok(pair) => pair,
				Err(e) => {
					let err = TaskNavError::Task(e.to_string());
					self.notifier.failure(&err.to_string());
					log::error!("event=block_move module=commands status=aborted error={}", err);
					report.aborted += 1;
					continue;
				}
			};
			match result {
				Ok(moved) => report.moved.push(moved),
				Err(e) => {
					self.notifier.failure(&format!("Could not reschedule task on line {}: {e}", line + 1));
					log::warn!("event=block_move module=commands status=error line={} error={}", line, e);
					report.failed.push((line, e));
				}
			}
		}
		report.moved.sort_by_key(|m| m.source_line);
		report.failed.sort_by_key(|(line, _)| *line);
		log::info!("event=reschedule module=commands status=ok note={} moved={} failed={}", view.basename, report.moved.len(), report.failed.len());
		CommandOutcome::Completed(report)
	}

	/// Opens the day the task under the cursor came from.
	pub async fn navigate_to_origin<B: TextBuffer>(&self, view: Option<&EditorView<B>>) -> CommandOutcome<NoteIdentity> {
		let Some(view) = view else { return CommandOutcome::Unavailable };
		let line = {
			let buffer = view.buffer.lock().unwrap_or_else(PoisonError::into_inner);
			buffer.line(buffer.cursor_line(CursorEnd::From)).unwrap_or_default().to_string()
		};
		let date = navigate::origin_date(&line, Some(&view.basename), self.resolver.today());
		self.open_date(date).await
	}

	pub async fn go_to_next_day<B>(&self, view: Option<&EditorView<B>>) -> CommandOutcome<NoteIdentity> {
		self.go_relative(view, 1).await
	}

	pub async fn go_to_previous_day<B>(&self, view: Option<&EditorView<B>>) -> CommandOutcome<NoteIdentity> {
		self.go_relative(view, -1).await
	}

	async fn go_relative<B>(&self, view: Option<&EditorView<B>>, offset: i64) -> CommandOutcome<NoteIdentity> {
		let Some(view) = view else { return CommandOutcome::Unavailable };
		let date = implicit_date(Some(&view.basename), offset, self.resolver.today());
		self.open_date(date).await
	}

	async fn open_date(&self, date: DateIdentity) -> CommandOutcome<NoteIdentity> {
		let note = self.resolver.note_for(date);
		let opened = async {
			self.resolver.ensure_exists(&note).await?;
			self.store.open(&note.path).await
		};
		match opened.await {
			Ok(()) => {
				log::info!("event=note_open module=commands status=ok path={}", note.path);
				CommandOutcome::Completed(note)
			}
			Err(e) => {
				self.notifier.failure(&format!("Could not open daily note {}: {e}", note.path));
				CommandOutcome::Failed(e)
			}
		}
	}
}

fn map<T, U>(outcome: CommandOutcome<T>, f: impl FnOnce(T) -> U) -> CommandOutcome<U> {
	match outcome {
		CommandOutcome::Unavailable => CommandOutcome::Unavailable,
		CommandOutcome::Completed(v) => CommandOutcome::Completed(f(v)),
		CommandOutcome::Failed(e) => CommandOutcome::Failed(e),
	}
}

// The block's lines go out in a single append, header first, so blocks sharing
// a target never interleave. The source is marked only after that lands.
async fn move_block<B: TextBuffer>(resolver: Arc<DateNoteResolver>, store: Arc<dyn NoteStore>, buffer: Arc<Mutex<B>>, start: usize, plan: Rescheduled) -> Result<MovedBlock> {
	let target = resolver.note_for(plan.target_date);
	resolver.ensure_exists(&target).await?;
	let text: String = plan.append_lines.iter().map(|line| format!("\n{line}")).collect();
	store.append(&target.path, &text).await?;
	buffer.lock().unwrap_or_else(PoisonError::into_inner).set_line(start, &plan.replacement_source_line);
	Ok(MovedBlock { source_line: start, target, lines: plan.append_lines.len() })
}
