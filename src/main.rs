use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use directories::ProjectDirs;

use tasknav::config::basename;
use tasknav::logging::init_logging;
use tasknav::{Command, CommandOutcome, ConsoleNotifier, DailyNoteConfig, EditorView, FsNoteStore, LineBuffer, NoteStore, SystemClock, TaskNav};

#[derive(Parser)]
#[command(
	name = "tasknav",
	version,
	about = "Move open tasks between daily notes",
	long_about = "Reschedule markdown tasks between dated daily notes.\n\nFeatures:\n- Move open tasks (with their quoted/indented lines) to the next day or to a >YYYY-MM-DD target\n- Record where a task came from (<YYYY-MM-DD or [[note]]) and jump back to it\n- Step to the next/previous daily note, creating it from a template on demand",
	after_help = "Examples:\n  tasknav reschedule -n Daily/2024-01-05.md\n  tasknav reschedule -n Projects/Website.md --from 3 --to 9\n  tasknav back -n Daily/2024-01-06.md -l 4\n  tasknav next -n Daily/2024-01-05.md\n  tasknav --vault ~/notes --folder Daily --template Templates/Daily prev -n Daily/2024-01-05.md\n  tasknav commands"
)]
struct Cli {
	/// Vault directory (default: per-user data dir)
	#[arg(long = "vault", global = true)]
	vault: Option<PathBuf>,
	/// Daily note folder inside the vault
	#[arg(long = "folder", global = true)]
	folder: Option<String>,
	/// Daily note filename format, e.g. YYYY-MM-DD
	#[arg(long = "format", global = true)]
	format: Option<String>,
	/// Template note copied into new daily notes
	#[arg(long = "template", global = true)]
	template: Option<String>,
	/// Program used to open notes (looked up on PATH)
	#[arg(long = "open-with", global = true)]
	open_with: Option<String>,
	/// Also send desktop notifications
	#[arg(long = "desktop", global = true)]
	desktop: bool,
	/// Debug logging on stderr
	#[arg(short = 'v', long = "verbose", global = true)]
	verbose: bool,
	#[command(subcommand)]
	action: Action,
}

#[derive(Subcommand)]
enum Action {
	/// Reschedule open tasks in a note (default: the whole note)
	Reschedule {
		/// Active note, vault-relative
		#[arg(short = 'n', long = "note")]
		note: Option<String>,
		/// First selected line (1-based)
		#[arg(long = "from")]
		from: Option<usize>,
		/// Last selected line (1-based, inclusive)
		#[arg(long = "to")]
		to: Option<usize>,
	},
	/// Open the daily note a task came from (default: previous day)
	Back {
		/// Active note, vault-relative
		#[arg(short = 'n', long = "note")]
		note: Option<String>,
		/// Cursor line (1-based, default: 1)
		#[arg(short = 'l', long = "line")]
		line: Option<usize>,
	},
	/// Open the next day's note, creating it if needed
	Next {
		/// Active note, vault-relative
		#[arg(short = 'n', long = "note")]
		note: Option<String>,
	},
	/// Open the previous day's note, creating it if needed
	Prev {
		/// Active note, vault-relative
		#[arg(short = 'n', long = "note")]
		note: Option<String>,
	},
	/// List the available commands and their default hotkeys
	Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	init_logging(if cli.verbose { "debug" } else { "warn" }).map_err(|e| anyhow!(e))?;

	let (command, note, from, to) = match cli.action {
		Action::Commands => {
			for c in Command::ALL {
				println!("{:<32} {:<24} {}", c.id(), c.hotkey(), c.name());
			}
			return Ok(());
		}
		Action::Reschedule { note, from, to } => (Command::RescheduleSelection, note, from, to),
		Action::Back { note, line } => (Command::NavigateToOrigin, note, line, line),
		Action::Next { note } => (Command::NextDayNote, note, None, None),
		Action::Prev { note } => (Command::PreviousDayNote, note, None, None),
	};

	let vault = match cli.vault {
		Some(v) => v,
		None => data_dir()?,
	};
	let config = DailyNoteConfig::load(&vault)
		.with_context(|| format!("load daily note settings from {}", vault.display()))?
		.with_overrides(cli.folder, cli.format, cli.template)?;

	let mut store = FsNoteStore::new(&vault);
	if let Some(program) = cli.open_with {
		let opener = which::which(&program).with_context(|| format!("cannot find opener {}", program))?;
		store = store.with_opener(opener);
	}
	let store = Arc::new(store);
	let nav = TaskNav::new(config, store.clone(), Arc::new(SystemClock), Arc::new(ConsoleNotifier::new(cli.desktop)));

	let view = match note {
		Some(n) => Some(load_view(store.as_ref(), &n, from, to, command).await?),
		None => None,
	};

	let outcome = nav.run(command, view.as_ref()).await;
	match outcome {
		CommandOutcome::Unavailable => {
			println!("{} is unavailable: no active note (pass --note)", command.name());
			Ok(())
		}
		CommandOutcome::Failed(_) => std::process::exit(1),
		CommandOutcome::Completed(tasknav::CommandResult::Opened(_)) => Ok(()),
		CommandOutcome::Completed(tasknav::CommandResult::Rescheduled(report)) => {
			let Some(view) = view else { return Ok(()) };
			let mut buffer = Arc::try_unwrap(view.buffer)
				.map_err(|_| anyhow!("note buffer still in use"))?
				.into_inner()
				.unwrap_or_else(PoisonError::into_inner);
			buffer.flush(store.as_ref()).await.context("save source note")?;
			for m in &report.moved {
				println!("{} line {} -> {}", "moved".green(), m.source_line + 1, m.target.path);
			}
			if report.moved.is_empty() && report.failed.is_empty() && report.aborted == 0 {
				println!("No open tasks in selection");
			}
			if !report.failed.is_empty() || report.aborted > 0 {
				std::process::exit(1);
			}
			Ok(())
		}
	}
}

fn data_dir() -> Result<PathBuf> {
	let proj = ProjectDirs::from("dev", "local", "tasknav").context("cannot resolve project dirs")?;
	let dir = proj.data_dir().to_path_buf();
	fs::create_dir_all(&dir).with_context(|| format!("create data dir {}", dir.display()))?;
	Ok(dir)
}

async fn load_view(store: &dyn NoteStore, note: &str, from: Option<usize>, to: Option<usize>, command: Command) -> Result<EditorView<LineBuffer>> {
	let path = if note.ends_with(".md") { note.to_string() } else { format!("{note}.md") };
	if !store.exists(&path).await {
		bail!("note not found: {}", path);
	}
	let mut buffer = LineBuffer::load(store, &path).await.with_context(|| format!("read {}", path))?;
	let last = buffer.lines().len().saturating_sub(1);
	let first = from.map(|l| l.saturating_sub(1)).unwrap_or(0);
	let end = match (command, to) {
		(_, Some(l)) => l.saturating_sub(1),
		(Command::RescheduleSelection, None) => last,
		(_, None) => first,
	};
	buffer.select(first, end);
	Ok(EditorView::new(buffer, basename(&path)))
}
