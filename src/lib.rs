//! Move open tasks between dated daily notes.
//!
//! Task blocks (a `- [ ]` header plus quoted or tab-indented lines) are
//! copied to the next daily note, or to the day named by a `>YYYY-MM-DD`
//! marker, with provenance added (`<YYYY-MM-DD` or `[[note]]`). The source
//! header is left behind as `- [>]`.

pub mod blocks;
pub mod buffer;
pub mod commands;
pub mod config;
pub mod date;
pub mod error;
pub mod format;
pub mod logging;
pub mod markers;
pub mod navigate;
pub mod notify;
pub mod reschedule;
pub mod resolver;
pub mod store;

pub use buffer::{CursorEnd, LineBuffer, TextBuffer};
pub use commands::{Command, CommandOutcome, CommandResult, EditorView, MovedBlock, RescheduleReport, TaskNav};
pub use config::{DailyNoteConfig, NoteIdentity};
pub use date::{Clock, DateIdentity, FixedClock, InvalidDate, SystemClock};
pub use error::TaskNavError;
pub use notify::{ConsoleNotifier, Notifier, RecordingNotifier};
pub use resolver::DateNoteResolver;
pub use store::{FsNoteStore, MemoryNoteStore, NoteStore};
