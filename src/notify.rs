use std::process::Stdio;
use std::sync::{Mutex, PoisonError};

use colored::Colorize;
use tokio::process::Command;

const NOTIFY_TITLE: &str = "tasknav";

/// User-visible, non-fatal messages.
pub trait Notifier: Send + Sync {
	fn notice(&self, message: &str);
	fn failure(&self, message: &str);
}

/// Prints to stderr; optionally mirrors failures to the desktop via `notify-send`.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier {
	desktop: bool,
}

impl ConsoleNotifier {
	pub fn new(desktop: bool) -> Self {
		Self { desktop }
	}

	// Spawned and left to run; the caller may be a runtime worker.
	fn send_desktop(&self, urgency: &str, message: &str) {
		if !self.desktop { return; }
		if which::which("notify-send").is_err() {
			log::debug!("event=desktop_notify module=notify status=skipped reason=notify_send_missing");
			return;
		}
		if tokio::runtime::Handle::try_current().is_err() {
			log::debug!("event=desktop_notify module=notify status=skipped reason=no_runtime");
			return;
		}
		if let Err(e) = desktop_command(urgency, message).spawn() {
			log::warn!("event=desktop_notify module=notify status=error error={}", e);
		}
	}
}

fn desktop_command(urgency: &str, message: &str) -> Command {
	let mut cmd = Command::new("notify-send");
	cmd.arg("-u").arg(urgency).arg(NOTIFY_TITLE).arg(message).stdout(Stdio::null()).stderr(Stdio::null());
	cmd
}

impl Notifier for ConsoleNotifier {
	fn notice(&self, message: &str) {
		eprintln!("{} {}", "•".cyan(), message);
		self.send_desktop("low", message);
	}

	fn failure(&self, message: &str) {
		eprintln!("{} {}", "error:".red().bold(), message);
		self.send_desktop("critical", message);
	}
}

/// Keeps every message; for hosts that render notices themselves.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
	notices: Mutex<Vec<String>>,
	failures: Mutex<Vec<String>>,
}

impl RecordingNotifier {
	pub fn notices(&self) -> Vec<String> {
		self.notices.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}

	pub fn failures(&self) -> Vec<String> {
		self.failures.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}
}

impl Notifier for RecordingNotifier {
	fn notice(&self, message: &str) {
		self.notices.lock().unwrap_or_else(PoisonError::into_inner).push(message.to_string());
	}

	fn failure(&self, message: &str) {
		self.failures.lock().unwrap_or_else(PoisonError::into_inner).push(message.to_string());
	}
}
