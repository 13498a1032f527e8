//! Process-wide logging bootstrap.
//!
//! # Invariants
//! - The logger is started at most once per process.
//! - Re-initialization with the same level is a no-op; a different level is rejected.
//! - `RUST_LOG`, when set, takes precedence over the requested level.

use flexi_logger::{Logger, LoggerHandle};
use once_cell::sync::OnceCell;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
	level: &'static str,
	_logger: LoggerHandle,
}

/// Starts stderr logging at `level` (`trace|debug|info|warn|error`).
pub fn init_logging(level: &str) -> Result<(), String> {
	let level = normalize_level(level)?;
	let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
		let logger = Logger::try_with_env_or_str(level)
			.map_err(|err| format!("invalid log level `{level}`: {err}"))?
			.log_to_stderr()
			.format_for_stderr(flexi_logger::default_format)
			.start()
			.map_err(|err| format!("failed to start logger: {err}"))?;
		log::debug!("event=core_init module=logging status=ok level={} version={}", level, env!("CARGO_PKG_VERSION"));
		Ok(LoggingState { level, _logger: logger })
	})?;
	if state.level != level {
		return Err(format!("logging already initialized with level `{}`; refusing to switch to `{}`", state.level, level));
	}
	Ok(())
}

pub fn logging_level() -> Option<&'static str> {
	LOGGING_STATE.get().map(|state| state.level)
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
	match level.trim().to_ascii_lowercase().as_str() {
		"trace" => Ok("trace"),
		"debug" => Ok("debug"),
		"info" => Ok("info"),
		"warn" | "warning" => Ok("warn"),
		"error" => Ok("error"),
		other => Err(format!("unsupported log level `{other}`; expected trace|debug|info|warn|error")),
	}
}
