use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskNavError {
	#[error("{op} failed for `{path}`: {source}")]
	Store {
		op: &'static str,
		path: String,
		#[source]
		source: std::io::Error,
	},
	#[error("note `{0}` does not exist")]
	NoteNotFound(String),
	#[error("note `{0}` already exists")]
	NoteExists(String),
	#[error("invalid config: {0}")]
	InvalidConfig(String),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("reschedule task aborted: {0}")]
	Task(String),
}

impl TaskNavError {
	pub fn store(op: &'static str, path: &str, source: std::io::Error) -> Self {
		Self::Store { op, path: path.to_string(), source }
	}
}

pub type Result<T> = std::result::Result<T, TaskNavError>;
