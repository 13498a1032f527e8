use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::date::DateIdentity;
use crate::error::TaskNavError;

pub const DEFAULT_DAILY_NOTE_FORMAT: &str = "YYYY-MM-DD";
const NOTE_EXTENSION: &str = ".md";
const HOST_SETTINGS_FILE: &str = ".obsidian/daily-notes.json";

/// Where daily notes live and how they are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyNoteConfig {
	pub folder: String,
	pub date_format: String,
	/// Vault path of the template note, with or without `.md`; empty for none.
	pub template: String,
}

impl Default for DailyNoteConfig {
	fn default() -> Self {
		Self { folder: String::new(), date_format: DEFAULT_DAILY_NOTE_FORMAT.to_string(), template: String::new() }
	}
}

#[derive(Debug, Default, Deserialize)]
struct HostDailyNoteSettings {
	#[serde(default)]
	folder: Option<String>,
	#[serde(default)]
	format: Option<String>,
	#[serde(default)]
	template: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl DailyNoteConfig {
	/// Reads `.obsidian/daily-notes.json` under the vault, or defaults when absent.
	pub fn load(vault: &Path) -> Result<Self, TaskNavError> {
		let path = vault.join(HOST_SETTINGS_FILE);
		if !path.exists() {
			log::debug!("event=config_load module=config status=default path={}", path.display());
			return Ok(Self::default());
		}
		let raw = fs::read_to_string(&path).map_err(|source| TaskNavError::Store { op: "read", path: path.display().to_string(), source })?;
		let config = Self::from_json(&raw)?;
		log::debug!("event=config_load module=config status=ok path={} folder={} format={}", path.display(), config.folder, config.date_format);
		Ok(config)
	}

	pub fn from_json(raw: &str) -> Result<Self, TaskNavError> {
		let settings: HostDailyNoteSettings = serde_json::from_str(raw)?;
		let defaults = Self::default();
		Ok(Self {
			folder: non_empty(settings.folder).unwrap_or(defaults.folder),
			date_format: non_empty(settings.format).unwrap_or(defaults.date_format),
			template: non_empty(settings.template).unwrap_or(defaults.template),
		})
	}

	/// Overrides individual fields; `None` keeps the current value.
	pub fn with_overrides(mut self, folder: Option<String>, date_format: Option<String>, template: Option<String>) -> Result<Self, TaskNavError> {
		if let Some(f) = folder { self.folder = f; }
		if let Some(f) = date_format {
			if f.trim().is_empty() {
				return Err(TaskNavError::InvalidConfig("date format cannot be empty".to_string()));
			}
			self.date_format = f;
		}
		if let Some(t) = template { self.template = t; }
		Ok(self)
	}

	pub fn note_for(&self, date: DateIdentity) -> NoteIdentity {
		let path = normalize_path(&format!("{}/{}{}", self.folder, date.format(&self.date_format), NOTE_EXTENSION));
		NoteIdentity { date, path }
	}

	pub fn template_path(&self) -> Option<String> {
		let t = self.template.trim();
		if t.is_empty() {
			return None;
		}
		let with_ext = if t.ends_with(NOTE_EXTENSION) { t.to_string() } else { format!("{t}{NOTE_EXTENSION}") };
		Some(normalize_path(&with_ext))
	}
}

/// A daily note: its date and its vault-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteIdentity {
	pub date: DateIdentity,
	pub path: String,
}

/// Collapses `\` and repeated `/` into single `/` and strips leading/trailing ones.
pub fn normalize_path(path: &str) -> String {
	path.replace('\\', "/").split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>().join("/")
}

/// File name without folder and extension, as used for note identity.
pub fn basename(path: &str) -> String {
	let normalized = normalize_path(path);
	let name = normalized.rsplit('/').next().unwrap_or_default();
	name.strip_suffix(NOTE_EXTENSION).unwrap_or(name).to_string()
}
