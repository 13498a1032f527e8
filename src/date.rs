use std::fmt;
use std::str::FromStr;

use chrono::{Days, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::format::DateFormat;

static STRICT_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid strict date regex"));

/// A calendar date with no time component, written `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateIdentity(NaiveDate);

/// Text that looks like a date but is not one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date: {0}")]
pub struct InvalidDate(pub String);

impl DateIdentity {
	/// Accepts only `^\d{4}-\d{2}-\d{2}$` naming a real calendar day.
	pub fn parse_strict(text: &str) -> Result<Self, InvalidDate> {
		if !STRICT_DATE_RE.is_match(text) {
			return Err(InvalidDate(text.to_string()));
		}
		NaiveDate::parse_from_str(text, "%Y-%m-%d").map(Self).map_err(|_| InvalidDate(text.to_string()))
	}

	/// Calendar-correct; saturates at the ends of chrono's representable range.
	pub fn add_days(self, n: i64) -> Self {
		let shifted = if n >= 0 {
			self.0.checked_add_days(Days::new(n.unsigned_abs()))
		} else {
			self.0.checked_sub_days(Days::new(n.unsigned_abs()))
		};
		match shifted {
			Some(d) => Self(d),
			None if n >= 0 => Self(NaiveDate::MAX),
			None => Self(NaiveDate::MIN),
		}
	}

	pub fn format(&self, pattern: &str) -> String {
		DateFormat::new(pattern).render(self.0)
	}
}

impl fmt::Display for DateIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.format("%Y-%m-%d"))
	}
}

impl FromStr for DateIdentity {
	type Err = InvalidDate;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse_strict(s)
	}
}

/// Source of "today".
pub trait Clock: Send + Sync {
	fn today(&self) -> DateIdentity;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn today(&self) -> DateIdentity {
		DateIdentity(Local::now().date_naive())
	}
}

/// A clock pinned to one day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateIdentity);

impl Clock for FixedClock {
	fn today(&self) -> DateIdentity {
		self.0
	}
}
