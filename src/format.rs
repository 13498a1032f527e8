//! Moment-style date formatting for daily-note filenames.
//!
//! Supports the tokens daily-note settings commonly use: `YYYY`, `YY`,
//! `MMMM`, `MMM`, `MM`, `M`, `DDDD`, `DDD`, `DD`, `Do`, `D`, `dddd`, `ddd`,
//! `dd`, `d`, `WW`, `W`, `Q`, and `[literal]` escapes. Anything else is copied
//! through unchanged.

use chrono::{Datelike, NaiveDate};

// Longest first so `YYYY` wins over `YY`, `Do` over `D`.
const TOKENS: &[&str] = &[
	"YYYY", "MMMM", "DDDD", "dddd", "YY", "MMM", "DDD", "ddd", "MM", "DD", "Do", "dd", "WW", "M", "D", "d", "W", "Q",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
	pattern: String,
}

impl DateFormat {
	pub fn new(pattern: &str) -> Self {
		Self { pattern: pattern.to_string() }
	}

	pub fn render(&self, date: NaiveDate) -> String {
		let mut out = String::new();
		let mut rest = self.pattern.as_str();
		while !rest.is_empty() {
			if let Some(body) = rest.strip_prefix('[') {
				if let Some(close) = body.find(']') {
					out.push_str(&body[..close]);
					rest = &body[close + 1..];
					continue;
				}
			}
			if let Some(tok) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
				out.push_str(&render_token(tok, date));
				rest = &rest[tok.len()..];
				continue;
			}
			let ch = rest.chars().next().unwrap_or_default();
			out.push(ch);
			rest = &rest[ch.len_utf8()..];
		}
		out
	}
}

fn render_token(token: &str, date: NaiveDate) -> String {
	match token {
		"YYYY" => format!("{:04}", date.year()),
		"YY" => format!("{:02}", date.year().rem_euclid(100)),
		"MMMM" => date.format("%B").to_string(),
		"MMM" => date.format("%b").to_string(),
		"MM" => format!("{:02}", date.month()),
		"M" => date.month().to_string(),
		"DDDD" => format!("{:03}", date.ordinal()),
		"DDD" => date.ordinal().to_string(),
		"DD" => format!("{:02}", date.day()),
		"Do" => ordinal(date.day()),
		"D" => date.day().to_string(),
		"dddd" => date.format("%A").to_string(),
		"ddd" => date.format("%a").to_string(),
		"dd" => date.format("%a").to_string().chars().take(2).collect(),
		"d" => date.weekday().num_days_from_sunday().to_string(),
		"WW" => format!("{:02}", date.iso_week().week()),
		"W" => date.iso_week().week().to_string(),
		"Q" => ((date.month() - 1) / 3 + 1).to_string(),
		_ => token.to_string(),
	}
}

fn ordinal(day: u32) -> String {
	let suffix = match (day % 10, day % 100) {
		(_, 11..=13) => "th",
		(1, _) => "st",
		(2, _) => "nd",
		(3, _) => "rd",
		_ => "th",
	};
	format!("{day}{suffix}")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn date(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
	}

	#[test]
	fn renders_iso_pattern() {
		assert_eq!(DateFormat::new("YYYY-MM-DD").render(date(2024, 1, 5)), "2024-01-05");
	}

	#[test]
	fn renders_named_parts_and_literals() {
		let f = DateFormat::new("dddd, MMMM Do [week] W, YYYY");
		assert_eq!(f.render(date(2026, 2, 6)), "Friday, February 6th week 6, 2026");
	}

	#[test]
	fn renders_nested_folder_patterns() {
		let f = DateFormat::new("YYYY/MM-MMM/YYYY-MM-DD-ddd");
		assert_eq!(f.render(date(2024, 3, 11)), "2024/03-Mar/2024-03-11-Mon");
	}

	#[test]
	fn ordinals_handle_teens() {
		assert_eq!(ordinal(1), "1st");
		assert_eq!(ordinal(11), "11th");
		assert_eq!(ordinal(22), "22nd");
		assert_eq!(ordinal(13), "13th");
		assert_eq!(ordinal(23), "23rd");
	}
}
