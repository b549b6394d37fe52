//! Tolerant interpretation of reply bodies.
//!
//! The server's schema is loosely typed: key casing differs between command
//! families, numbers sometimes arrive as strings, and the message key has two
//! spellings. Everything here defaults instead of failing, so callers only see
//! an error when the body is not JSON at all.

use serde_json::Value as JsonValue;

use crate::{COMMAND_KEY, DATA_KEY, MESSAGE_KEYS, Result, STATUS_KEY};

/// Reply status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
	/// The literal `"success"`.
	Success,
	/// `"fail"`, or anything other than `"success"`.
	Fail,
}

impl Status {
	/// Classifies a raw status string. Comparison ignores ASCII case.
	pub fn from_wire(raw: &str) -> Self {
		if raw.trim().eq_ignore_ascii_case("success") {
			Self::Success
		} else {
			Self::Fail
		}
	}
}

/// Decoded view of a reply body.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
	/// Echoed command name, empty when absent.
	pub command_echo: String,
	/// Raw status string as sent, empty when absent.
	pub status_raw: String,
	/// Interpreted status.
	pub status: Status,
	/// The `data` subtree, `Null` when absent.
	pub data: JsonValue,
	/// Message under either spelling.
	pub message: Option<String>,
	/// The complete reply body.
	pub body: JsonValue,
}

impl CommandResult {
	/// Parses a reply body. Fails only on malformed JSON.
	pub fn parse(json: &[u8]) -> Result<Self> {
		let body: JsonValue = serde_json::from_slice(json)?;
		Ok(Self::from_value(body))
	}

	/// Interprets an already-parsed reply body.
	pub fn from_value(body: JsonValue) -> Self {
		let command_echo = body.str_field(COMMAND_KEY);
		let status_raw = body.str_field(STATUS_KEY);
		let status = Status::from_wire(&status_raw);
		let data = body.field(DATA_KEY).cloned().unwrap_or(JsonValue::Null);
		let message = MESSAGE_KEYS.iter().find_map(|key| body.opt_str_field(key));
		Self {
			command_echo,
			status_raw,
			status,
			data,
			message,
			body,
		}
	}

	/// Returns true for a `"success"` status.
	pub fn is_success(&self) -> bool {
		self.status == Status::Success
	}

	/// Returns true when the echo names `command` (ASCII case-insensitive).
	pub fn echoes(&self, command: &str) -> bool {
		self.command_echo.eq_ignore_ascii_case(command)
	}
}

/// Lenient typed access into JSON objects.
///
/// Lookups try the exact key first and fall back to an ASCII
/// case-insensitive match. `null` counts as absent.
pub trait FieldExt {
	/// Raw field lookup.
	fn field(&self, key: &str) -> Option<&JsonValue>;

	/// First present field among `keys`.
	fn first_of(&self, keys: &[&str]) -> Option<&JsonValue> {
		keys.iter().find_map(|key| self.field(key))
	}

	/// Field rendered as text, `None` when absent.
	fn opt_str_field(&self, key: &str) -> Option<String> {
		self.field(key).and_then(text)
	}

	/// Field rendered as text, empty when absent.
	fn str_field(&self, key: &str) -> String {
		self.opt_str_field(key).unwrap_or_default()
	}

	/// Field as an integer. Accepts numbers and numeric strings.
	fn opt_int_field(&self, key: &str) -> Option<i64> {
		self.field(key).and_then(int)
	}

	/// Field as an integer, zero when absent or unparsable.
	fn int_field(&self, key: &str) -> i64 {
		self.opt_int_field(key).unwrap_or(0)
	}

	/// Field as a flag. Accepts booleans, `0`/`1` and their string forms.
	fn bool_field(&self, key: &str) -> bool {
		match self.field(key) {
			Some(JsonValue::Bool(b)) => *b,
			Some(JsonValue::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "y" | "yes"),
			Some(v) => int(v).is_some_and(|n| n != 0),
			None => false,
		}
	}

	/// Field as an array, empty when absent or not an array.
	fn list_field(&self, key: &str) -> &[JsonValue] {
		match self.field(key) {
			Some(JsonValue::Array(items)) => items,
			_ => &[],
		}
	}
}

impl FieldExt for JsonValue {
	fn field(&self, key: &str) -> Option<&JsonValue> {
		let obj = self.as_object()?;
		let found = obj.get(key).or_else(|| obj.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v));
		found.filter(|v| !v.is_null())
	}
}

/// Renders a scalar as text. Objects and arrays yield `None`.
pub fn text(value: &JsonValue) -> Option<String> {
	match value {
		JsonValue::String(s) => Some(s.clone()),
		JsonValue::Number(n) => Some(n.to_string()),
		JsonValue::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

/// Reads an integer from a number or numeric string.
pub fn int(value: &JsonValue) -> Option<i64> {
	match value {
		JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
		JsonValue::String(s) => s.trim().parse().ok(),
		JsonValue::Bool(b) => Some(i64::from(*b)),
		_ => None,
	}
}
