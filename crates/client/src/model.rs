//! Domain enums shared by the operation clients.
//!
//! Every parser here is total: unknown wire values map to a documented
//! default instead of failing.

use std::fmt;

/// Work shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ShiftType {
	/// Day off. Also the fallback for unknown values.
	#[default]
	Off,
	/// Day shift (`D`).
	Day,
	/// Evening shift (`E`).
	Evening,
	/// Night shift (`N`).
	Night,
}

impl ShiftType {
	/// Parses a shift name (`day`, `evening`, `eve`, `night`, `off`) or code
	/// (`D`, `E`, `N`, `O`), ignoring case and surrounding whitespace.
	pub fn from_wire(raw: &str) -> Self {
		match raw.trim().to_ascii_lowercase().as_str() {
			"d" | "day" => Self::Day,
			"e" | "eve" | "evening" => Self::Evening,
			"n" | "night" => Self::Night,
			_ => Self::Off,
		}
	}

	/// One-letter wire code.
	pub const fn code(self) -> &'static str {
		match self {
			Self::Day => "D",
			Self::Evening => "E",
			Self::Night => "N",
			Self::Off => "O",
		}
	}

	/// Sort rank for duty boards: D, E, N, O, then anything unrecognized.
	pub fn rank(raw: &str) -> u8 {
		match raw.trim().to_ascii_lowercase().as_str() {
			"d" | "day" => 0,
			"e" | "eve" | "evening" => 1,
			"n" | "night" => 2,
			"o" | "off" => 3,
			_ => 4,
		}
	}
}

impl fmt::Display for ShiftType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(self.code())
	}
}

/// Handover note category. The server speaks Korean labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NoteType {
	/// `교대`: shift change.
	ShiftChange,
	/// `출장`: business trip.
	BusinessTrip,
	/// `휴가/부재`: leave or absence.
	Leave,
	/// `퇴사`: resignation.
	Resignation,
	/// `장비/물품`: equipment and supplies.
	Equipment,
	/// `기타`: anything else, including unknown labels.
	#[default]
	Other,
}

impl NoteType {
	/// Parses a server label. Unknown labels map to [`NoteType::Other`].
	pub fn from_wire(raw: &str) -> Self {
		match raw.trim() {
			"교대" => Self::ShiftChange,
			"출장" => Self::BusinessTrip,
			"휴가/부재" => Self::Leave,
			"퇴사" => Self::Resignation,
			"장비/물품" => Self::Equipment,
			_ => Self::Other,
		}
	}

	/// Server label.
	pub const fn label(self) -> &'static str {
		match self {
			Self::ShiftChange => "교대",
			Self::BusinessTrip => "출장",
			Self::Leave => "휴가/부재",
			Self::Resignation => "퇴사",
			Self::Equipment => "장비/물품",
			Self::Other => "기타",
		}
	}
}

impl fmt::Display for NoteType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(self.label())
	}
}

/// Review status of a work request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RequestStatus {
	/// Awaiting review (`대기`).
	#[default]
	Pending,
	/// Approved (`승인`).
	Approved,
	/// Rejected (`반려`).
	Rejected,
}

impl RequestStatus {
	/// Parses English or Korean status words. Unknown values are pending.
	pub fn from_wire(raw: &str) -> Self {
		let raw = raw.trim();
		if raw.eq_ignore_ascii_case("approved") || raw == "승인" {
			Self::Approved
		} else if raw.eq_ignore_ascii_case("rejected") || raw == "반려" {
			Self::Rejected
		} else {
			Self::Pending
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn shift_names_and_codes() {
		for (raw, want) in [
			("day", ShiftType::Day),
			("D", ShiftType::Day),
			(" Evening ", ShiftType::Evening),
			("e", ShiftType::Evening),
			("NIGHT", ShiftType::Night),
			("off", ShiftType::Off),
			("holiday", ShiftType::Off),
			("", ShiftType::Off),
		] {
			assert_eq!(ShiftType::from_wire(raw), want, "{raw:?}");
		}
		assert_eq!(ShiftType::Evening.code(), "E");
		assert_eq!(ShiftType::from_wire(ShiftType::Night.code()), ShiftType::Night);
	}

	#[test]
	fn duty_rank_orders_unknown_last() {
		let mut shifts = vec!["off", "X", "N", "Eve", "d"];
		shifts.sort_by_key(|s| ShiftType::rank(s));
		assert_eq!(shifts, ["d", "Eve", "N", "off", "X"]);
	}

	#[test]
	fn note_labels() {
		assert_eq!(NoteType::from_wire("휴가/부재"), NoteType::Leave);
		assert_eq!(NoteType::from_wire("unknown"), NoteType::Other);
		assert_eq!(NoteType::Equipment.label(), "장비/물품");
	}

	#[test]
	fn request_status_words() {
		assert_eq!(RequestStatus::from_wire("Approved"), RequestStatus::Approved);
		assert_eq!(RequestStatus::from_wire("반려"), RequestStatus::Rejected);
		assert_eq!(RequestStatus::from_wire("?"), RequestStatus::Pending);
	}
}
