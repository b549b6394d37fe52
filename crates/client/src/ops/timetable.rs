//! Timetables, shift rules and the daily duty board.

use chrono::{NaiveDate, NaiveTime};
use parking_lot::Mutex;
use serde_json::json;
use shifter_proto::{Envelope, FieldExt, JsonValue, reply};

use super::{Caller, settle};
use crate::error::{Error, Result};
use crate::model::ShiftType;

const USER_TIMETABLE: &str = "ask_timetable_user";
const WEEKLY: &str = "ask_timetable_weekly";
const SHIFT_INFO: &str = "req_shift_info";
const TODAY_DUTY: &str = "check_today_duty";

/// Placeholder for a day without a shift code.
pub const NO_SHIFT: &str = "-";

/// One scheduled day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableEntry {
	/// Calendar day.
	pub date: NaiveDate,
	/// Assigned shift.
	pub shift: ShiftType,
	/// Scheduled hours.
	pub hours: i64,
	/// Schedule row id.
	pub schedule_uid: i64,
}

/// Team definition of one shift code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftRule {
	/// Shift code, e.g. `D`.
	pub duty_type: String,
	/// Start of the shift.
	pub start: NaiveTime,
	/// End of the shift.
	pub end: NaiveTime,
	/// Paid hours.
	pub hours: i64,
}

/// Staff on one shift today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutyGroup {
	/// Shift code or name as sent.
	pub shift: String,
	/// Staff names.
	pub staff: Vec<String>,
}

/// Timetable operations.
#[derive(Debug)]
pub struct TimetableClient {
	caller: Caller,
	rules: Mutex<Vec<ShiftRule>>,
}

impl TimetableClient {
	pub(crate) fn new(caller: Caller) -> Self {
		Self {
			caller,
			rules: Mutex::new(Vec::new()),
		}
	}

	/// The logged-in user's schedule for one month. Empty on any failure.
	///
	/// Rows with unparsable dates are skipped.
	pub async fn month(&self, year: i32, month: u32) -> Vec<TimetableEntry> {
		let envelope = Envelope::new(
			USER_TIMETABLE,
			json!({
				"req_year": format!("{year:04}"),
				"req_month": format!("{month:02}"),
				"staff_uid": self.caller.session().user_id(),
			}),
		);
		let res = self.caller.call_ok(envelope).await.map(|reply| {
			reply
				.result
				.data
				.list_field("time_table")
				.iter()
				.filter_map(|item| {
					let date = NaiveDate::parse_from_str(item.str_field("date").trim(), "%Y-%m-%d").ok()?;
					Some(TimetableEntry {
						date,
						shift: ShiftType::from_wire(&item.str_field("shift")),
						hours: item.int_field("hours"),
						schedule_uid: item.int_field("schedule_uid"),
					})
				})
				.collect()
		});
		settle(USER_TIMETABLE, res, Vec::new)
	}

	/// Upper-case shift codes for the seven days starting at `week_start`.
	///
	/// Days without a code, and every day on failure, read [`NO_SHIFT`].
	pub async fn weekly(&self, week_start: NaiveDate) -> [String; 7] {
		let envelope = Envelope::new(
			WEEKLY,
			json!({
				"date": week_start.format("%Y-%m-%d").to_string(),
				"staff_uid": self.caller.session().user_id(),
			}),
		);
		let res = self
			.caller
			.call_ok(envelope)
			.await
			.map(|reply| week_codes(reply.result.data.list_field("shift_type")));
		settle(WEEKLY, res, || std::array::from_fn(|_| NO_SHIFT.to_owned()))
	}

	/// The team's shift definitions. Cached after the first non-empty answer.
	pub async fn shift_rules(&self) -> Vec<ShiftRule> {
		{
			let rules = self.rules.lock();
			if !rules.is_empty() {
				return rules.clone();
			}
		}
		let envelope = Envelope::new(SHIFT_INFO, json!({ "team_uid": self.caller.session().team_code() }));
		let res = self
			.caller
			.call_ok(envelope)
			.await
			.map(|reply| reply.result.data.list_field("shift_info").iter().filter_map(shift_rule).collect::<Vec<_>>());
		let rules = settle(SHIFT_INFO, res, Vec::new);
		if !rules.is_empty() {
			*self.rules.lock() = rules.clone();
		}
		rules
	}

	/// Cached rule for `code`, ignoring case.
	pub fn shift_rule(&self, code: &str) -> Option<ShiftRule> {
		self.rules
			.lock()
			.iter()
			.find(|rule| rule.duty_type.eq_ignore_ascii_case(code))
			.cloned()
	}

	/// Who works which shift on `date` in the logged-in user's team.
	///
	/// Groups come back ordered D, E, N, O; groups without staff are dropped.
	pub async fn today_duty(&self, date: NaiveDate) -> Vec<DutyGroup> {
		let res = self.try_today_duty(date).await;
		settle(TODAY_DUTY, res, Vec::new)
	}

	async fn try_today_duty(&self, date: NaiveDate) -> Result<Vec<DutyGroup>> {
		let envelope = Envelope::new(
			TODAY_DUTY,
			json!({
				"date": date.format("%Y-%m-%d").to_string(),
				"team_uid": self.caller.session().team_code(),
			}),
		);
		let reply = self.caller.call(envelope).await?;
		let result = reply.result;
		// This command answers with an empty status on success.
		if !(result.is_success() || result.status_raw.trim().is_empty()) {
			return Err(Error::Application {
				command: TODAY_DUTY.into(),
				message: result.message,
			});
		}
		Ok(duty_groups(&result.data))
	}
}

fn week_codes(raw: &[JsonValue]) -> [String; 7] {
	std::array::from_fn(|i| {
		raw.get(i)
			.and_then(reply::text)
			.map(|code| code.trim().to_uppercase())
			.filter(|code| !code.is_empty())
			.unwrap_or_else(|| NO_SHIFT.to_owned())
	})
}

fn shift_rule(item: &JsonValue) -> Option<ShiftRule> {
	let duty_type = item.str_field("duty_type").trim().to_owned();
	if duty_type.is_empty() {
		return None;
	}
	Some(ShiftRule {
		duty_type,
		start: clock(&item.str_field("start_time")),
		end: clock(&item.str_field("end_time")),
		hours: item.int_field("duty_hours"),
	})
}

/// `HH:MM[:SS]`, midnight when absent or unparsable.
fn clock(raw: &str) -> NaiveTime {
	let raw = raw.trim();
	NaiveTime::parse_from_str(raw, "%H:%M:%S")
		.or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
		.unwrap_or(NaiveTime::MIN)
}

fn duty_groups(data: &JsonValue) -> Vec<DutyGroup> {
	let mut groups: Vec<DutyGroup> = data
		.as_array()
		.map(Vec::as_slice)
		.unwrap_or_default()
		.iter()
		.filter_map(|group| {
			let staff: Vec<String> = group
				.list_field("staff")
				.iter()
				.filter_map(reply::text)
				.filter(|name| !name.trim().is_empty())
				.collect();
			(!staff.is_empty()).then(|| DutyGroup {
				shift: group.str_field("shift"),
				staff,
			})
		})
		.collect();
	groups.sort_by_key(|group| ShiftType::rank(&group.shift));
	groups
}
