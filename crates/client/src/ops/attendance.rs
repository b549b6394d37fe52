//! Check-in, check-out and attendance lookups.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;
use shifter_proto::{Envelope, FieldExt};
use tracing::info;

use super::{Ack, Caller, settle};
use crate::error::{Error, Result};

const CHECK_IN: &str = "ask_check_in";
const CHECK_OUT: &str = "ask_check_out";
const ATTENDANCE_INFO: &str = "attendance_info";

/// Bare check-out times before this hour belong to the next day.
const NIGHT_CUTOFF_HOUR: u32 = 6;

/// Check-in and check-out times for one business day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceRecord {
	/// Check-in time.
	pub check_in: Option<NaiveDateTime>,
	/// Check-out time.
	pub check_out: Option<NaiveDateTime>,
}

/// Attendance operations.
#[derive(Debug)]
pub struct AttendanceClient {
	caller: Caller,
}

impl AttendanceClient {
	pub(crate) fn new(caller: Caller) -> Self {
		Self { caller }
	}

	/// Opens an attendance record and caches its id.
	///
	/// The cache is untouched on failure.
	pub async fn check_in(&self) -> bool {
		let res = self.try_check_in().await;
		settle(CHECK_IN, res.map(|_| true), || false)
	}

	async fn try_check_in(&self) -> Result<i64> {
		let session = self.caller.session();
		let envelope = Envelope::new(
			CHECK_IN,
			json!({ "staff_uid": session.user_id(), "team_uid": session.team_code() }),
		);
		let reply = self.caller.call_ok(envelope).await?;
		let id = reply
			.result
			.data
			.opt_int_field("check_in_uid")
			.ok_or_else(|| Error::Parse("check_in_uid missing".into()))?;
		session.set_check_in_id(id);
		info!(check_in_id = id, "checked in");
		Ok(id)
	}

	/// Closes the cached attendance record.
	pub async fn check_out(&self) -> Ack {
		let envelope = Envelope::new(
			CHECK_OUT,
			json!({ "check_in_uid": self.caller.session().check_in_id() }),
		);
		match self.caller.call(envelope).await {
			Ok(reply) => Ack::from_reply(&reply.result),
			Err(e) => {
				tracing::warn!(command = CHECK_OUT, error = %e, "operation failed");
				Ack::from_error(&e)
			}
		}
	}

	/// Attendance of the logged-in user on `date`.
	pub async fn attendance_on(&self, date: NaiveDate) -> Option<AttendanceRecord> {
		let envelope = Envelope::new(
			ATTENDANCE_INFO,
			json!({
				"staff_uid": self.caller.session().user_id(),
				"date": date.format("%Y-%m-%d").to_string(),
			}),
		);
		let res = self.caller.call_ok(envelope).await.map(|reply| {
			let att = reply.result.data.field("attendance").filter(|v| v.is_object())?;
			Some(AttendanceRecord {
				check_in: att.opt_str_field("check_in_time").and_then(|s| parse_timestamp(date, &s, false)),
				check_out: att.opt_str_field("check_out_time").and_then(|s| parse_timestamp(date, &s, true)),
			})
		});
		settle(ATTENDANCE_INFO, res, || None)
	}
}

/// Parses an attendance timestamp relative to the business day `base`.
///
/// Accepts `YYYY-MM-DD HH:MM[:SS]`, the same with a `T` separator, or a bare
/// `HH:MM[:SS]`. A bare check-out before 06:00 rolls over to the next day.
pub(crate) fn parse_timestamp(base: NaiveDate, raw: &str, is_check_out: bool) -> Option<NaiveDateTime> {
	let raw = raw.trim();
	if raw.is_empty() {
		return None;
	}
	const FULL: [&str; 4] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];
	if let Some(full) = FULL.iter().find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok()) {
		return Some(full);
	}

	let time = ["%H:%M:%S", "%H:%M"]
		.iter()
		.find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())?;
	let day = if is_check_out && time < NaiveTime::from_hms_opt(NIGHT_CUTOFF_HOUR, 0, 0)? {
		base.checked_add_days(Days::new(1))?
	} else {
		base
	};
	Some(day.and_time(time))
}
