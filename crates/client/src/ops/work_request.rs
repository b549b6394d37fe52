//! Desired-shift work requests.
//!
//! `GET_MONTH_REQUESTS` belongs to the upper-case command family: the request
//! is a flat object with `PROTOCOL`, `UID`, `YEAR`, `MONTH` and the reply
//! carries `RESP` and `REQUESTS` at the top level.

use chrono::NaiveDate;
use serde_json::json;
use shifter_proto::{Envelope, FieldExt, JsonValue};
use tracing::warn;

use super::{Caller, settle};
use crate::error::Error;
use crate::model::{RequestStatus, ShiftType};

const MONTH_REQUESTS: &str = "GET_MONTH_REQUESTS";
const CHANGE_DETAIL: &str = "shift_change_detail";

/// One desired-shift request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkRequest {
	/// Day the request is for.
	pub request_date: NaiveDate,
	/// Desired shift.
	pub shift: ShiftType,
	/// Review status.
	pub status: RequestStatus,
	/// Requester's reason.
	pub reason: String,
	/// Reviewer's note on rejection.
	pub rejection_reason: Option<String>,
}

/// Work-request operations.
#[derive(Debug)]
pub struct WorkRequestClient {
	caller: Caller,
}

impl WorkRequestClient {
	pub(crate) fn new(caller: Caller) -> Self {
		Self { caller }
	}

	/// The logged-in user's requests for one month.
	///
	/// A failure reply yields an empty list. When the exchange itself fails
	/// (no connection, timeout, unreadable or mismatched reply) the
	/// [`sample_requests`] dataset is returned so the calendar stays populated.
	pub async fn month_requests(&self, year: i32, month: u32) -> Vec<WorkRequest> {
		let envelope = Envelope::with_payload(
			MONTH_REQUESTS,
			json!({
				"PROTOCOL": MONTH_REQUESTS,
				"UID": self.caller.session().user_id(),
				"YEAR": year,
				"MONTH": month,
			}),
		);
		match self.caller.call_ok(envelope).await {
			Ok(reply) => work_requests(reply.result.body.list_field("REQUESTS")),
			Err(e @ Error::Application { .. }) => {
				warn!(command = MONTH_REQUESTS, error = %e, "operation failed");
				Vec::new()
			}
			Err(e) => {
				warn!(command = MONTH_REQUESTS, error = %e, "exchange failed, serving sample requests");
				sample_requests(year, month)
			}
		}
	}

	/// Review details of the logged-in user's requests for one month, in the
	/// lower-case command family. Empty on any failure.
	pub async fn change_details(&self, year: i32, month: u32) -> Vec<WorkRequest> {
		let envelope = Envelope::new(
			CHANGE_DETAIL,
			json!({
				"staff_uid": self.caller.session().user_id(),
				"req_year": year.to_string(),
				"req_month": month.to_string(),
			}),
		);
		let res = self.caller.call_ok(envelope).await.map(|reply| {
			let items = reply.result.data.as_array().map(Vec::as_slice).unwrap_or_default();
			work_requests(items)
		});
		settle(CHANGE_DETAIL, res, Vec::new)
	}
}

/// Maps request rows, skipping rows without a parsable date.
///
/// Both snake-case and Pascal-case row keys occur on the wire.
fn work_requests(items: &[JsonValue]) -> Vec<WorkRequest> {
	items
		.iter()
		.filter_map(|item| {
			let date = item.first_of(&["request_date", "RequestDate"]).and_then(shifter_proto::reply::text)?;
			let request_date = parse_date(&date)?;
			let text = |keys: &[&str]| item.first_of(keys).and_then(shifter_proto::reply::text);
			Some(WorkRequest {
				request_date,
				shift: ShiftType::from_wire(&text(&["desire_shift", "ShiftType", "shift_type"]).unwrap_or_default()),
				status: RequestStatus::from_wire(&text(&["status"]).unwrap_or_default()),
				reason: text(&["reason"]).unwrap_or_default(),
				rejection_reason: text(&["admin_msg", "RejectionReason", "rejection_reason"]).filter(|s| !s.is_empty()),
			})
		})
		.collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
	let day = raw.trim().split([' ', 'T']).next()?;
	NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Fixed offline dataset for [`WorkRequestClient::month_requests`].
///
/// Three requests in the given month (month `0` is read as January): an
/// approved day shift on the 1st, a rejected day off on the 4th and a pending
/// evening shift on the 7th. Empty if the month does not exist.
pub fn sample_requests(year: i32, month: u32) -> Vec<WorkRequest> {
	let month = month.max(1);
	let on = |day| NaiveDate::from_ymd_opt(year, month, day);
	let rows = [
		(on(1), ShiftType::Day, RequestStatus::Approved, "결혼식 참석", None),
		(on(4), ShiftType::Off, RequestStatus::Rejected, "가족 여행", Some("인력 부족")),
		(on(7), ShiftType::Evening, RequestStatus::Pending, "학원 수업", None),
	];
	rows.into_iter()
		.filter_map(|(date, shift, status, reason, rejection)| {
			Some(WorkRequest {
				request_date: date?,
				shift,
				status,
				reason: reason.to_owned(),
				rejection_reason: rejection.map(str::to_owned),
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn sample_month_zero_is_january() {
		let sample = sample_requests(2025, 0);
		let days: Vec<_> = sample.iter().map(|r| r.request_date).collect();
		assert_eq!(
			days,
			[1, 4, 7].map(|d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap())
		);
		assert_eq!(sample[1].status, RequestStatus::Rejected);
		assert_eq!(sample[1].rejection_reason.as_deref(), Some("인력 부족"));
		assert!(sample_requests(2025, 13).is_empty());
	}

	#[test]
	fn rows_in_either_key_style() {
		let rows = work_requests(&[
			json!({"request_date": "2025-02-03", "desire_shift": "night", "status": "approved", "reason": "시험"}),
			json!({"RequestDate": "2025-02-05T00:00:00", "ShiftType": "E", "Status": "Rejected", "RejectionReason": "인원"}),
			json!({"request_date": "someday"}),
		]);
		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0].shift, ShiftType::Night);
		assert_eq!(rows[0].rejection_reason, None);
		assert_eq!(rows[1].request_date, NaiveDate::from_ymd_opt(2025, 2, 5).unwrap());
		assert_eq!(rows[1].status, RequestStatus::Rejected);
		assert_eq!(rows[1].rejection_reason.as_deref(), Some("인원"));
	}
}
