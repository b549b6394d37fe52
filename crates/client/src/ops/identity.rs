//! Login, profile and password operations.

use parking_lot::Mutex;
use serde_json::json;
use shifter_proto::{Envelope, FieldExt, JsonValue};
use tracing::info;

use super::{Ack, Caller, settle};
use crate::error::Result;
use crate::session::{AttendanceSnapshot, RequestStatusCounts, SessionSnapshot};

const LOGIN: &str = "login";
const USER_INFO: &str = "ask_user_info";
const MODIFY_USER_INFO: &str = "modify_user_info";

/// Profile of the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
	/// Login id.
	pub id: String,
	/// Phone number.
	pub phone_number: String,
	/// Employer.
	pub company_name: String,
	/// Job grade.
	pub grade_name: String,
	/// Whether the server holds a password for the account.
	pub has_password: bool,
}

/// Identity operations: login, logout, profile and password.
#[derive(Debug)]
pub struct IdentityClient {
	caller: Caller,
	/// Password returned by the last profile fetch, for local verification.
	server_password: Mutex<Option<String>>,
}

impl IdentityClient {
	pub(crate) fn new(caller: Caller) -> Self {
		Self {
			caller,
			server_password: Mutex::new(None),
		}
	}

	/// Authenticates and fills the session cache.
	///
	/// Returns false on a failure reply or any transport error. The cache is
	/// only touched on success.
	pub async fn login(&self, id: &str, password: &str) -> bool {
		let res = self.try_login(id, password).await;
		let snapshot = settle(LOGIN, res.map(Some), || None);
		match snapshot {
			Some(snapshot) => {
				info!(user_id = snapshot.user_id, team_code = snapshot.team_code, "logged in");
				self.caller.session().apply_login(snapshot);
				true
			}
			None => false,
		}
	}

	async fn try_login(&self, id: &str, password: &str) -> Result<SessionSnapshot> {
		let envelope = Envelope::new(LOGIN, json!({ "id": id, "pw": password }));
		let reply = self.caller.call_ok(envelope).await?;
		Ok(login_snapshot(&reply.result.data))
	}

	/// Fetches the profile. Also remembers the password for
	/// [`IdentityClient::verify_current_password`].
	pub async fn user_info(&self) -> Option<UserInfo> {
		let session = self.caller.session();
		let envelope = Envelope::new(
			USER_INFO,
			json!({ "team_uid": session.team_code(), "staff_uid": session.user_id() }),
		);
		let res = self.caller.call_ok(envelope).await.map(|reply| {
			let data = &reply.result.data;
			let password = data.opt_str_field("pw").filter(|pw| !pw.trim().is_empty());
			let info = UserInfo {
				id: data.str_field("id"),
				phone_number: data.str_field("phone_number"),
				company_name: data.str_field("company_name"),
				grade_name: data.str_field("grade_name"),
				has_password: password.is_some(),
			};
			*self.server_password.lock() = password;
			info
		});
		settle(USER_INFO, res.map(Some), || None)
	}

	/// Compares `current` with the password from the last profile fetch.
	///
	/// False when no profile has been fetched.
	pub fn verify_current_password(&self, current: &str) -> bool {
		self.server_password.lock().as_deref() == Some(current)
	}

	/// Sets a new password.
	pub async fn modify_password(&self, new_password: &str) -> Ack {
		let envelope = Envelope::new(
			MODIFY_USER_INFO,
			json!({ "staff_uid": self.caller.session().user_id(), "pw": new_password }),
		);
		match self.caller.call(envelope).await {
			Ok(reply) => {
				let ack = Ack::from_reply(&reply.result);
				if ack.ok {
					*self.server_password.lock() = Some(new_password.to_owned());
				}
				ack
			}
			Err(e) => {
				tracing::warn!(command = MODIFY_USER_INFO, error = %e, "operation failed");
				Ack::from_error(&e)
			}
		}
	}

	/// Clears the session cache and closes the connection.
	pub async fn logout(&self) {
		self.caller.session().clear();
		*self.server_password.lock() = None;
		self.caller.transport().close().await;
		info!("logged out");
	}
}

fn login_snapshot(data: &JsonValue) -> SessionSnapshot {
	let counts = data.field("work_request_status");
	let attendance = data
		.field("attendance")
		.filter(|v| v.is_object())
		.map(|att| AttendanceSnapshot {
			status: att.str_field("status"),
			check_in_time: att.opt_str_field("check_in_time").filter(|s| !s.is_empty()),
			check_out_time: att.opt_str_field("check_out_time").filter(|s| !s.is_empty()),
		});
	SessionSnapshot {
		user_id: data.int_field("staff_uid"),
		team_code: data.int_field("team_uid"),
		team_name: data.str_field("team_name"),
		user_name: data.str_field("staff_name"),
		date: data.str_field("date"),
		check_in_id: 0,
		request_status_counts: RequestStatusCounts {
			approved: counts.map_or(0, |c| c.int_field("approved")),
			pending: counts.map_or(0, |c| c.int_field("pending")),
			rejected: counts.map_or(0, |c| c.int_field("rejected")),
		},
		attendance,
	}
}
