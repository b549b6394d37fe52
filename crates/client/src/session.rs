//! Process-wide cache of the logged-in user.
//!
//! Filled by a successful login, read by every other operation and cleared on
//! logout. Writers replace whole fields; the last writer wins.

use std::sync::Arc;

use parking_lot::RwLock;

/// Work-request counters reported at login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestStatusCounts {
	/// Approved requests.
	pub approved: i64,
	/// Requests awaiting review.
	pub pending: i64,
	/// Rejected requests.
	pub rejected: i64,
}

/// Today's attendance as reported at login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceSnapshot {
	/// Server status label, e.g. `출근` or `퇴근`.
	pub status: String,
	/// Raw check-in timestamp.
	pub check_in_time: Option<String>,
	/// Raw check-out timestamp.
	pub check_out_time: Option<String>,
}

/// Copy of the cached fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
	/// Staff id. Zero when logged out.
	pub user_id: i64,
	/// Team id. Zero when logged out.
	pub team_code: i64,
	/// Team display name.
	pub team_name: String,
	/// Staff display name.
	pub user_name: String,
	/// Server's business date at login.
	pub date: String,
	/// Id of the open check-in record. Zero when none.
	pub check_in_id: i64,
	/// Work-request counters.
	pub request_status_counts: RequestStatusCounts,
	/// Attendance at login time.
	pub attendance: Option<AttendanceSnapshot>,
}

impl SessionSnapshot {
	/// Returns true when a login has populated the snapshot.
	pub fn is_logged_in(&self) -> bool {
		self.user_id != 0
	}
}

/// Shared handle to the session cache.
#[derive(Debug, Clone, Default)]
pub struct SessionCache {
	inner: Arc<RwLock<SessionSnapshot>>,
}

impl SessionCache {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the cache with a freshly logged-in user.
	pub fn apply_login(&self, snapshot: SessionSnapshot) {
		tracing::debug!(user_id = snapshot.user_id, team_code = snapshot.team_code, "session populated");
		*self.inner.write() = snapshot;
	}

	/// Records the open check-in record.
	pub fn set_check_in_id(&self, id: i64) {
		self.inner.write().check_in_id = id;
	}

	/// Records the attendance snapshot.
	pub fn set_attendance(&self, attendance: Option<AttendanceSnapshot>) {
		self.inner.write().attendance = attendance;
	}

	/// Copies the current state.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.inner.read().clone()
	}

	/// Resets every field.
	pub fn clear(&self) {
		*self.inner.write() = SessionSnapshot::default();
	}

	/// Staff id.
	pub fn user_id(&self) -> i64 {
		self.inner.read().user_id
	}

	/// Team id.
	pub fn team_code(&self) -> i64 {
		self.inner.read().team_code
	}

	/// Open check-in id.
	pub fn check_in_id(&self) -> i64 {
		self.inner.read().check_in_id
	}

	/// Returns true after a successful login.
	pub fn is_logged_in(&self) -> bool {
		self.inner.read().is_logged_in()
	}
}
