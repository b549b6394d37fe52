use std::sync::Arc;

use crate::config::ClientConfig;
use crate::ops::{AttendanceClient, Caller, HandoverClient, IdentityClient, NoticeClient, TimetableClient, WorkRequestClient};
use crate::session::SessionCache;
use crate::transport::TransportSession;

/// One transport, one session cache and every operation client built on them.
#[derive(Debug)]
pub struct Shifter {
	transport: Arc<TransportSession>,
	session: SessionCache,
	identity: IdentityClient,
	attendance: AttendanceClient,
	handover: HandoverClient,
	notices: NoticeClient,
	timetable: TimetableClient,
	work_requests: WorkRequestClient,
}

impl Shifter {
	/// Creates a disconnected client for `config`. The first operation connects.
	pub fn new(config: ClientConfig) -> Self {
		Self::with_transport(TransportSession::new(config), SessionCache::new())
	}

	/// Builds the catalog over an existing transport and cache.
	pub fn with_transport(transport: Arc<TransportSession>, session: SessionCache) -> Self {
		let caller = Caller::new(Arc::clone(&transport), session.clone());
		Self {
			identity: IdentityClient::new(caller.clone()),
			attendance: AttendanceClient::new(caller.clone()),
			handover: HandoverClient::new(caller.clone()),
			notices: NoticeClient::new(caller.clone()),
			timetable: TimetableClient::new(caller.clone()),
			work_requests: WorkRequestClient::new(caller),
			transport,
			session,
		}
	}

	/// The shared transport.
	pub fn transport(&self) -> &Arc<TransportSession> {
		&self.transport
	}

	/// The shared session cache.
	pub fn session(&self) -> &SessionCache {
		&self.session
	}

	/// Login, profile and password.
	pub fn identity(&self) -> &IdentityClient {
		&self.identity
	}

	/// Check-in, check-out and attendance history.
	pub fn attendance(&self) -> &AttendanceClient {
		&self.attendance
	}

	/// Handover notes.
	pub fn handover(&self) -> &HandoverClient {
		&self.handover
	}

	/// Team notices.
	pub fn notices(&self) -> &NoticeClient {
		&self.notices
	}

	/// Timetables, shift rules and duty board.
	pub fn timetable(&self) -> &TimetableClient {
		&self.timetable
	}

	/// Desired-shift requests.
	pub fn work_requests(&self) -> &WorkRequestClient {
		&self.work_requests
	}

	/// Aborts in-flight I/O and closes the connection for good.
	pub async fn shutdown(&self) {
		self.transport.shutdown().await;
	}
}
