//! Operation catalog.
//!
//! One client per business area. Every client shares the process's
//! [`TransportSession`] and [`SessionCache`] and follows the same contract:
//! build a payload, exchange it, interpret the reply, map `data` to a typed
//! value. Public methods never fail; errors are logged at `warn` and turned
//! into the operation's negative value.

mod attendance;
mod handover;
mod identity;
mod notice;
mod timetable;
mod work_request;

use std::sync::Arc;

use shifter_proto::{CommandResult, Envelope};
use tracing::{debug, warn};

pub use self::attendance::{AttendanceClient, AttendanceRecord};
pub use self::handover::{HandoverClient, HandoverDetail, HandoverSummary, NewHandover, Registration};
pub use self::identity::{IdentityClient, UserInfo};
pub use self::notice::{NoticeClient, NoticeDetail, NoticeSummary};
pub use self::timetable::{DutyGroup, NO_SHIFT, ShiftRule, TimetableClient, TimetableEntry};
pub use self::work_request::{WorkRequest, WorkRequestClient, sample_requests};
use crate::error::{Error, Result};
use crate::session::SessionCache;
use crate::transport::TransportSession;

/// Success flag plus the server's message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
	/// Whether the server accepted the command.
	pub ok: bool,
	/// Server message, or a description of the local failure.
	pub message: Option<String>,
}

impl Ack {
	fn from_reply(result: &CommandResult) -> Self {
		Self {
			ok: result.is_success(),
			message: result.message.clone(),
		}
	}

	fn from_error(error: &Error) -> Self {
		Self {
			ok: false,
			message: failure_message(error),
		}
	}
}

/// Message to surface for a failed call: the server's own when it sent one.
pub(crate) fn failure_message(error: &Error) -> Option<String> {
	match error {
		Error::Application { message, .. } => message.clone(),
		other => Some(other.to_string()),
	}
}

/// Decoded reply plus any attachment bytes the server sent.
#[derive(Debug)]
pub(crate) struct Reply {
	pub(crate) result: CommandResult,
	pub(crate) attachment: Vec<u8>,
}

/// Shared plumbing for the operation clients.
#[derive(Debug, Clone)]
pub(crate) struct Caller {
	transport: Arc<TransportSession>,
	session: SessionCache,
}

impl Caller {
	pub(crate) fn new(transport: Arc<TransportSession>, session: SessionCache) -> Self {
		Self { transport, session }
	}

	pub(crate) fn session(&self) -> &SessionCache {
		&self.session
	}

	pub(crate) fn transport(&self) -> &Arc<TransportSession> {
		&self.transport
	}

	/// Connects if needed, exchanges `envelope` and checks the command echo.
	///
	/// The connection lock is held from connect through the echo check. A
	/// wrong echo means the stream is out of step, so it drops the connection.
	pub(crate) async fn call(&self, envelope: Envelope) -> Result<Reply> {
		let mut exchange = self.transport.lock().await;
		exchange.ensure_connected().await?;
		exchange.send(&envelope).await?;
		let frame = exchange.receive().await?;

		let result = CommandResult::parse(&frame.json)?;
		if !result.echoes(&envelope.command) {
			return Err(exchange.fail(Error::ProtocolMismatch {
				expected: envelope.command,
				actual: result.command_echo,
			}));
		}
		drop(exchange);
		debug!(command = %envelope.command, status = %result.status_raw, "reply");
		Ok(Reply {
			result,
			attachment: frame.attachment,
		})
	}

	/// Like [`Caller::call`], additionally turning a failure status into
	/// [`Error::Application`].
	pub(crate) async fn call_ok(&self, envelope: Envelope) -> Result<Reply> {
		let command = envelope.command.clone();
		let reply = self.call(envelope).await?;
		if !reply.result.is_success() {
			return Err(Error::Application {
				command,
				message: reply.result.message,
			});
		}
		Ok(reply)
	}
}

/// Unwraps an operation result, logging and substituting `fallback` on error.
pub(crate) fn settle<T>(command: &str, res: Result<T>, fallback: impl FnOnce() -> T) -> T {
	match res {
		Ok(value) => value,
		Err(e) => {
			warn!(command, error = %e, "operation failed");
			fallback()
		}
	}
}
