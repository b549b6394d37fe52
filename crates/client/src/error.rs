//! Error taxonomy for transport and operations.

use std::io;
use std::time::Duration;

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The connect attempt failed.
	#[error("failed to connect to {addr}: {reason}")]
	Connection {
		/// Target address.
		addr: String,
		/// Failure reason.
		reason: String,
	},
	/// A frame was sent or awaited without a live connection.
	#[error("not connected")]
	NotConnected,
	/// The peer closed the stream mid-frame.
	#[error("connection closed by peer")]
	ConnectionClosed,
	/// A connect, read or write exceeded its deadline.
	#[error("timed out after {0:?}")]
	Timeout(Duration),
	/// The session was shut down while the call was in flight.
	#[error("transport shut down")]
	Cancelled,
	/// The reply echoes a different command than the one sent.
	#[error("protocol mismatch: expected {expected:?}, got {actual:?}")]
	ProtocolMismatch {
		/// Command that was sent.
		expected: String,
		/// Command the reply echoed.
		actual: String,
	},
	/// The reply is not JSON, or lacks a structure the operation requires.
	#[error("parse error: {0}")]
	Parse(String),
	/// Well-formed reply with a failure status.
	#[error("{command} failed: {}", message.as_deref().unwrap_or("no message"))]
	Application {
		/// Command that failed.
		command: String,
		/// Server message, if any.
		message: Option<String>,
	},
	/// The frame header is invalid or the frame is too large.
	#[error("framing: {0}")]
	Frame(shifter_proto::Error),
	/// Input/output errors from the socket or local files.
	#[error("{0}")]
	Io(#[from] io::Error),
}

impl Error {
	/// Returns true when the error came from the connection rather than the reply content.
	pub fn is_transport(&self) -> bool {
		matches!(
			self,
			Self::Connection { .. }
				| Self::NotConnected
				| Self::ConnectionClosed
				| Self::Timeout(_)
				| Self::Cancelled
				| Self::Frame(_)
				| Self::Io(_)
		)
	}
}

impl From<shifter_proto::Error> for Error {
	fn from(e: shifter_proto::Error) -> Self {
		match e {
			shifter_proto::Error::ConnectionClosed => Self::ConnectionClosed,
			shifter_proto::Error::Io(e) => Self::Io(e),
			shifter_proto::Error::Json(e) => Self::Parse(e.to_string()),
			other => Self::Frame(other),
		}
	}
}
