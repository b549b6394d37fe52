//! Codec errors.

use std::io;

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The peer closed the stream before a complete frame arrived.
	#[error("connection closed by peer mid-frame")]
	ConnectionClosed,
	/// The header lengths are inconsistent.
	#[error("invalid frame header: body_len={body_len}, json_len={json_len}")]
	InvalidHeader {
		/// Declared JSON + attachment length.
		body_len: u32,
		/// Declared JSON length.
		json_len: u32,
	},
	/// An in-memory buffer ended before the declared frame length.
	#[error("truncated frame: need {needed} bytes, have {available}")]
	Truncated {
		/// Bytes required by the header.
		needed: usize,
		/// Bytes present in the buffer.
		available: usize,
	},
	/// The frame exceeds the configured size limit.
	#[error("frame of {len} bytes exceeds limit of {max} bytes")]
	FrameTooLarge {
		/// Declared or encoded body length.
		len: usize,
		/// Configured limit.
		max: usize,
	},
	/// The JSON body could not be serialized or parsed.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
	/// Input/output errors from the underlying stream.
	#[error("{0}")]
	Io(io::Error),
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Self {
		match e.kind() {
			io::ErrorKind::UnexpectedEof => Self::ConnectionClosed,
			_ => Self::Io(e),
		}
	}
}
