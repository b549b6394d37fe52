//! The logical unit exchanged with the transport.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value as JsonValue};

use crate::reply::FieldExt;
use crate::{COMMAND_KEY, DATA_KEY, Frame, Result};

/// A command payload plus an optional binary attachment.
///
/// `local_path` records where the attachment came from (or should go) on the
/// client. It is never written to the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
	/// Command name this envelope carries.
	pub command: String,
	/// Complete top-level JSON object sent as the frame's JSON body.
	pub payload: JsonValue,
	/// Raw attachment bytes, empty when there is none.
	pub attachment: Vec<u8>,
	/// Client-local file path associated with the attachment.
	pub local_path: Option<PathBuf>,
}

impl Envelope {
	/// Builds the conventional `{ "protocol": command, "data": data }` envelope.
	pub fn new(command: impl Into<String>, data: JsonValue) -> Self {
		let command = command.into();
		let mut obj = Map::new();
		obj.insert(COMMAND_KEY.to_owned(), JsonValue::String(command.clone()));
		obj.insert(DATA_KEY.to_owned(), data);
		Self {
			command,
			payload: JsonValue::Object(obj),
			attachment: Vec::new(),
			local_path: None,
		}
	}

	/// Builds an envelope whose top-level JSON object is supplied verbatim.
	///
	/// Used by command families that do not follow the `protocol`/`data` layout.
	pub fn with_payload(command: impl Into<String>, payload: JsonValue) -> Self {
		Self {
			command: command.into(),
			payload,
			attachment: Vec::new(),
			local_path: None,
		}
	}

	/// Attaches raw bytes to the envelope.
	#[must_use]
	pub fn attachment(mut self, bytes: impl Into<Vec<u8>>) -> Self {
		self.attachment = bytes.into();
		self
	}

	/// Records the client-local path of the attachment.
	#[must_use]
	pub fn local_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.local_path = Some(path.into());
		self
	}

	/// Returns the client-local path, if any.
	pub fn path(&self) -> Option<&Path> {
		self.local_path.as_deref()
	}

	/// Returns true when the envelope carries attachment bytes.
	pub fn has_attachment(&self) -> bool {
		!self.attachment.is_empty()
	}

	/// Serializes the JSON body.
	pub fn json_bytes(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(&self.payload)?)
	}

	/// Rebuilds an envelope from a decoded frame.
	///
	/// The command name is read from the echo field with a case-insensitive
	/// lookup; it is empty when the body carries none.
	pub fn from_frame(frame: Frame) -> Result<Self> {
		let payload: JsonValue = serde_json::from_slice(&frame.json)?;
		let command = payload.str_field(COMMAND_KEY);
		Ok(Self {
			command,
			payload,
			attachment: frame.attachment,
			local_path: None,
		})
	}
}
