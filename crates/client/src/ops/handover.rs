//! Shift handover notes.

use std::path::PathBuf;

use serde_json::json;
use shifter_proto::{Envelope, FieldExt, JsonValue};
use tracing::info;

use super::{Caller, failure_message, settle};
use crate::error::Result;
use crate::model::{NoteType, ShiftType};

const LIST: &str = "ask_handover_list";
const DETAIL: &str = "ask_handover_detail";
const REGISTER: &str = "reg_handover";
const SUMMARIZE: &str = "summary_journal";

/// One row of the team's handover list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandoverSummary {
	/// Note id.
	pub handover_uid: i64,
	/// Author.
	pub staff_name: String,
	/// Date part of the handover timestamp.
	pub date: String,
	/// Shift the note belongs to.
	pub shift: ShiftType,
	/// Note category.
	pub note_type: NoteType,
	/// Title.
	pub title: String,
}

/// A complete handover note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandoverDetail {
	/// Note id.
	pub handover_uid: i64,
	/// Date part of the handover timestamp.
	pub date: String,
	/// Author.
	pub author: String,
	/// Shift the note belongs to.
	pub shift: ShiftType,
	/// Note category.
	pub note_type: NoteType,
	/// Title.
	pub title: String,
	/// Body.
	pub text: String,
	/// Points needing attention.
	pub text_particular: String,
	/// Free-form extra information.
	pub additional_info: String,
	/// Whether the server stores a file with this note.
	pub is_attached: bool,
	/// Name of the stored file.
	pub file_name: String,
	/// File bytes, when the server sent them with the reply.
	pub attachment: Vec<u8>,
}

/// Input for [`HandoverClient::register`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewHandover {
	/// Title.
	pub title: String,
	/// Body.
	pub text: String,
	/// Points needing attention.
	pub text_particular: String,
	/// Free-form extra information.
	pub additional_info: String,
	/// Shift the note belongs to.
	pub shift: ShiftType,
	/// Note category.
	pub note_type: NoteType,
	/// Local file to upload with the note.
	pub attachment_path: Option<PathBuf>,
}

/// Outcome of [`HandoverClient::register`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
	/// Whether the server stored the note.
	pub ok: bool,
	/// Id assigned by the server.
	pub handover_uid: Option<i64>,
	/// Server message, or a description of the local failure.
	pub message: Option<String>,
}

/// Handover operations.
#[derive(Debug)]
pub struct HandoverClient {
	caller: Caller,
}

impl HandoverClient {
	pub(crate) fn new(caller: Caller) -> Self {
		Self { caller }
	}

	/// Handover notes of the logged-in user's team. Empty on any failure.
	pub async fn list(&self) -> Vec<HandoverSummary> {
		let envelope = Envelope::new(LIST, json!({ "team_uid": self.caller.session().team_code() }));
		let res = self
			.caller
			.call_ok(envelope)
			.await
			.map(|reply| reply.result.data.list_field("list").iter().map(summary).collect());
		settle(LIST, res, Vec::new)
	}

	/// One note, including any file bytes sent with the reply.
	pub async fn detail(&self, handover_uid: i64) -> Option<HandoverDetail> {
		let envelope = Envelope::new(DETAIL, json!({ "handover_uid": handover_uid }));
		let res = self.caller.call_ok(envelope).await.map(|reply| {
			let data = &reply.result.data;
			data.is_object().then(|| HandoverDetail {
				handover_uid,
				date: date_part(&data.str_field("handover_time")),
				author: data.str_field("staff_name"),
				shift: ShiftType::from_wire(&data.str_field("shift_type")),
				note_type: NoteType::from_wire(&data.str_field("note_type")),
				title: data.str_field("title"),
				text: data.str_field("text"),
				text_particular: data.str_field("text_particular"),
				additional_info: data.str_field("additional_info"),
				is_attached: data.bool_field("is_attached"),
				file_name: data.str_field("file_name"),
				attachment: reply.attachment,
			})
		});
		settle(DETAIL, res, || None)
	}

	/// Stores a new note for the logged-in user's team, uploading the
	/// attachment file if one is named.
	pub async fn register(&self, note: &NewHandover) -> Registration {
		match self.try_register(note).await {
			Ok(registration) => registration,
			Err(e) => {
				tracing::warn!(command = REGISTER, error = %e, "operation failed");
				Registration {
					ok: false,
					handover_uid: None,
					message: failure_message(&e),
				}
			}
		}
	}

	async fn try_register(&self, note: &NewHandover) -> Result<Registration> {
		let (attachment, file_name) = match &note.attachment_path {
			Some(path) => {
				let bytes = tokio::fs::read(path).await?;
				let name = path
					.file_name()
					.map(|n| n.to_string_lossy().into_owned())
					.unwrap_or_default();
				(bytes, name)
			}
			None => (Vec::new(), String::new()),
		};

		let session = self.caller.session();
		let mut envelope = Envelope::new(
			REGISTER,
			json!({
				"staff_uid": session.user_id(),
				"team_uid": session.team_code(),
				"title": note.title,
				"text": note.text,
				"text_particular": note.text_particular,
				"additional_info": note.additional_info,
				"shift_type": note.shift.code(),
				"note_type": note.note_type.label(),
				"is_attached": i32::from(!attachment.is_empty()),
				"file_name": file_name,
			}),
		)
		.attachment(attachment);
		if let Some(path) = &note.attachment_path {
			envelope = envelope.local_path(path);
		}

		let reply = self.caller.call(envelope).await?;
		let result = reply.result;
		let handover_uid = result
			.data
			.opt_int_field("handover_uid")
			.or_else(|| result.body.opt_int_field("handover_uid"));
		let ok = result.is_success();
		if ok {
			info!(?handover_uid, "handover registered");
		}
		Ok(Registration {
			ok,
			handover_uid,
			message: if ok { None } else { result.message },
		})
	}

	/// Server-side rewrite of free-form journal text.
	pub async fn summarize(&self, text: &str) -> Option<String> {
		let envelope = Envelope::new(SUMMARIZE, json!({ "text": text }));
		let res = self
			.caller
			.call_ok(envelope)
			.await
			.map(|reply| reply.result.data.opt_str_field("text"));
		settle(SUMMARIZE, res, || None)
	}
}

fn summary(item: &JsonValue) -> HandoverSummary {
	HandoverSummary {
		handover_uid: item.int_field("handover_uid"),
		staff_name: item.str_field("staff_name"),
		date: date_part(&item.str_field("handover_time")),
		shift: ShiftType::from_wire(&item.str_field("shift_type")),
		note_type: NoteType::from_wire(&item.str_field("note_type")),
		title: item.str_field("title"),
	}
}

/// `"2025-03-14 08:00:00"` → `"2025-03-14"`.
fn date_part(timestamp: &str) -> String {
	timestamp.split([' ', 'T']).next().unwrap_or_default().to_owned()
}
