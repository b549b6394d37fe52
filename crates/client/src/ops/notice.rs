//! Team notices.

use serde_json::json;
use shifter_proto::{Envelope, FieldExt};

use super::{Caller, settle};

const LIST: &str = "ask_notice_list";
const DETAIL: &str = "ask_notice_detail";

/// One row of the notice board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeSummary {
	/// Notice id.
	pub notice_uid: i64,
	/// Author.
	pub staff_name: String,
	/// Publication date.
	pub notice_date: String,
	/// Title.
	pub title: String,
}

/// A complete notice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeDetail {
	/// Notice id.
	pub notice_uid: i64,
	/// Author.
	pub staff_name: String,
	/// Publication date.
	pub notice_date: String,
	/// Title.
	pub title: String,
	/// Body.
	pub content: String,
}

/// Notice operations.
#[derive(Debug)]
pub struct NoticeClient {
	caller: Caller,
}

impl NoticeClient {
	pub(crate) fn new(caller: Caller) -> Self {
		Self { caller }
	}

	/// Notices of the logged-in user's team. Empty on any failure.
	pub async fn list(&self) -> Vec<NoticeSummary> {
		let envelope = Envelope::new(LIST, json!({ "team_uid": self.caller.session().team_code() }));
		let res = self.caller.call_ok(envelope).await.map(|reply| {
			reply
				.result
				.data
				.list_field("list")
				.iter()
				.map(|item| NoticeSummary {
					notice_uid: item.int_field("notice_uid"),
					staff_name: item.str_field("staff_name"),
					notice_date: item.str_field("notice_date"),
					title: item.str_field("title"),
				})
				.collect()
		});
		settle(LIST, res, Vec::new)
	}

	/// One notice.
	pub async fn detail(&self, notice_uid: i64) -> Option<NoticeDetail> {
		let envelope = Envelope::new(DETAIL, json!({ "notice_uid": notice_uid }));
		let res = self.caller.call_ok(envelope).await.map(|reply| {
			let data = &reply.result.data;
			data.is_object().then(|| NoticeDetail {
				notice_uid: data.opt_int_field("notice_uid").unwrap_or(notice_uid),
				staff_name: data.str_field("staff_name"),
				notice_date: data.str_field("notice_date"),
				title: data.str_field("title"),
				content: data.str_field("content"),
			})
		});
		settle(DETAIL, res, || None)
	}
}
