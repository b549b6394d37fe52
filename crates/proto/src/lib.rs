//! Wire types and framing for the Shifter scheduling protocol.
//!
//! The scheduling server speaks a private protocol over a single TCP stream.
//! Every message is one frame:
//!
//! ```text
//! ┌──────────────┬──────────────┬────────────────────┬──────────────────────┐
//! │  body_len    │  json_len    │  JSON (UTF-8)      │  attachment          │
//! │  (u32 LE)    │  (u32 LE)    │  json_len bytes    │  body_len - json_len │
//! └──────────────┴──────────────┴────────────────────┴──────────────────────┘
//! ```
//!
//! `body_len` counts the JSON and attachment bytes only; the 8 header bytes are
//! never included. Encoder and decoder in this crate both use that convention.
//!
//! This crate provides:
//! * [`Envelope`]: the logical unit handed to the transport.
//! * [`Frame`] and [`FrameHeader`]: the encoded form plus sync/async codecs.
//! * [`CommandResult`]: tolerant interpretation of a reply body.
//! * [`FieldExt`]: lenient typed lookups into loosely-typed JSON.

#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod frame;
pub mod reply;

pub use envelope::Envelope;
pub use error::{Error, Result};
pub use frame::{DEFAULT_MAX_FRAME_LEN, Frame, FrameHeader, HEADER_LEN, read_frame, write_frame};
pub use reply::{CommandResult, FieldExt, Status};
pub use serde_json::Value as JsonValue;

/// Top-level key carrying the command name in requests and the echo in replies.
pub const COMMAND_KEY: &str = "protocol";
/// Top-level key carrying the reply status (`"success"` / `"fail"`).
pub const STATUS_KEY: &str = "resp";
/// Top-level key carrying the command-specific subtree.
pub const DATA_KEY: &str = "data";
/// Message keys, in lookup order. The server uses both spellings.
pub const MESSAGE_KEYS: [&str; 2] = ["message", "messege"];
