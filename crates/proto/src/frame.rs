//! Frame header and codec.
//!
//! Length accounting: `body_len` is `json_len + attachment_len`. The header's
//! own 8 bytes are excluded on both the encode and decode side.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Envelope, Error, Result};

/// Size of the fixed frame header in bytes.
pub const HEADER_LEN: usize = 8;

/// Default upper bound for `body_len`, matching the server's own limit.
pub const DEFAULT_MAX_FRAME_LEN: usize = 10 * 1024 * 1024;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
	/// JSON + attachment byte count.
	pub body_len: u32,
	/// JSON byte count.
	pub json_len: u32,
}

impl FrameHeader {
	/// Computes the header for a JSON body and attachment of the given sizes.
	pub fn for_lengths(json_len: usize, attachment_len: usize, max_len: usize) -> Result<Self> {
		let body = json_len + attachment_len;
		if body > max_len {
			return Err(Error::FrameTooLarge { len: body, max: max_len });
		}
		let too_large = |_: std::num::TryFromIntError| Error::FrameTooLarge {
			len: body,
			max: u32::MAX as usize,
		};
		Ok(Self {
			body_len: u32::try_from(body).map_err(too_large)?,
			json_len: u32::try_from(json_len).map_err(too_large)?,
		})
	}

	/// Parses and validates a raw header.
	pub fn parse(raw: [u8; HEADER_LEN], max_len: usize) -> Result<Self> {
		let body_len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
		let json_len = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
		if json_len == 0 || json_len > body_len {
			return Err(Error::InvalidHeader { body_len, json_len });
		}
		if body_len as usize > max_len {
			return Err(Error::FrameTooLarge {
				len: body_len as usize,
				max: max_len,
			});
		}
		Ok(Self { body_len, json_len })
	}

	/// Serializes the header.
	pub fn to_bytes(self) -> [u8; HEADER_LEN] {
		let mut raw = [0u8; HEADER_LEN];
		raw[..4].copy_from_slice(&self.body_len.to_le_bytes());
		raw[4..].copy_from_slice(&self.json_len.to_le_bytes());
		raw
	}

	/// Number of attachment bytes following the JSON body.
	pub const fn attachment_len(self) -> usize {
		(self.body_len - self.json_len) as usize
	}
}

/// Wire representation of one [`Envelope`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
	/// UTF-8 JSON body.
	pub json: Vec<u8>,
	/// Attachment bytes, possibly empty.
	pub attachment: Vec<u8>,
}

impl Frame {
	/// Serializes an envelope's payload into a frame.
	pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
		Ok(Self {
			json: envelope.json_bytes()?,
			attachment: envelope.attachment.clone(),
		})
	}

	/// Converts the frame back into an envelope.
	pub fn into_envelope(self) -> Result<Envelope> {
		Envelope::from_frame(self)
	}

	/// Computes this frame's header.
	pub fn header(&self, max_len: usize) -> Result<FrameHeader> {
		FrameHeader::for_lengths(self.json.len(), self.attachment.len(), max_len)
	}

	/// Encodes header, JSON and attachment into one contiguous buffer.
	pub fn encode(&self, max_len: usize) -> Result<Bytes> {
		let header = self.header(max_len)?;
		let mut buf = BytesMut::with_capacity(HEADER_LEN + header.body_len as usize);
		buf.put_u32_le(header.body_len);
		buf.put_u32_le(header.json_len);
		buf.put_slice(&self.json);
		buf.put_slice(&self.attachment);
		Ok(buf.freeze())
	}

	/// Decodes one complete frame from the front of `buf`.
	///
	/// Returns the frame and the number of bytes consumed.
	pub fn decode(buf: &[u8], max_len: usize) -> Result<(Self, usize)> {
		let Some(raw) = buf.first_chunk::<HEADER_LEN>() else {
			return Err(Error::Truncated {
				needed: HEADER_LEN,
				available: buf.len(),
			});
		};
		let header = FrameHeader::parse(*raw, max_len)?;
		let total = HEADER_LEN + header.body_len as usize;
		if buf.len() < total {
			return Err(Error::Truncated {
				needed: total,
				available: buf.len(),
			});
		}
		let json_end = HEADER_LEN + header.json_len as usize;
		let frame = Self {
			json: buf[HEADER_LEN..json_end].to_vec(),
			attachment: buf[json_end..total].to_vec(),
		};
		Ok((frame, total))
	}
}

/// Reads exactly one frame from `reader`.
///
/// Each segment is read with `read_exact`, which loops until the requested
/// count is satisfied. EOF before that point yields [`Error::ConnectionClosed`].
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Frame>
where
	R: AsyncRead + Unpin + ?Sized,
{
	let mut raw = [0u8; HEADER_LEN];
	reader.read_exact(&mut raw).await?;
	let header = FrameHeader::parse(raw, max_len)?;
	tracing::trace!(body_len = header.body_len, json_len = header.json_len, "frame header");

	let mut json = vec![0u8; header.json_len as usize];
	reader.read_exact(&mut json).await?;

	let mut attachment = vec![0u8; header.attachment_len()];
	if !attachment.is_empty() {
		reader.read_exact(&mut attachment).await?;
	}

	Ok(Frame { json, attachment })
}

/// Writes one frame to `writer` as a single buffered write and flushes.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame, max_len: usize) -> Result<()>
where
	W: AsyncWrite + Unpin + ?Sized,
{
	let buf = frame.encode(max_len)?;
	writer.write_all(&buf).await?;
	writer.flush().await?;
	tracing::trace!(
		json_len = frame.json.len(),
		attachment_len = frame.attachment.len(),
		"frame written"
	);
	Ok(())
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	fn encoded(env: &Envelope) -> Bytes {
		Frame::from_envelope(env).unwrap().encode(DEFAULT_MAX_FRAME_LEN).unwrap()
	}

	fn sample(attachment: &[u8]) -> Envelope {
		Envelope::new("reg_handover", json!({"title": "인수인계", "is_attached": 1})).attachment(attachment)
	}

	#[test]
	fn header_counts_body_without_header() {
		let frame = Frame {
			json: b"{}".to_vec(),
			attachment: vec![0xAA; 5],
		};
		let bytes = frame.encode(DEFAULT_MAX_FRAME_LEN).unwrap();
		assert_eq!(bytes.len(), HEADER_LEN + 7);
		assert_eq!(&bytes[..4], &7u32.to_le_bytes());
		assert_eq!(&bytes[4..8], &2u32.to_le_bytes());
	}

	#[test]
	fn roundtrip_with_and_without_attachment() {
		for attachment in [&[][..], &[0u8, 1, 2, 255][..]] {
			let env = sample(attachment);
			let bytes = encoded(&env);
			let (frame, used) = Frame::decode(&bytes, DEFAULT_MAX_FRAME_LEN).unwrap();
			assert_eq!(used, bytes.len());
			let back = frame.into_envelope().unwrap();
			assert_eq!(back.command, env.command);
			assert_eq!(back.payload, env.payload);
			assert_eq!(back.attachment, env.attachment);
		}
	}

	#[test]
	fn rejects_json_longer_than_body() {
		let raw = FrameHeader { body_len: 4, json_len: 9 }.to_bytes();
		assert!(matches!(
			FrameHeader::parse(raw, DEFAULT_MAX_FRAME_LEN),
			Err(Error::InvalidHeader { body_len: 4, json_len: 9 })
		));
	}

	#[test]
	fn rejects_oversized_frames() {
		let raw = FrameHeader { body_len: 2048, json_len: 16 }.to_bytes();
		assert!(matches!(FrameHeader::parse(raw, 1024), Err(Error::FrameTooLarge { len: 2048, max: 1024 })));

		let frame = Frame {
			json: vec![b' '; 600],
			attachment: vec![0; 600],
		};
		assert!(matches!(frame.encode(1024), Err(Error::FrameTooLarge { .. })));
	}

	#[test]
	fn decode_reports_truncation() {
		let bytes = encoded(&sample(b"abc"));
		let err = Frame::decode(&bytes[..bytes.len() - 1], DEFAULT_MAX_FRAME_LEN).unwrap_err();
		assert!(matches!(err, Error::Truncated { .. }));
	}

	#[tokio::test]
	async fn read_frame_across_split_writes() {
		let bytes = encoded(&sample(b"attachment-bytes"));
		let (mut client, mut server) = tokio::io::duplex(4);
		let writer = tokio::spawn(async move {
			for chunk in bytes.chunks(3) {
				client.write_all(chunk).await.unwrap();
			}
		});
		let frame = read_frame(&mut server, DEFAULT_MAX_FRAME_LEN).await.unwrap();
		writer.await.unwrap();
		assert_eq!(frame.attachment, b"attachment-bytes");
	}

	#[tokio::test]
	async fn eof_mid_frame_is_connection_closed() {
		let bytes = encoded(&sample(b"0123456789"));
		let mut partial = &bytes[..bytes.len() - 4];
		let err = read_frame(&mut partial, DEFAULT_MAX_FRAME_LEN).await.unwrap_err();
		assert!(matches!(err, Error::ConnectionClosed));

		let mut header_only = &bytes[..5];
		let err = read_frame(&mut header_only, DEFAULT_MAX_FRAME_LEN).await.unwrap_err();
		assert!(matches!(err, Error::ConnectionClosed));
	}

	#[tokio::test]
	async fn write_then_read() {
		let frame = Frame::from_envelope(&sample(b"xyz")).unwrap();
		let mut buf = Vec::new();
		write_frame(&mut buf, &frame, DEFAULT_MAX_FRAME_LEN).await.unwrap();
		let read = read_frame(&mut buf.as_slice(), DEFAULT_MAX_FRAME_LEN).await.unwrap();
		assert_eq!(read, frame);
	}
}
