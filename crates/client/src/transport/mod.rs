//! TCP transport session.
//!
//! One [`TransportSession`] owns at most one socket to the scheduling server.
//! Replies carry no correlation id, so a request and its reply must be
//! exchanged under one lock: [`TransportSession::lock`] hands out an
//! [`Exchange`] that holds the socket until it is dropped.
//!
//! Any receive failure and any write failure after encoding drops the socket
//! and moves the session to [`ConnectionState::Disconnected`]. A frame that
//! was partially read cannot be resynchronized, so there is no recovery path
//! short of reconnecting. The same holds when an [`Exchange`] is dropped
//! between writing a request and reading its reply: the unread reply would
//! reach the next caller, so the socket goes with it.

mod state;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use shifter_proto::{Envelope, Frame, read_frame};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use self::state::ConnectionState;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// An open socket.
#[derive(Debug)]
struct Connection {
	stream: BufReader<TcpStream>,
	peer: String,
}

/// Handle to the server connection.
#[derive(Debug)]
pub struct TransportSession {
	config: ClientConfig,
	conn: Mutex<Option<Connection>>,
	state_tx: watch::Sender<ConnectionState>,
	cancel: CancellationToken,
}

impl TransportSession {
	/// Creates a disconnected session for `config`.
	pub fn new(config: ClientConfig) -> Arc<Self> {
		let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
		Arc::new(Self {
			config,
			conn: Mutex::new(None),
			state_tx,
			cancel: CancellationToken::new(),
		})
	}

	/// Connection parameters.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Current connection state.
	pub fn state(&self) -> ConnectionState {
		*self.state_tx.borrow()
	}

	/// Subscribe to state changes.
	pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
		self.state_tx.subscribe()
	}

	/// Returns true while a socket is open.
	pub fn is_connected(&self) -> bool {
		self.state().is_connected()
	}

	fn set_state(&self, state: ConnectionState) {
		let prev = self.state_tx.send_replace(state);
		if prev != state {
			debug!(?prev, ?state, "transport state");
		}
	}

	/// Acquires exclusive use of the connection.
	pub async fn lock(&self) -> Exchange<'_> {
		Exchange {
			session: self,
			conn: self.conn.lock().await,
			pending: Pending::Idle,
		}
	}

	/// Opens the socket if it is not already open.
	pub async fn ensure_connected(&self) -> Result<()> {
		self.lock().await.ensure_connected().await
	}

	/// Sends one envelope and reads one reply frame under a single lock.
	///
	/// Fails with [`Error::NotConnected`] when no socket is open.
	pub async fn exchange(&self, envelope: &Envelope) -> Result<Frame> {
		let mut exchange = self.lock().await;
		exchange.send(envelope).await?;
		exchange.receive().await
	}

	/// Closes the socket. Safe to call repeatedly.
	pub async fn close(&self) {
		let mut exchange = self.lock().await;
		if let Some(mut conn) = exchange.conn.take() {
			let _ = conn.stream.get_mut().shutdown().await;
			info!(peer = %conn.peer, "disconnected");
		}
		self.set_state(ConnectionState::Disconnected);
	}

	/// Aborts in-flight I/O, closes the socket and refuses further connects.
	pub async fn shutdown(&self) {
		self.cancel.cancel();
		self.close().await;
	}

	/// Runs `fut` under `deadline`, aborting early on shutdown.
	async fn guarded<T>(&self, deadline: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => Err(Error::Cancelled),
			res = tokio::time::timeout(deadline, fut) => match res {
				Ok(res) => res,
				Err(_) => Err(Error::Timeout(deadline)),
			},
		}
	}
}

/// Work an [`Exchange`] has started but not finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
	Idle,
	Connecting,
	Reply,
}

/// Exclusive access to the connection for one request/reply pair.
///
/// Other callers wait on [`TransportSession::lock`] until this is dropped.
/// Dropping it while a connect or a reply is outstanding closes the socket.
pub struct Exchange<'a> {
	session: &'a TransportSession,
	conn: MutexGuard<'a, Option<Connection>>,
	pending: Pending,
}

impl Exchange<'_> {
	/// Opens the socket if it is not already open.
	pub async fn ensure_connected(&mut self) -> Result<()> {
		if self.conn.is_some() {
			return Ok(());
		}
		let session = self.session;
		if session.cancel.is_cancelled() {
			return Err(Error::Cancelled);
		}

		let addr = session.config.addr();
		self.pending = Pending::Connecting;
		session.set_state(ConnectionState::Connecting);
		let deadline = session.config.connect_deadline();
		let connect = async {
			TcpStream::connect(&addr).await.map_err(|e| Error::Connection {
				addr: addr.clone(),
				reason: e.to_string(),
			})
		};
		let res = session.guarded(deadline, connect).await;
		self.pending = Pending::Idle;
		match res {
			Ok(stream) => {
				let _ = stream.set_nodelay(true);
				info!(peer = %addr, "connected");
				*self.conn = Some(Connection {
					stream: BufReader::new(stream),
					peer: addr,
				});
				session.set_state(ConnectionState::Connected);
				Ok(())
			}
			Err(e) => {
				warn!(peer = %addr, error = %e, "connect failed");
				session.set_state(ConnectionState::Disconnected);
				Err(e)
			}
		}
	}

	/// Writes one envelope as a single frame.
	///
	/// Encoding failures leave the connection intact. Write failures drop it.
	pub async fn send(&mut self, envelope: &Envelope) -> Result<()> {
		let session = self.session;
		let bytes = Frame::from_envelope(envelope)
			.and_then(|frame| frame.encode(session.config.max_frame_len))
			.map_err(Error::from)?;
		let conn = self.conn.as_mut().ok_or(Error::NotConnected)?;
		self.pending = Pending::Reply;

		let write = async {
			conn.stream.write_all(&bytes).await?;
			conn.stream.flush().await?;
			Ok::<_, Error>(())
		};
		let res = session.guarded(session.config.write_deadline(), write).await;
		match res {
			Ok(()) => {
				debug!(command = %envelope.command, len = bytes.len(), "sent");
				Ok(())
			}
			Err(e) => Err(self.fail(e)),
		}
	}

	/// Reads exactly one frame.
	///
	/// Every failure drops the connection.
	pub async fn receive(&mut self) -> Result<Frame> {
		let session = self.session;
		let max = session.config.max_frame_len;
		let conn = self.conn.as_mut().ok_or(Error::NotConnected)?;

		let read = async { read_frame(&mut conn.stream, max).await.map_err(Error::from) };
		let res = session.guarded(session.config.read_deadline(), read).await;
		match res {
			Ok(frame) => {
				self.pending = Pending::Idle;
				debug!(
					json_len = frame.json.len(),
					attachment_len = frame.attachment.len(),
					"received"
				);
				Ok(frame)
			}
			Err(e) => Err(self.fail(e)),
		}
	}

	/// Drops the connection because the stream can no longer be trusted.
	pub(crate) fn fail(&mut self, error: Error) -> Error {
		self.pending = Pending::Idle;
		if let Some(conn) = self.conn.take() {
			warn!(peer = %conn.peer, error = %error, "dropping connection");
		}
		self.session.set_state(ConnectionState::Disconnected);
		error
	}
}

impl Drop for Exchange<'_> {
	fn drop(&mut self) {
		match self.pending {
			Pending::Idle => {}
			Pending::Connecting => self.session.set_state(ConnectionState::Disconnected),
			Pending::Reply => {
				if let Some(conn) = self.conn.take() {
					warn!(peer = %conn.peer, "exchange abandoned before reply, dropping connection");
				}
				self.session.set_state(ConnectionState::Disconnected);
			}
		}
	}
}
