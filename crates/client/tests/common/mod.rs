//! In-process scheduling server for end-to-end catalog tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use shifter_client::{ClientConfig, SessionCache, Shifter, TransportSession};
use shifter_proto::{DEFAULT_MAX_FRAME_LEN, FieldExt, Frame, read_frame, write_frame};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A request as the server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
	pub command: String,
	pub body: Value,
	pub attachment: Vec<u8>,
}

/// What the server sends back.
#[derive(Debug, Clone)]
pub struct Response {
	pub json: Vec<u8>,
	pub attachment: Vec<u8>,
}

impl Response {
	/// A reply whose JSON section is `bytes` verbatim.
	pub fn raw(bytes: &[u8]) -> Self {
		Self {
			json: bytes.to_vec(),
			attachment: Vec::new(),
		}
	}
}

impl From<Value> for Response {
	fn from(body: Value) -> Self {
		Self {
			json: serde_json::to_vec(&body).unwrap(),
			attachment: Vec::new(),
		}
	}
}

type Handler = dyn Fn(&Recorded) -> Response + Send + Sync;

pub struct FakeServer {
	pub config: ClientConfig,
	requests: Arc<Mutex<Vec<Recorded>>>,
	task: JoinHandle<()>,
}

impl FakeServer {
	/// Binds `127.0.0.1:0` and answers every frame with `handler`.
	pub async fn start<F>(handler: F) -> Self
	where
		F: Fn(&Recorded) -> Response + Send + Sync + 'static,
	{
		Self::with_delay(Duration::ZERO, handler).await
	}

	/// Like [`FakeServer::start`], waiting `delay` before each reply.
	pub async fn with_delay<F>(delay: Duration, handler: F) -> Self
	where
		F: Fn(&Recorded) -> Response + Send + Sync + 'static,
	{
		init_tracing();
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let port = listener.local_addr().unwrap().port();
		let requests = Arc::new(Mutex::new(Vec::new()));
		let handler: Arc<Handler> = Arc::new(handler);

		let log = Arc::clone(&requests);
		let task = tokio::spawn(async move {
			while let Ok((stream, _)) = listener.accept().await {
				tokio::spawn(serve(stream, delay, Arc::clone(&handler), Arc::clone(&log)));
			}
		});

		Self {
			config: test_config(port),
			requests,
			task,
		}
	}

	pub fn requests(&self) -> Vec<Recorded> {
		self.requests.lock().clone()
	}

	pub fn count(&self, command: &str) -> usize {
		self.requests.lock().iter().filter(|r| r.command == command).count()
	}

	pub fn shifter(&self) -> Shifter {
		Shifter::new(self.config.clone())
	}
}

impl Drop for FakeServer {
	fn drop(&mut self) {
		self.task.abort();
	}
}

async fn serve(mut stream: TcpStream, delay: Duration, handler: Arc<Handler>, log: Arc<Mutex<Vec<Recorded>>>) {
	while let Ok(frame) = read_frame(&mut stream, DEFAULT_MAX_FRAME_LEN).await {
		let body: Value = serde_json::from_slice(&frame.json).unwrap();
		let recorded = Recorded {
			command: body.str_field("protocol"),
			body,
			attachment: frame.attachment,
		};
		let response = handler(&recorded);
		log.lock().push(recorded);
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
		let reply = Frame {
			json: response.json,
			attachment: response.attachment,
		};
		if write_frame(&mut stream, &reply, DEFAULT_MAX_FRAME_LEN).await.is_err() {
			break;
		}
	}
}

pub fn test_config(port: u16) -> ClientConfig {
	ClientConfig::new("127.0.0.1", port)
		.connect_timeout(Duration::from_secs(2))
		.read_timeout(Duration::from_secs(2))
		.write_timeout(Duration::from_secs(2))
}

/// Config for a port nothing listens on.
pub async fn unreachable_config() -> ClientConfig {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let port = listener.local_addr().unwrap().port();
	drop(listener);
	test_config(port)
}

/// Catalog whose cache already holds a logged-in user.
pub fn logged_in(config: ClientConfig, user_id: i64, team_code: i64) -> Shifter {
	let session = SessionCache::new();
	session.apply_login(shifter_client::SessionSnapshot {
		user_id,
		team_code,
		..Default::default()
	});
	Shifter::with_transport(TransportSession::new(config), session)
}

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_env_filter("shifter_client=debug").try_init();
}
