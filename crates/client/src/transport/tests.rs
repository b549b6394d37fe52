use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use shifter_proto::{CommandResult, DEFAULT_MAX_FRAME_LEN, Envelope, Frame, read_frame, write_frame};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use super::*;

async fn listen() -> (TcpListener, ClientConfig) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let port = listener.local_addr().unwrap().port();
	let config = ClientConfig::new("127.0.0.1", port)
		.connect_timeout(Duration::from_secs(2))
		.read_timeout(Duration::from_secs(2))
		.write_timeout(Duration::from_secs(2));
	(listener, config)
}

fn reply(body: serde_json::Value) -> Frame {
	Frame {
		json: serde_json::to_vec(&body).unwrap(),
		attachment: Vec::new(),
	}
}

async fn echo_requests(mut stream: TcpStream) {
	while let Ok(frame) = read_frame(&mut stream, DEFAULT_MAX_FRAME_LEN).await {
		let request: serde_json::Value = serde_json::from_slice(&frame.json).unwrap();
		let body = json!({"protocol": request["protocol"], "resp": "success", "data": request["data"]});
		write_frame(&mut stream, &reply(body), DEFAULT_MAX_FRAME_LEN).await.unwrap();
	}
}

#[tokio::test]
async fn exchange_reads_reply_split_across_writes() {
	let (listener, config) = listen().await;
	let server = tokio::spawn(async move {
		let (mut stream, _) = listener.accept().await.unwrap();
		let request = read_frame(&mut stream, DEFAULT_MAX_FRAME_LEN).await.unwrap();
		assert_eq!(request.attachment, b"png-bytes");
		let frame = Frame {
			json: br#"{"protocol":"ask_handover_detail","resp":"success"}"#.to_vec(),
			attachment: vec![7; 64],
		};
		let bytes = frame.encode(DEFAULT_MAX_FRAME_LEN).unwrap();
		for chunk in bytes.chunks(5) {
			stream.write_all(chunk).await.unwrap();
			stream.flush().await.unwrap();
			tokio::time::sleep(Duration::from_millis(2)).await;
		}
		stream
	});

	let session = TransportSession::new(config);
	session.ensure_connected().await.unwrap();
	assert_eq!(session.state(), ConnectionState::Connected);

	let request = Envelope::new("ask_handover_detail", json!({"handover_uid": 3})).attachment(b"png-bytes".to_vec());
	let frame = session.exchange(&request).await.unwrap();
	let result = CommandResult::parse(&frame.json).unwrap();
	assert!(result.echoes("ask_handover_detail"));
	assert_eq!(frame.attachment, vec![7; 64]);
	assert!(session.is_connected());
	drop(server.await.unwrap());
}

#[tokio::test]
async fn peer_close_mid_frame_disconnects() {
	let (listener, config) = listen().await;
	tokio::spawn(async move {
		let (mut stream, _) = listener.accept().await.unwrap();
		let _ = read_frame(&mut stream, DEFAULT_MAX_FRAME_LEN).await.unwrap();
		let bytes = reply(json!({"protocol": "ask_notice_list", "resp": "success"}))
			.encode(DEFAULT_MAX_FRAME_LEN)
			.unwrap();
		stream.write_all(&bytes[..bytes.len() / 2]).await.unwrap();
	});

	let session = TransportSession::new(config);
	session.ensure_connected().await.unwrap();
	let err = session
		.exchange(&Envelope::new("ask_notice_list", json!({"team_uid": 1})))
		.await
		.unwrap_err();
	assert!(matches!(err, Error::ConnectionClosed), "{err:?}");
	assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn partial_header_times_out() {
	let (listener, config) = listen().await;
	let config = config.read_timeout(Duration::from_millis(100));
	tokio::spawn(async move {
		let (mut stream, _) = listener.accept().await.unwrap();
		let _ = read_frame(&mut stream, DEFAULT_MAX_FRAME_LEN).await.unwrap();
		stream.write_all(&[1, 0, 0]).await.unwrap();
		tokio::time::sleep(Duration::from_secs(5)).await;
	});

	let session = TransportSession::new(config);
	session.ensure_connected().await.unwrap();
	let err = session
		.exchange(&Envelope::new("attendance_info", json!({})))
		.await
		.unwrap_err();
	assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(100)), "{err:?}");
	assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_exchanges_do_not_interleave() {
	let (listener, config) = listen().await;
	tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		echo_requests(stream).await;
	});

	let session = TransportSession::new(config);
	session.ensure_connected().await.unwrap();

	let tasks: Vec<_> = (0..16)
		.map(|i| {
			let session = Arc::clone(&session);
			tokio::spawn(async move {
				let payload = json!({"n": i, "pad": "x".repeat(i * 512)});
				let frame = session.exchange(&Envelope::new(format!("cmd_{i}"), payload.clone())).await.unwrap();
				let result = CommandResult::parse(&frame.json).unwrap();
				assert!(result.echoes(&format!("cmd_{i}")));
				assert_eq!(result.data, payload);
			})
		})
		.collect();
	for task in tasks {
		task.await.unwrap();
	}
	assert!(session.is_connected());
}

#[tokio::test]
async fn send_without_connection() {
	let session = TransportSession::new(ClientConfig::default());
	let err = session.exchange(&Envelope::new("login", json!({}))).await.unwrap_err();
	assert!(matches!(err, Error::NotConnected));
	assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn oversized_request_keeps_connection() {
	let (listener, config) = listen().await;
	let config = config.max_frame_len(64);
	tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		echo_requests(stream).await;
	});

	let session = TransportSession::new(config);
	session.ensure_connected().await.unwrap();
	let big = Envelope::new("reg_handover", json!({})).attachment(vec![0; 128]);
	let err = session.exchange(&big).await.unwrap_err();
	assert!(matches!(err, Error::Frame(shifter_proto::Error::FrameTooLarge { .. })), "{err:?}");
	assert!(session.is_connected());
}

#[tokio::test]
async fn connect_refused() {
	let (listener, config) = listen().await;
	drop(listener);
	let session = TransportSession::new(config);
	let err = session.ensure_connected().await.unwrap_err();
	assert!(matches!(err, Error::Connection { .. }), "{err:?}");
	assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn close_is_idempotent() {
	let (listener, config) = listen().await;
	tokio::spawn(async move {
		while let Ok((stream, _)) = listener.accept().await {
			tokio::spawn(echo_requests(stream));
		}
	});

	let session = TransportSession::new(config);
	let mut states = session.subscribe_state();
	session.ensure_connected().await.unwrap();
	assert!(states.has_changed().unwrap());
	assert_eq!(*states.borrow_and_update(), ConnectionState::Connected);

	session.close().await;
	session.close().await;
	assert_eq!(session.state(), ConnectionState::Disconnected);
	assert!(!session.is_connected());

	session.ensure_connected().await.unwrap();
	assert!(session.is_connected());
}

#[tokio::test]
async fn shutdown_aborts_pending_exchange() {
	let (listener, config) = listen().await;
	tokio::spawn(async move {
		let (mut stream, _) = listener.accept().await.unwrap();
		let _ = read_frame(&mut stream, DEFAULT_MAX_FRAME_LEN).await;
		tokio::time::sleep(Duration::from_secs(5)).await;
	});

	let session = TransportSession::new(config);
	session.ensure_connected().await.unwrap();
	let pending = {
		let session = Arc::clone(&session);
		tokio::spawn(async move { session.exchange(&Envelope::new("ask_user_info", json!({}))).await })
	};
	tokio::time::sleep(Duration::from_millis(50)).await;
	session.shutdown().await;

	let err = pending.await.unwrap().unwrap_err();
	assert!(matches!(err, Error::Cancelled), "{err:?}");
	assert_eq!(session.state(), ConnectionState::Disconnected);
	assert!(matches!(session.ensure_connected().await, Err(Error::Cancelled)));
}

#[tokio::test]
async fn abandoned_exchange_drops_connection() {
	let (listener, config) = listen().await;
	tokio::spawn(async move {
		while let Ok((mut stream, _)) = listener.accept().await {
			tokio::spawn(async move {
				while let Ok(frame) = read_frame(&mut stream, DEFAULT_MAX_FRAME_LEN).await {
					tokio::time::sleep(Duration::from_millis(100)).await;
					let request: serde_json::Value = serde_json::from_slice(&frame.json).unwrap();
					let body = json!({"protocol": request["protocol"], "resp": "success", "data": request["data"]});
					if write_frame(&mut stream, &reply(body), DEFAULT_MAX_FRAME_LEN).await.is_err() {
						break;
					}
				}
			});
		}
	});

	let session = TransportSession::new(config);
	session.ensure_connected().await.unwrap();
	let first = Envelope::new("ask_notice_detail", json!({"notice_uid": 1}));
	let abandoned = tokio::time::timeout(Duration::from_millis(30), session.exchange(&first)).await;
	assert!(abandoned.is_err());
	assert_eq!(session.state(), ConnectionState::Disconnected);

	session.ensure_connected().await.unwrap();
	let second = Envelope::new("ask_notice_detail", json!({"notice_uid": 2}));
	let frame = session.exchange(&second).await.unwrap();
	let result = CommandResult::parse(&frame.json).unwrap();
	assert_eq!(result.data, json!({"notice_uid": 2}));
}

#[tokio::test]
async fn abandoned_connect_resets_state() {
	let (listener, config) = listen().await;
	// A host name forces a resolver round trip, so the first poll cannot finish the connect.
	let config = ClientConfig::new("localhost", config.port).connect_timeout(Duration::from_secs(2));
	let session = TransportSession::new(config);
	let mut states = session.subscribe_state();

	let abandoned = tokio::time::timeout(Duration::ZERO, session.ensure_connected()).await;
	assert!(abandoned.is_err());
	assert!(states.has_changed().unwrap());
	assert_eq!(*states.borrow_and_update(), ConnectionState::Disconnected);
	assert_eq!(session.state(), ConnectionState::Disconnected);
	assert!(!session.is_connected());
	drop(listener);
}
