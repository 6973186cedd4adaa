//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! End-to-end session tests against a scripted loopback server.

use async_compression::tokio::write::ZlibEncoder;
use mudlink_client::{
    ConnectionSession, DisconnectReason, NullHandler, SessionConfig, SessionEvent, TelnetOption,
};
use mudlink_telnetcodec::consts;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn listen() -> (TcpListener, SessionConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = SessionConfig::new(addr.ip().to_string(), addr.port());
    (listener, config)
}

fn session(config: SessionConfig) -> ConnectionSession {
    ConnectionSession::new(config, Arc::new(NullHandler)).unwrap()
}

async fn next(session: &mut ConnectionSession) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), session.next_event())
        .await
        .expect("timed out waiting for a session event")
        .expect("event sequence ended unexpectedly")
}

async fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new());
    encoder.write_all(data).await.unwrap();
    encoder.shutdown().await.unwrap();
    encoder.into_inner()
}

#[tokio::test]
async fn negotiation_lines_and_prompt_promotion() {
    let (listener, config) = listen().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut banner = Vec::new();
        banner.extend_from_slice(&[consts::IAC, consts::DO, consts::option::CHARSET]);
        banner.extend_from_slice(b"Welcome\r\nCommand: ");
        socket.write_all(&banner).await.unwrap();

        // The client answers the negotiation.
        let mut reply = [0u8; 3];
        socket.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [consts::IAC, consts::WILL, consts::option::CHARSET]);

        // A later terminator promotes the pending prompt.
        socket.write_all(b"\r\n").await.unwrap();
        socket.shutdown().await.unwrap();
    });

    let mut session = session(config);
    session.connect().unwrap();

    assert!(matches!(next(&mut session).await, SessionEvent::Connecting));
    assert!(matches!(next(&mut session).await, SessionEvent::Connected));

    let mut saw_charset = false;
    let mut saw_welcome = false;
    let mut saw_prompt_partial = false;
    let mut saw_prompt_line = false;
    loop {
        match next(&mut session).await {
            SessionEvent::OptionStatus { option, enabled } => {
                assert_eq!(option, TelnetOption::Charset);
                assert!(enabled);
                saw_charset = true;
            }
            SessionEvent::Line { text, gagged } if text == "Welcome" => {
                assert!(!gagged);
                assert!(!saw_prompt_partial, "line must precede its prompt");
                saw_welcome = true;
            }
            SessionEvent::PartialLine { text, .. } => {
                // Reads may split the prompt; only the complete form counts.
                if text == "Command: " {
                    saw_prompt_partial = true;
                }
            }
            SessionEvent::Line { text, .. } if text == "Command: " => {
                assert!(saw_prompt_partial, "promotion follows the partial");
                saw_prompt_line = true;
            }
            SessionEvent::Disconnected(DisconnectReason::Clean) => break,
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert!(saw_charset && saw_welcome && saw_prompt_line);
    server.await.unwrap();
}

#[tokio::test]
async fn user_disconnect_emits_exactly_one_event() {
    let (listener, config) = listen().await;
    tokio::spawn(async move {
        let _socket = listener.accept().await.unwrap();
        std::future::pending::<()>().await;
    });

    let mut session = session(config);
    session.connect().unwrap();
    assert!(matches!(next(&mut session).await, SessionEvent::Connecting));
    assert!(matches!(next(&mut session).await, SessionEvent::Connected));

    session.disconnect();
    session.disconnect();

    let mut disconnects = 0;
    while let Some(event) = session.next_event().await {
        if let SessionEvent::Disconnected(reason) = event {
            assert_eq!(reason, DisconnectReason::Cancelled);
            disconnects += 1;
        }
    }
    assert_eq!(disconnects, 1);
}

#[tokio::test]
async fn connect_string_sent_once_after_first_line() {
    let (listener, config) = listen().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(b"Welcome\r\nSecond\r\n").await.unwrap();

        let mut login = [0u8; 7];
        socket.read_exact(&mut login).await.unwrap();
        assert_eq!(&login, b"guest\r\n");

        // Nothing further follows the one-shot login.
        socket.shutdown().await.unwrap();
        let mut rest = Vec::new();
        socket.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    });

    let mut session = session(config.with_connect_string("guest"));
    session.connect().unwrap();

    loop {
        if matches!(
            next(&mut session).await,
            SessionEvent::Disconnected(DisconnectReason::Clean)
        ) {
            break;
        }
    }
    server.await.unwrap();
}

#[tokio::test]
async fn echo_suppression_redacts_history() {
    let (listener, config) = listen().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket
            .write_all(&[consts::IAC, consts::WILL, consts::option::ECHO])
            .await
            .unwrap();

        // DO ECHO, then the password still goes over the wire verbatim.
        let mut reply = [0u8; 3];
        socket.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [consts::IAC, consts::DO, consts::option::ECHO]);
        let mut password = [0u8; 9];
        socket.read_exact(&mut password).await.unwrap();
        assert_eq!(&password, b"hunter2\r\n");
    });

    let mut session = session(config);
    session.connect().unwrap();

    loop {
        if matches!(next(&mut session).await, SessionEvent::EchoChanged(false)) {
            break;
        }
    }
    session.send_line("hunter2").unwrap();
    assert_eq!(
        session.navigate_history(mudlink_client::Direction::Up),
        Some("<password removed>")
    );
    server.await.unwrap();
}

#[tokio::test]
async fn mccp_activation_inflates_the_stream_tail() {
    let (listener, config) = listen().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket
            .write_all(&[consts::IAC, consts::WILL, consts::option::COMPRESS2])
            .await
            .unwrap();

        let mut reply = [0u8; 3];
        socket.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [consts::IAC, consts::DO, consts::option::COMPRESS2]);

        // Activation and compressed payload in a single write, so the
        // client must hand off mid-buffer.
        let mut burst = vec![
            consts::IAC,
            consts::SB,
            consts::option::COMPRESS2,
            consts::IAC,
            consts::SE,
        ];
        burst.extend_from_slice(&deflate(b"You feel lighter.\r\n").await);
        socket.write_all(&burst).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    let mut session = session(config);
    session.connect().unwrap();

    let mut saw_line = false;
    loop {
        match next(&mut session).await {
            SessionEvent::Line { text, .. } if text == "You feel lighter." => saw_line = true,
            SessionEvent::Disconnected(DisconnectReason::Clean) => break,
            _ => {}
        }
    }
    assert!(saw_line);
    server.await.unwrap();
}

#[tokio::test]
async fn command_divider_splits_input() {
    let (listener, config) = listen().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = [0u8; 18];
        socket.read_exact(&mut received).await.unwrap();
        assert_eq!(&received, b"open door\r\nnorth\r\n");
    });

    let mut session = session(config);
    session.connect().unwrap();
    assert!(matches!(next(&mut session).await, SessionEvent::Connecting));
    assert!(matches!(next(&mut session).await, SessionEvent::Connected));

    session.send_line("open door; north").unwrap();

    // Local echo of both commands, in order.
    match next(&mut session).await {
        SessionEvent::Line { text, .. } => assert_eq!(text, "open door"),
        other => panic!("unexpected event {other:?}"),
    }
    match next(&mut session).await {
        SessionEvent::Line { text, .. } => assert_eq!(text, "north"),
        other => panic!("unexpected event {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn empty_divider_sends_one_trimmed_command() {
    let (listener, config) = listen().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = [0u8; 16];
        socket.read_exact(&mut received).await.unwrap();
        assert_eq!(&received, b"say one; two\r\n\r\n");
    });

    let mut session = session(config.with_command_divider(""));
    session.connect().unwrap();
    assert!(matches!(next(&mut session).await, SessionEvent::Connecting));
    assert!(matches!(next(&mut session).await, SessionEvent::Connected));

    // Without a divider the whole line is one command, trimmed like any
    // other.
    session.send_line("  say one; two  ").unwrap();
    match next(&mut session).await {
        SessionEvent::Line { text, .. } => assert_eq!(text, "say one; two"),
        other => panic!("unexpected event {other:?}"),
    }

    session.send_line("   ").unwrap();
    match next(&mut session).await {
        SessionEvent::Line { text, .. } => assert_eq!(text, ""),
        other => panic!("unexpected event {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn server_error_close_reports_reason() {
    let (listener, config) = listen().await;
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        // Hard reset instead of an orderly shutdown.
        socket.set_linger(Some(Duration::from_secs(0))).unwrap();
        drop(socket);
    });

    let mut session = session(config);
    session.connect().unwrap();
    assert!(matches!(next(&mut session).await, SessionEvent::Connecting));
    assert!(matches!(next(&mut session).await, SessionEvent::Connected));

    match next(&mut session).await {
        SessionEvent::Disconnected(DisconnectReason::Error(_)) => {}
        // Some platforms surface the reset as a plain close.
        SessionEvent::Disconnected(DisconnectReason::Clean) => {}
        other => panic!("unexpected event {other:?}"),
    }
    server.await.unwrap();
}
