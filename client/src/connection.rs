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

//! Raw byte transport
//!
//! [`ByteConnection`] owns the TCP socket (optionally dialed through a
//! SOCKS proxy) and runs it on a spawned I/O task. The task reports
//! inbound bytes and lifecycle changes over an event channel; outbound
//! bytes are queued to it and written in order. The connection knows
//! nothing about telnet: it moves bytes.

use crate::proxy::ProxySpec;
use crate::{Result, SessionError};
use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream, lookup_host};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

const READ_BUFFER_SIZE: usize = 8192;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no attempt in flight.
    Idle,
    /// Dialing (including proxy handshake).
    Connecting,
    /// Socket established and moving bytes.
    Connected,
}

const STATE_IDLE: u8 = 0;
const STATE_CONNECTING: u8 = 1;
const STATE_CONNECTED: u8 = 2;

impl ConnectionState {
    fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Idle => STATE_IDLE,
            ConnectionState::Connecting => STATE_CONNECTING,
            ConnectionState::Connected => STATE_CONNECTED,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            STATE_CONNECTING => ConnectionState::Connecting,
            STATE_CONNECTED => ConnectionState::Connected,
            _ => ConnectionState::Idle,
        }
    }
}

/// Why a connection cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The server closed the stream.
    Clean,
    /// The user tore the connection (or the attempt) down.
    Cancelled,
    /// The socket failed or the dial did not complete.
    Error(String),
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::Clean => write!(f, "connection closed by server"),
            DisconnectReason::Cancelled => write!(f, "disconnected"),
            DisconnectReason::Error(message) => write!(f, "connection error: {message}"),
        }
    }
}

/// Events emitted by the I/O task.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// The socket is established (after any proxy handshake).
    Connected,
    /// One successful socket read.
    DataReady(BytesMut),
    /// The cycle ended. Emitted at most once per `connect` call, and only
    /// for endings the user did not request; an explicit
    /// [`ByteConnection::disconnect`] ends the task silently.
    Disconnected(DisconnectReason),
}

/// An asynchronous byte pipe to one server.
///
/// Reusable across connection cycles: after a disconnect (from either
/// side), `connect` may be called again.
pub struct ByteConnection {
    host: String,
    port: u16,
    proxy: Option<ProxySpec>,
    connect_timeout: Duration,
    state: Arc<AtomicU8>,
    cancel: Option<CancellationToken>,
    writer_tx: Option<mpsc::UnboundedSender<Bytes>>,
}

impl ByteConnection {
    /// Creates a connection for the given endpoint. The proxy
    /// specification, when present, is validated here.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        proxy: Option<&str>,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let proxy = proxy.map(ProxySpec::parse).transpose()?;
        Ok(ByteConnection {
            host: host.into(),
            port,
            proxy,
            connect_timeout,
            state: Arc::new(AtomicU8::new(STATE_IDLE)),
            cancel: None,
            writer_tx: None,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Starts a connection attempt on a spawned task and returns
    /// immediately. Events arrive on `events`.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyConnected`] when an attempt or session is
    /// already live.
    pub fn connect(&mut self, events: mpsc::Sender<ConnectionEvent>) -> Result<()> {
        if self.state() != ConnectionState::Idle {
            return Err(SessionError::AlreadyConnected);
        }
        // Each cycle gets its own state cell: a task left over from an
        // earlier cycle can only write to its own cell, never to the one
        // a later connect() reads.
        let state = Arc::new(AtomicU8::new(STATE_CONNECTING));
        self.state = Arc::clone(&state);

        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        let (writer_tx, writer_rx) = mpsc::unbounded_channel();
        self.writer_tx = Some(writer_tx);

        let task = IoTask {
            host: self.host.clone(),
            port: self.port,
            proxy: self.proxy.clone(),
            connect_timeout: self.connect_timeout,
            state,
            token,
            events,
        };
        tokio::spawn(task.run(writer_rx));
        Ok(())
    }

    /// Queues bytes for transmission, in order, without blocking.
    ///
    /// Zero-length sends are a no-op, and bytes sent while no connection
    /// is live are dropped.
    pub fn send(&self, bytes: Bytes) {
        if bytes.is_empty() {
            return;
        }
        match &self.writer_tx {
            Some(tx) => {
                if tx.send(bytes).is_err() {
                    trace!("dropping outbound bytes, I/O task gone");
                }
            }
            None => trace!("dropping outbound bytes, not connected"),
        }
    }

    /// Tears down the connection or attempt, if any. Idempotent.
    ///
    /// Returns the state the connection was in, so the caller can report
    /// an attempt abort differently from a session close. The I/O task
    /// exits without emitting `Disconnected`.
    pub fn disconnect(&mut self) -> ConnectionState {
        let previous = self.state();
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.writer_tx = None;
        self.state.store(STATE_IDLE, Ordering::Release);
        previous
    }
}

impl Drop for ByteConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

struct IoTask {
    host: String,
    port: u16,
    proxy: Option<ProxySpec>,
    connect_timeout: Duration,
    state: Arc<AtomicU8>,
    token: CancellationToken,
    events: mpsc::Sender<ConnectionEvent>,
}

impl IoTask {
    async fn run(self, mut writer_rx: mpsc::UnboundedReceiver<Bytes>) {
        let stream = tokio::select! {
            () = self.token.cancelled() => {
                debug!("connection attempt cancelled");
                self.state.store(STATE_IDLE, Ordering::Release);
                return;
            }
            dialed = tokio::time::timeout(self.connect_timeout, self.dial()) => {
                match dialed {
                    Ok(Ok(stream)) => stream,
                    Ok(Err(error)) => {
                        self.finish(Some(DisconnectReason::Error(error.to_string())))
                            .await;
                        return;
                    }
                    Err(_) => {
                        self.finish(Some(DisconnectReason::Error(
                            SessionError::ConnectTimeout.to_string(),
                        )))
                        .await;
                        return;
                    }
                }
            }
        };

        if let Err(error) = stream.set_nodelay(true) {
            debug!("failed to set TCP_NODELAY: {}", error);
        }
        self.state.store(STATE_CONNECTED, Ordering::Release);
        if !self.emit(ConnectionEvent::Connected).await {
            self.state.store(STATE_IDLE, Ordering::Release);
            return;
        }

        let (mut reader, mut writer) = stream.into_split();
        let mut buffer = BytesMut::with_capacity(READ_BUFFER_SIZE);
        let reason = loop {
            tokio::select! {
                () = self.token.cancelled() => break None,
                outbound = writer_rx.recv() => match outbound {
                    Some(bytes) => {
                        if let Err(error) = writer.write_all(&bytes).await {
                            break Some(DisconnectReason::Error(error.to_string()));
                        }
                        if let Err(error) = writer.flush().await {
                            break Some(DisconnectReason::Error(error.to_string()));
                        }
                    }
                    // Sender dropped: the handle is being torn down.
                    None => break None,
                },
                read = reader.read_buf(&mut buffer) => match read {
                    Ok(0) => break Some(DisconnectReason::Clean),
                    Ok(_) => {
                        if !self.emit(ConnectionEvent::DataReady(buffer.split())).await {
                            break None;
                        }
                        buffer.reserve(READ_BUFFER_SIZE);
                    }
                    Err(error) => break Some(DisconnectReason::Error(error.to_string())),
                },
            }
        };
        self.finish(reason).await;
    }

    /// Sends an event unless cancellation wins first, so a task wedged on
    /// a full event channel still honors teardown. Returns whether the
    /// event was delivered.
    async fn emit(&self, event: ConnectionEvent) -> bool {
        tokio::select! {
            () = self.token.cancelled() => false,
            sent = self.events.send(event) => sent.is_ok(),
        }
    }

    async fn finish(&self, reason: Option<DisconnectReason>) {
        self.state.store(STATE_IDLE, Ordering::Release);
        if let Some(reason) = reason {
            debug!(%reason, "connection cycle ended");
            self.emit(ConnectionEvent::Disconnected(reason)).await;
        }
    }

    /// Resolves and dials the endpoint, through the proxy when one is
    /// configured.
    async fn dial(&self) -> Result<TcpStream> {
        match &self.proxy {
            Some(spec) => {
                let mut stream = dial_tcp(&spec.address()).await?;
                spec.establish(&mut stream, &self.host, self.port).await?;
                Ok(stream)
            }
            None => dial_tcp(&format!("{}:{}", self.host, self.port)).await,
        }
    }
}

/// Dials every resolved address in order, returning the first socket that
/// connects. Keepalive is enabled on the socket before connecting.
async fn dial_tcp(address: &str) -> Result<TcpStream> {
    let mut last_error = None;
    for addr in lookup_host(address).await? {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }?;
        if let Err(error) = socket.set_keepalive(true) {
            debug!("failed to enable keepalive: {}", error);
        }
        match socket.connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(error) => {
                warn!(%addr, "connect failed: {}", error);
                last_error = Some(error);
            }
        }
    }
    Err(last_error
        .unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "address resolved to nothing")
        })
        .into())
}

// ============================================================================
// Unit Tests
// ============================================================================
