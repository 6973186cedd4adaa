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

//! Session orchestration
//!
//! [`ConnectionSession`] wires the byte transport, the telnet engine, the
//! MCCP decompressor, and the line buffer into one inbound pipeline, and
//! routes user input out through encoding and IAC escaping. It is the
//! only type most embedders need.

use crate::config::SessionConfig;
use crate::connection::{ByteConnection, ConnectionEvent, ConnectionState, DisconnectReason};
use crate::download::{
    DownloadEvent, DownloadItem, DownloadQueue, DownloadTransport, HttpTransport,
};
use crate::encoding::SessionEncoding;
use crate::error::{Result, SessionError};
use crate::handler::{LogSink, SessionHandler};
use crate::history::{Direction, InputHistory};
use crate::linebuffer::LineBuffer;
use bytes::BytesMut;
use mudlink_compress::{InboundDecompressor, MccpVersion};
use mudlink_telnetcodec::{
    CompressionVersion, EngineAction, TelnetEngine, TelnetOption, ZmpHandler, escape_iac,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const CONNECTION_EVENT_QUEUE: usize = 64;

/// Everything a session reports, in order.
#[derive(Debug)]
pub enum SessionEvent {
    /// A connection attempt started.
    Connecting,
    /// The socket is established.
    Connected,
    /// The connection cycle ended.
    Disconnected(DisconnectReason),
    /// A completed line, decoded for display.
    Line {
        /// Decoded line text without its terminator.
        text: String,
        /// Whether a protocol handler claimed the line.
        gagged: bool,
    },
    /// An unterminated prompt waiting for display.
    PartialLine {
        /// Decoded prompt text so far.
        text: String,
        /// Replace the previously shown partial instead of appending.
        supersedes: bool,
    },
    /// An option finished negotiating.
    OptionStatus {
        /// The option in question.
        option: TelnetOption,
        /// On or off.
        enabled: bool,
    },
    /// The server took over or returned echoing.
    EchoChanged(bool),
    /// A media download began.
    DownloadStarted {
        /// Short display label.
        label: String,
    },
    /// Media download progress in `0.0..=1.0`.
    DownloadProgress {
        /// Completed fraction.
        fraction: f64,
    },
    /// A media download completed.
    DownloadFinished {
        /// Source URL.
        url: String,
    },
    /// A media download failed or was cancelled.
    DownloadFailed {
        /// Source URL.
        url: String,
        /// Failure description.
        error: String,
    },
    /// An out-of-band ZMP command from the server.
    ZmpCommand(Vec<String>),
}

/// One MUD session: connection lifecycle, telnet negotiation, line
/// assembly, input history, and media downloads behind a single event
/// loop.
///
/// Drive it by awaiting [`ConnectionSession::next_event`] in a loop; the
/// registered [`SessionHandler`] is called for each event just before it
/// is returned.
pub struct ConnectionSession {
    config: SessionConfig,
    handler: Arc<dyn SessionHandler>,
    log: Option<Box<dyn LogSink>>,
    connection: ByteConnection,
    engine: TelnetEngine,
    decompressor: InboundDecompressor,
    linebuffer: LineBuffer,
    history: InputHistory,
    downloads: DownloadQueue,
    encoding: SessionEncoding,
    local_echo: bool,
    connect_string_sent: bool,
    pending: VecDeque<SessionEvent>,
    conn_rx: Option<mpsc::Receiver<ConnectionEvent>>,
    download_rx: mpsc::UnboundedReceiver<DownloadEvent>,
}

enum Pulled {
    Connection(Option<ConnectionEvent>),
    Download(Option<DownloadEvent>),
}

impl ConnectionSession {
    /// Creates a session with the production HTTP download transport.
    pub fn new(config: SessionConfig, handler: Arc<dyn SessionHandler>) -> Result<Self> {
        Self::with_transport(config, handler, Arc::new(HttpTransport::new()))
    }

    /// Creates a session with a caller-supplied download transport.
    pub fn with_transport(
        config: SessionConfig,
        handler: Arc<dyn SessionHandler>,
        transport: Arc<dyn DownloadTransport>,
    ) -> Result<Self> {
        let connection = ByteConnection::new(
            config.host.clone(),
            config.port,
            config.proxy.as_deref(),
            config.connect_timeout,
        )?;
        let (download_tx, download_rx) = mpsc::unbounded_channel();
        let downloads =
            DownloadQueue::new(transport, download_tx, config.remote_download_allowed);
        let engine = build_engine(&config);
        let encoding = SessionEncoding::new(&config.encoding);
        let history = InputHistory::new(config.history_limit);
        Ok(ConnectionSession {
            config,
            handler,
            log: None,
            connection,
            engine,
            decompressor: InboundDecompressor::new(),
            linebuffer: LineBuffer::new(),
            history,
            downloads,
            encoding,
            local_echo: true,
            connect_string_sent: false,
            pending: VecDeque::new(),
            conn_rx: None,
            download_rx,
        })
    }

    /// Attaches a raw traffic logging sink.
    pub fn with_log_sink(mut self, sink: Box<dyn LogSink>) -> Self {
        self.log = Some(sink);
        self
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Starts a connection attempt.
    ///
    /// All per-connection state (negotiation, compression, line assembly,
    /// encoding override) starts fresh; events from the previous cycle
    /// that are already queued are still delivered first.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyConnected`] when an attempt or session is
    /// already live.
    pub fn connect(&mut self) -> Result<()> {
        if self.connection.state() != ConnectionState::Idle {
            return Err(SessionError::AlreadyConnected);
        }
        self.engine.reset();
        self.decompressor.reset();
        self.linebuffer.clear();
        self.encoding.reset();
        self.local_echo = true;
        self.connect_string_sent = false;

        let (tx, rx) = mpsc::channel(CONNECTION_EVENT_QUEUE);
        self.connection.connect(tx)?;
        self.conn_rx = Some(rx);
        self.pending.push_back(SessionEvent::Connecting);
        Ok(())
    }

    /// Tears the connection (or attempt) down. Idempotent; when something
    /// was live, exactly one `Disconnected` event follows.
    pub fn disconnect(&mut self) {
        let previous = self.connection.disconnect();
        self.conn_rx = None;
        if previous != ConnectionState::Idle {
            self.cleanup_after_disconnect();
            self.pending
                .push_back(SessionEvent::Disconnected(DisconnectReason::Cancelled));
        }
    }

    /// Disconnects (if connected) and immediately dials again.
    pub fn reconnect(&mut self) -> Result<()> {
        self.disconnect();
        self.connect()
    }

    /// Sends one input line.
    ///
    /// The line is recorded in history, split into commands on the
    /// configured divider, and each command is trimmed, encoded, IAC
    /// escaped, and transmitted with CR LF (or wrapped as `zmp.input`
    /// when that output path is enabled and negotiated).
    ///
    /// # Errors
    ///
    /// [`SessionError::NotConnected`] when no connection is established.
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        if self.connection.state() != ConnectionState::Connected {
            return Err(SessionError::NotConnected);
        }
        self.history.record(line, self.local_echo);

        let commands: Vec<String> = if self.config.command_divider.is_empty() {
            vec![line.trim().to_string()]
        } else {
            line.split(self.config.command_divider.as_str())
                .map(|command| command.trim().to_string())
                .collect()
        };
        for command in commands {
            self.transmit_command(&command);
            if self.config.log_input {
                let mut raw = BytesMut::from(&self.encoding.encode(&command)[..]);
                raw.extend_from_slice(b"\r\n");
                if let Some(log) = &mut self.log {
                    log.log_chunk(&raw);
                }
            }
            if self.config.echo_sent_text && self.local_echo {
                self.pending.push_back(SessionEvent::Line {
                    text: command,
                    gagged: false,
                });
            }
        }
        Ok(())
    }

    /// Steps through input history; `None` means clear the input line.
    pub fn navigate_history(&mut self, direction: Direction) -> Option<&str> {
        self.history.navigate(direction)
    }

    /// Cancels the media download in flight, if any.
    pub fn cancel_download(&mut self) {
        self.downloads.cancel_active();
    }

    /// Waits for the next session event, dispatching it to the handler
    /// before returning it.
    ///
    /// Returns `None` once nothing can produce further events: no
    /// connection is live, no events are queued, and no download is in
    /// flight. A later [`ConnectionSession::connect`] makes the sequence
    /// resume.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                self.deliver(&event).await;
                return Some(event);
            }
            if self.conn_rx.is_none() && !self.downloads.is_active() {
                return None;
            }

            let pulled = match &mut self.conn_rx {
                Some(conn_rx) => tokio::select! {
                    event = conn_rx.recv() => Pulled::Connection(event),
                    event = self.download_rx.recv() => Pulled::Download(event),
                },
                None => Pulled::Download(self.download_rx.recv().await),
            };
            match pulled {
                Pulled::Connection(Some(event)) => self.handle_connection_event(event).await,
                // The I/O task exited silently after a user disconnect.
                Pulled::Connection(None) => self.conn_rx = None,
                Pulled::Download(Some(event)) => self.handle_download_event(event),
                // The queue holds a sender, so this cannot happen; treat
                // it as the sequence ending.
                Pulled::Download(None) => return None,
            }
        }
    }

    async fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected => {
                debug!(address = %self.config.address(), "connected");
                self.pending.push_back(SessionEvent::Connected);
            }
            ConnectionEvent::DataReady(data) => self.process_inbound(data).await,
            ConnectionEvent::Disconnected(reason) => {
                self.connection.disconnect();
                self.conn_rx = None;
                self.cleanup_after_disconnect();
                self.pending.push_back(SessionEvent::Disconnected(reason));
            }
        }
    }

    fn handle_download_event(&mut self, event: DownloadEvent) {
        match event {
            DownloadEvent::Started { label } => {
                self.pending.push_back(SessionEvent::DownloadStarted { label });
            }
            DownloadEvent::Progress { fraction } => {
                self.pending
                    .push_back(SessionEvent::DownloadProgress { fraction });
            }
            DownloadEvent::Finished { url } => {
                self.downloads.advance();
                self.pending.push_back(SessionEvent::DownloadFinished { url });
            }
            DownloadEvent::Failed { url, error } => {
                warn!(%url, "download failed: {}", error);
                self.downloads.advance();
                self.pending
                    .push_back(SessionEvent::DownloadFailed { url, error });
            }
        }
    }

    /// Runs one inbound chunk through decompression, the telnet engine,
    /// and line assembly.
    async fn process_inbound(&mut self, data: BytesMut) {
        let mut plain = match self.decompressor.feed(&data).await {
            Ok(bytes) => bytes,
            Err(error) => {
                self.fail_connection(format!("decompression failed: {error}"))
                    .await;
                return;
            }
        };
        loop {
            let result = self.engine.process(&plain);
            self.connection.send(result.replies.freeze());
            self.apply_actions(result.actions);
            self.emit_text(&result.visible_text);
            if result.consumed >= plain.len() {
                break;
            }
            // Compression activated mid-buffer: the tail belongs to the
            // zlib stream. Inflate it and keep scanning.
            let compressed = plain.split_off(result.consumed);
            plain = match self.decompressor.feed(&compressed).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    self.fail_connection(format!("decompression failed: {error}"))
                        .await;
                    return;
                }
            };
        }
    }

    fn apply_actions(&mut self, actions: Vec<EngineAction>) {
        for action in actions {
            match action {
                EngineAction::OptionStatus(option, enabled) => {
                    self.pending
                        .push_back(SessionEvent::OptionStatus { option, enabled });
                }
                EngineAction::SetLocalEcho(enabled) => {
                    if self.local_echo != enabled {
                        self.local_echo = enabled;
                        self.pending.push_back(SessionEvent::EchoChanged(enabled));
                    }
                }
                EngineAction::StartCompression(version) => {
                    let version = match version {
                        CompressionVersion::V1 => MccpVersion::V1,
                        CompressionVersion::V2 => MccpVersion::V2,
                    };
                    if let Err(error) = self.decompressor.begin(version) {
                        warn!("cannot activate {}: {}", version, error);
                    }
                }
                EngineAction::StopCompression => self.decompressor.reset(),
                EngineAction::SetEncoding(label) => self.encoding.set_remote(&label),
                EngineAction::ResetEncoding => self.encoding.reset(),
                EngineAction::QueueDownload { url, file_name } => {
                    let file = self.config.download_dir.join(&file_name);
                    self.downloads.enqueue(DownloadItem { url, file });
                }
                EngineAction::ZmpCommand(parts) => {
                    self.pending.push_back(SessionEvent::ZmpCommand(parts));
                }
            }
        }
    }

    /// Splits stripped text into lines, scans each through the enabled
    /// option handlers, and queues display events.
    fn emit_text(&mut self, visible: &[u8]) {
        if visible.is_empty() {
            return;
        }
        let batch = self.linebuffer.add_data(visible);
        for line in batch.lines {
            let scan = self.engine.scan_line(&line.text);
            self.connection.send(scan.replies.freeze());
            self.apply_actions(scan.actions);

            // The log gets the wire bytes back, terminator included,
            // whether or not the line is gagged.
            if let Some(log) = &mut self.log {
                let mut raw = BytesMut::with_capacity(line.text.len() + 2);
                raw.extend_from_slice(&line.text);
                raw.extend_from_slice(line.ending.as_bytes());
                log.log_chunk(&raw);
            }

            let text = self.encoding.decode(&line.text);
            self.pending.push_back(SessionEvent::Line {
                text,
                gagged: scan.gag,
            });

            if !scan.gag && !self.connect_string_sent {
                self.connect_string_sent = true;
                if let Some(connect) = self.config.connect_string.clone() {
                    debug!("sending connect string");
                    self.transmit_command(&connect);
                }
            }
        }
        if let Some(partial) = batch.partial {
            if let Some(log) = &mut self.log {
                log.log_chunk(&partial.text);
            }
            self.pending.push_back(SessionEvent::PartialLine {
                text: self.encoding.decode(&partial.text),
                supersedes: partial.supersedes_previous,
            });
        }
    }

    /// Encodes and transmits one command, over the ZMP sidechannel when
    /// that output path is enabled and negotiated, otherwise as plain
    /// text with CR LF.
    fn transmit_command(&mut self, command: &str) {
        if self.config.zmp_output_enabled
            && self.engine.is_enabled(TelnetOption::ZMP)
            && let Some(subnegotiation) = self.engine.zmp_command(&["zmp.input", command])
        {
            self.connection.send(subnegotiation.freeze());
            return;
        }
        let encoded = self.encoding.encode(command);
        let mut wire = escape_iac(&encoded);
        wire.extend_from_slice(b"\r\n");
        self.connection.send(wire.freeze());
    }

    async fn fail_connection(&mut self, message: String) {
        warn!("{}", message);
        self.handler
            .on_error(&SessionError::Io(std::io::Error::other(message.clone())))
            .await;
        self.connection.disconnect();
        self.conn_rx = None;
        self.cleanup_after_disconnect();
        self.pending
            .push_back(SessionEvent::Disconnected(DisconnectReason::Error(message)));
    }

    fn cleanup_after_disconnect(&mut self) {
        self.engine.reset();
        self.decompressor.reset();
        self.linebuffer.clear();
        self.encoding.reset();
        self.downloads.clear();
        self.local_echo = true;
        self.connect_string_sent = false;
    }

    async fn deliver(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Connecting => self.handler.on_connecting().await,
            SessionEvent::Connected => self.handler.on_connect().await,
            SessionEvent::Disconnected(reason) => self.handler.on_disconnect(reason).await,
            SessionEvent::Line { text, gagged } => self.handler.on_line(text, *gagged).await,
            SessionEvent::PartialLine { text, supersedes } => {
                self.handler.on_partial_line(text, *supersedes).await;
            }
            SessionEvent::OptionStatus { option, enabled } => {
                self.handler.on_option_status(*option, *enabled).await;
            }
            SessionEvent::EchoChanged(enabled) => self.handler.on_echo_changed(*enabled).await,
            SessionEvent::DownloadStarted { label } => {
                self.handler.on_download_started(label).await;
            }
            SessionEvent::DownloadProgress { fraction } => {
                self.handler.on_download_progress(*fraction).await;
            }
            SessionEvent::DownloadFinished { url } => {
                self.handler.on_download_finished(url).await;
            }
            SessionEvent::DownloadFailed { url, error } => {
                self.handler.on_download_failed(url, error).await;
            }
            SessionEvent::ZmpCommand(parts) => self.handler.on_zmp_command(parts).await,
        }
    }
}

/// Builds the engine with the MUD handler set, a charset policy bound to
/// the session configuration, and the configured ZMP identity.
fn build_engine(config: &SessionConfig) -> TelnetEngine {
    let allowed = config.remote_encoding_allowed;
    let mut engine = TelnetEngine::with_mud_handlers(Box::new(move |label| {
        allowed && SessionEncoding::resolves(label)
    }));
    engine.register_handler(Box::new(ZmpHandler::new(
        config.terminal_name.clone(),
        config.client_version.clone(),
    )));
    engine
}

// ============================================================================
// Unit Tests
// ============================================================================
