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

//! Session event handler traits

use crate::connection::DisconnectReason;
use crate::error::SessionError;
use async_trait::async_trait;
use mudlink_telnetcodec::TelnetOption;

/// Session event handler trait
///
/// Implement this trait to react to session events. All methods are async
/// and have default implementations that do nothing; the session calls
/// them in event order before yielding the corresponding
/// [`SessionEvent`](crate::SessionEvent).
///
/// # Example
///
/// ```no_run
/// use mudlink_client::SessionHandler;
/// use async_trait::async_trait;
///
/// struct Printer;
///
/// #[async_trait]
/// impl SessionHandler for Printer {
///     async fn on_line(&self, line: &str, gagged: bool) {
///         if !gagged {
///             println!("{}", line);
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait SessionHandler: Send + Sync + 'static {
    /// Called when a connection attempt starts.
    async fn on_connecting(&self) {}

    /// Called when the socket is established (after any proxy handshake).
    async fn on_connect(&self) {}

    /// Called when the connection cycle ends, with the reason.
    async fn on_disconnect(&self, _reason: &DisconnectReason) {}

    /// Called for every completed line, decoded for display.
    ///
    /// Gagged lines were claimed by a protocol handler (e.g. a sound
    /// trigger) and should not be shown, but are still delivered here.
    async fn on_line(&self, _line: &str, _gagged: bool) {}

    /// Called when an unterminated prompt is waiting for display.
    ///
    /// When `supersedes` is true, a partial for the same line was already
    /// delivered; replace it instead of appending.
    async fn on_partial_line(&self, _text: &str, _supersedes: bool) {}

    /// Called when an option finishes negotiating on or off.
    async fn on_option_status(&self, _option: TelnetOption, _enabled: bool) {}

    /// Called when the server takes over or returns echoing.
    ///
    /// While `false`, typed input should not be displayed (password
    /// entry).
    async fn on_echo_changed(&self, _local_echo: bool) {}

    /// Called when a media download begins.
    async fn on_download_started(&self, _label: &str) {}

    /// Called with download progress in `0.0..=1.0`.
    async fn on_download_progress(&self, _fraction: f64) {}

    /// Called when a media download completes.
    async fn on_download_finished(&self, _url: &str) {}

    /// Called when a media download fails or is cancelled.
    async fn on_download_failed(&self, _url: &str, _error: &str) {}

    /// Called for out-of-band ZMP commands (name first, then arguments).
    async fn on_zmp_command(&self, _command: &[String]) {}

    /// Called when a session operation fails out of band.
    async fn on_error(&self, _error: &SessionError) {}
}

/// Raw traffic logging hook.
///
/// The session feeds every emitted line (terminator reinserted, gagged or
/// not), every partial chunk, and optionally sent input through this sink
/// as raw pre-decode bytes, so a log file reproduces the wire text.
pub trait LogSink: Send + 'static {
    /// Records one chunk of raw session bytes.
    fn log_chunk(&mut self, bytes: &[u8]);
}

impl<F> LogSink for F
where
    F: FnMut(&[u8]) + Send + 'static,
{
    fn log_chunk(&mut self, bytes: &[u8]) {
        self(bytes);
    }
}

/// A handler that ignores every event.
pub struct NullHandler;

#[async_trait]
impl SessionHandler for NullHandler {}
