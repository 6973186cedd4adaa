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

//! Session error types

use mudlink_telnetcodec::EngineError;
use std::io;
use thiserror::Error;

/// Errors surfaced by the client session and its connection layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O failure on the socket or the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Telnet engine rejected a request.
    #[error("telnet error: {0}")]
    Telnet(#[from] EngineError),

    /// Connect was called while a connection attempt or session is live.
    #[error("already connected")]
    AlreadyConnected,

    /// An operation that requires a live connection found none.
    #[error("not connected")]
    NotConnected,

    /// The connection attempt did not complete within the configured timeout.
    #[error("connection timed out")]
    ConnectTimeout,

    /// The proxy URL in the configuration could not be parsed.
    #[error("invalid proxy specification: {0}")]
    InvalidProxy(String),

    /// The SOCKS proxy rejected the CONNECT request.
    #[error("proxy refused connection: {0}")]
    ProxyRefused(String),
}

/// Session result type
pub type Result<T> = std::result::Result<T, SessionError>;
