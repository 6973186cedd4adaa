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

//! # Inbound MCCP Decompression
//!
//! MUD servers that negotiate MCCP (either protocol version, both zlib)
//! switch the server-to-client direction of the stream to a compressed
//! stream mid-connection. This crate provides [`InboundDecompressor`], a
//! chunk-oriented inflate layer the session routes inbound bytes through:
//!
//! - **Passthrough by default**: before compression activates, chunks come
//!   back unchanged
//! - **Incremental**: compressed input may be split at arbitrary byte
//!   boundaries across socket reads
//! - **Resettable**: a disconnect or MCCP teardown returns the layer to
//!   passthrough
//!
//! ## Usage
//!
//! ```rust
//! use mudlink_compress::{InboundDecompressor, MccpVersion};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> std::io::Result<()> {
//! let mut decompressor = InboundDecompressor::new();
//!
//! // Before activation, bytes pass straight through.
//! let out = decompressor.feed(b"plain text").await?;
//! assert_eq!(&out[..], b"plain text");
//!
//! // After the MCCP activation subnegotiation, inflate everything.
//! decompressor.begin(MccpVersion::V2)?;
//! assert!(decompressor.is_active());
//! # Ok(())
//! # }
//! ```
//!
//! A corrupt compressed stream surfaces as an [`std::io::Error`] from
//! [`InboundDecompressor::feed`]; the session treats that as fatal for the
//! connection, since a zlib stream cannot be resynchronized once its state
//! is lost.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(clippy::module_name_repetitions)]

use async_compression::tokio::write::ZlibDecoder;
use bytes::{BufMut, BytesMut};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{self, AsyncWrite, AsyncWriteExt};

/// MCCP protocol revision driving the compressed stream.
///
/// Both versions use zlib; the distinction only matters for negotiation and
/// diagnostics.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MccpVersion {
    /// MCCP version 1 (telnet option 85).
    V1,
    /// MCCP version 2 (telnet option 86).
    V2,
}

impl std::fmt::Display for MccpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MccpVersion::V1 => write!(f, "MCCPv1"),
            MccpVersion::V2 => write!(f, "MCCPv2"),
        }
    }
}

pin_project! {
    /// An always-ready [`AsyncWrite`] that collects written bytes.
    ///
    /// The zlib decoder wants an `AsyncWrite` to inflate into; this sink
    /// never returns `Pending`, so driving the decoder completes in a single
    /// poll and the inflated bytes can be drained afterwards.
    struct ByteSink {
        buffer: BytesMut,
    }
}

impl ByteSink {
    fn new() -> Self {
        ByteSink {
            buffer: BytesMut::new(),
        }
    }
}

impl AsyncWrite for ByteSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        self.project().buffer.put_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

enum State {
    Passthrough,
    Inflating {
        version: MccpVersion,
        decoder: Box<ZlibDecoder<ByteSink>>,
    },
}

/// Inflate layer for the server-to-client half of a MUD connection.
///
/// Starts in passthrough. Once [`InboundDecompressor::begin`] is called,
/// every subsequent chunk fed in is treated as part of one continuous zlib
/// stream and the inflated bytes are returned instead.
pub struct InboundDecompressor {
    state: State,
}

impl InboundDecompressor {
    /// Creates a decompressor in passthrough mode.
    pub fn new() -> Self {
        InboundDecompressor {
            state: State::Passthrough,
        }
    }

    /// Whether inbound bytes are currently being inflated.
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Inflating { .. })
    }

    /// The MCCP version that activated compression, while active.
    pub fn version(&self) -> Option<MccpVersion> {
        match self.state {
            State::Passthrough => None,
            State::Inflating { version, .. } => Some(version),
        }
    }

    /// Switches from passthrough to inflating.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::AlreadyExists`] when compression is already
    /// active; a second activation mid-stream means the negotiation state
    /// and the byte stream have come apart.
    pub fn begin(&mut self, version: MccpVersion) -> io::Result<()> {
        if let State::Inflating { version: active, .. } = self.state {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("compression already active ({active})"),
            ));
        }
        self.state = State::Inflating {
            version,
            decoder: Box::new(ZlibDecoder::new(ByteSink::new())),
        };
        Ok(())
    }

    /// Returns to passthrough, discarding any partial inflate state.
    /// Idempotent.
    pub fn reset(&mut self) {
        self.state = State::Passthrough;
    }

    /// Runs one inbound chunk through the layer.
    ///
    /// In passthrough mode the chunk comes back unchanged. While inflating,
    /// the chunk is appended to the zlib stream and whatever inflated bytes
    /// it completes are returned; a chunk ending mid-block yields fewer (or
    /// zero) bytes and the remainder arrives with the next call.
    ///
    /// # Errors
    ///
    /// Any zlib error (corrupt or irrecoverably truncated stream) is
    /// returned as an [`io::Error`] and the layer should be considered
    /// unusable until [`InboundDecompressor::reset`].
    pub async fn feed(&mut self, chunk: &[u8]) -> io::Result<BytesMut> {
        match &mut self.state {
            State::Passthrough => Ok(BytesMut::from(chunk)),
            State::Inflating { decoder, .. } => {
                decoder.write_all(chunk).await?;
                decoder.flush().await?;
                Ok(decoder.get_mut().buffer.split())
            }
        }
    }
}

impl Default for InboundDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InboundDecompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundDecompressor")
            .field("version", &self.version())
            .finish()
    }
}
