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

//! # Mudlink Telnet Engine
//!
//! This crate implements the telnet layer of a MUD client: a resumable,
//! byte-oriented scanner that strips IAC-framed commands out of the inbound
//! stream, answers option negotiation, and dispatches subnegotiations to
//! per-option handlers for the extensions MUD servers actually use.
//!
//! ## Overview
//!
//! The Telnet protocol (RFC 854) layers a command channel over a raw TCP
//! text stream by reserving the byte 0xFF (IAC, Interpret As Command). This
//! engine handles:
//!
//! - **Data transmission**: plain bytes pass straight through, with
//!   `IAC IAC` de-escaped to one literal 0xFF on input and [`escape_iac`]
//!   doubling 0xFF on output
//! - **Option negotiation**: WILL/WONT/DO/DONT handshakes tracked per option
//!   with loop-free replies
//! - **Subnegotiation**: `IAC SB <option> <data...> IAC SE` payloads
//!   reassembled across reads and handed to the registered handler
//!
//! ## Core Components
//!
//! ### [`TelnetEngine`]
//!
//! The per-connection state machine. [`TelnetEngine::process`] takes an
//! inbound byte chunk and returns a [`ProcessResult`]: the visible text for
//! the display pipeline, reply bytes for the server, [`EngineAction`]s for
//! the owning session, and the count of consumed bytes. The engine never
//! owns a socket, so it drops into any transport the embedding application
//! uses.
//!
//! A telnet sequence split across two socket reads is held in engine state
//! and completed by the next call; malformed sequences are recovered from
//! permissively by dropping the IAC and rescanning the offending byte as
//! text.
//!
//! ### [`OptionHandler`]
//!
//! The capability contract for one telnet option. The MUD handler set
//! installed by [`TelnetEngine::with_mud_handlers`] covers:
//!
//! - **Echo** (RFC 857): toggles local echo for password prompts
//! - **MCCP v1/v2**: zlib stream compression activation, including the
//!   bare `WILL SE` framing quirk of version 1
//! - **MSP**: sound trigger lines, gagging and download queueing
//! - **ZMP**: NUL-delimited out-of-band commands with the `zmp.` core
//!   package
//! - **Charset** (RFC 2066): server-driven session encoding selection
//!
//! ### Compression handoff
//!
//! Once an MCCP activation is scanned, every following byte belongs to a
//! zlib stream. The engine stops consuming mid-buffer, reports how far it
//! got through [`ProcessResult::consumed`], and the caller inflates the
//! remainder before feeding it back in.
//!
//! ## Usage Example
//!
//! ```rust
//! use mudlink_telnetcodec::{TelnetEngine, TelnetOption};
//!
//! let mut engine = TelnetEngine::with_mud_handlers(Box::new(|name| name == "UTF-8"));
//!
//! // Server offers MCCP2 and sends a banner.
//! let mut input = vec![0xFF, 0xFB, 86];
//! input.extend_from_slice(b"Welcome to Midgaard\r\n");
//!
//! let result = engine.process(&input);
//! assert_eq!(&result.visible_text[..], b"Welcome to Midgaard\r\n");
//! assert_eq!(&result.replies[..], &[0xFF, 0xFD, 86]); // IAC DO COMPRESS2
//! assert!(engine.is_enabled(TelnetOption::Compress2));
//! ```
//!
//! ## Error Handling
//!
//! Wire-level anomalies never abort the stream: the scanner resynchronizes
//! and keeps going. [`EngineError`] is returned where the caller asked for
//! something impossible (negotiating an unsupported option) and logged via
//! `tracing` when a subnegotiation payload fails to parse.
//!
//! ## Related RFCs
//!
//! - RFC 854: Telnet Protocol Specification
//! - RFC 855: Telnet Option Specifications
//! - RFC 857: Telnet Echo Option
//! - RFC 2066: Telnet Charset Option

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

pub mod consts;
mod engine;
mod event;
mod handlers;
mod options;
mod result;

pub use self::engine::{LineScanResult, ProcessResult, TelnetEngine, escape_iac};
pub use self::event::{CompressionVersion, EngineAction, TelnetVerb};
pub use self::handlers::charset::{CharsetHandler, CharsetPolicy};
pub use self::handlers::compress::CompressHandler;
pub use self::handlers::echo::EchoHandler;
pub use self::handlers::msp::MspHandler;
pub use self::handlers::zmp::ZmpHandler;
pub use self::handlers::{EngineOutput, LineDisposition, NoOpHandler, OptionHandler};
pub use self::options::{NegotiationState, OptionTable, TelnetOption};
pub use self::result::{EngineError, EngineResult, SubnegotiationErrorKind};
