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

//! # Mudlink Client
//!
//! Asynchronous MUD client core: connection lifecycle, telnet negotiation
//! with the common MUD extensions, line-oriented display buffering, input
//! history, and background media downloads, all driven from one event
//! loop.
//!
//! ## Architecture
//!
//! - [`ByteConnection`] owns the socket (optionally dialed through a
//!   SOCKS4/SOCKS5 proxy) on a spawned I/O task and moves raw bytes
//! - The telnet engine (from `mudlink-telnetcodec`) strips and answers
//!   protocol traffic: option negotiation, MCCP, MSP, ZMP, Charset, Echo
//! - [`LineBuffer`] turns the stripped text into completed lines and
//!   prompt partials
//! - [`ConnectionSession`] wires it all together and reports
//!   [`SessionEvent`]s
//!
//! ## Quick Start
//!
//! ```no_run
//! use mudlink_client::{ConnectionSession, SessionConfig, SessionHandler};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl SessionHandler for Printer {
//!     async fn on_line(&self, line: &str, gagged: bool) {
//!         if !gagged {
//!             println!("{}", line);
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new("mud.example.com", 4000)
//!         .with_connect_string("guest");
//!     let mut session = ConnectionSession::new(config, Arc::new(Printer))?;
//!     session.connect()?;
//!     while let Some(_event) = session.next_event().await {
//!         // Events were already dispatched to the handler.
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Sending Input
//!
//! ```no_run
//! # use mudlink_client::{ConnectionSession, SessionError};
//! # fn example(session: &mut ConnectionSession) -> Result<(), SessionError> {
//! // One line may carry several commands: "open door; north" sends two.
//! session.send_line("open door; north")?;
//! # Ok(())
//! # }
//! ```

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

mod config;
mod connection;
mod download;
mod encoding;
mod error;
mod handler;
mod history;
mod linebuffer;
mod proxy;
mod session;

pub use config::SessionConfig;
pub use connection::{ByteConnection, ConnectionEvent, ConnectionState, DisconnectReason};
pub use download::{DownloadEvent, DownloadItem, DownloadQueue, DownloadTransport, HttpTransport};
pub use encoding::SessionEncoding;
pub use error::{Result, SessionError};
pub use handler::{LogSink, NullHandler, SessionHandler};
pub use history::{Direction, InputHistory};
pub use linebuffer::{BufferedLine, LineBuffer, LineBufferBatch, LineEnding, PartialLine};
pub use proxy::{ProxyKind, ProxySpec};
pub use session::{ConnectionSession, SessionEvent};

// Re-export the protocol types that appear in this crate's public API.
pub use mudlink_telnetcodec::{NegotiationState, TelnetOption};
