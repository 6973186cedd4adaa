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

//! The telnet scanning engine.
//!
//! [`TelnetEngine::process`] consumes raw inbound bytes, strips and answers
//! every IAC-framed command, and returns the remaining visible text. The
//! scanner is resumable: a command split across socket reads is held in
//! engine state and completed by the next call.

use crate::consts;
use crate::event::{EngineAction, TelnetVerb};
use crate::handlers::charset::{CharsetHandler, CharsetPolicy};
use crate::handlers::compress::CompressHandler;
use crate::handlers::echo::EchoHandler;
use crate::handlers::msp::MspHandler;
use crate::handlers::zmp::ZmpHandler;
use crate::handlers::{EngineOutput, LineDisposition, OptionHandler};
use crate::options::{OptionTable, TelnetOption};
use crate::result::EngineResult;
use bytes::{BufMut, BytesMut};
use tracing::{debug, trace, warn};

/// Where the scanner is within the telnet grammar.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ScanState {
    /// Passing plain bytes through.
    Text,
    /// An IAC was read; the command byte is next.
    Command,
    /// A negotiation verb was read; the option byte is next.
    Negotiate(TelnetVerb),
    /// `IAC SB` was read; the option byte is next.
    SubnegotiateOption,
    /// Accumulating subnegotiation payload for an option.
    Subnegotiate(u8),
    /// An IAC was read inside a subnegotiation payload.
    SubnegotiateCommand(u8),
    /// A bare WILL was read inside the MCCPv1 payload; servers terminate
    /// that activation with SE alone, omitting the IAC.
    SubnegotiateMccp1,
}

///
/// Result of one [`TelnetEngine::process`] call.
///
#[derive(Debug, Default)]
pub struct ProcessResult {
    /// De-escaped plain text for the display pipeline.
    pub visible_text: BytesMut,
    /// Bytes that must be transmitted back to the server.
    pub replies: BytesMut,
    /// State changes for the owning session to act on.
    pub actions: Vec<EngineAction>,
    /// How many input bytes were consumed. Short of the input length only
    /// when compression started mid-buffer; the remainder belongs to the
    /// compressed stream and must be inflated before being fed back in.
    pub consumed: usize,
}

///
/// Result of scanning one completed line through the enabled handlers.
///
#[derive(Debug, Default)]
pub struct LineScanResult {
    /// Whether any handler claimed the line for itself.
    pub gag: bool,
    /// Bytes that must be transmitted back to the server.
    pub replies: BytesMut,
    /// State changes for the owning session to act on.
    pub actions: Vec<EngineAction>,
}

/// Escapes literal `0xFF` bytes for transmission inside a telnet stream.
pub fn escape_iac(input: &[u8]) -> BytesMut {
    let mut escaped = BytesMut::with_capacity(input.len() + 2);
    for byte in input {
        if *byte == consts::IAC {
            escaped.put_u8(consts::IAC);
        }
        escaped.put_u8(*byte);
    }
    escaped
}

///
/// Telnet option negotiation and stream scanning for one connection.
///
/// The engine owns the per-option negotiation table and the registered
/// option handlers. It never touches a socket: inbound bytes come in through
/// [`TelnetEngine::process`], and everything that must reach the server is
/// returned as reply bytes for the caller to transmit.
///
pub struct TelnetEngine {
    state: ScanState,
    options: OptionTable,
    handlers: [Option<Box<dyn OptionHandler>>; 256],
    subneg_buffer: BytesMut,
}

impl TelnetEngine {
    /// Creates an engine with no handlers registered.
    ///
    /// Negotiation still follows the support table; subnegotiations for
    /// enabled options without a handler are discarded.
    pub fn new() -> Self {
        TelnetEngine {
            state: ScanState::Text,
            options: OptionTable::new(),
            handlers: std::array::from_fn(|_| None),
            subneg_buffer: BytesMut::new(),
        }
    }

    /// Creates an engine with the full MUD handler set: echo tracking, both
    /// MCCP versions, MSP triggers, ZMP, and charset negotiation driven by
    /// the given acceptance policy.
    pub fn with_mud_handlers(charset_policy: CharsetPolicy) -> Self {
        let mut engine = Self::new();
        engine.register_handler(Box::new(EchoHandler));
        engine.register_handler(Box::new(CompressHandler::v1()));
        engine.register_handler(Box::new(CompressHandler::v2()));
        engine.register_handler(Box::new(MspHandler));
        engine.register_handler(Box::new(ZmpHandler::new(
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
        )));
        engine.register_handler(Box::new(CharsetHandler::new(charset_policy)));
        engine
    }

    /// Registers a handler for its option, replacing any previous one.
    pub fn register_handler(&mut self, handler: Box<dyn OptionHandler>) {
        let code = handler.option().to_u8() as usize;
        self.handlers[code] = Some(handler);
    }

    /// Current negotiation verdict for an option.
    pub fn is_enabled(&self, option: TelnetOption) -> bool {
        self.options.is_enabled(option)
    }

    /// Forgets all negotiation and scanning state, as for a new connection.
    pub fn reset(&mut self) {
        self.state = ScanState::Text;
        self.subneg_buffer.clear();
        self.options.reset();
        // Handler state dies with the connection; the teardown output has
        // nowhere to go.
        let mut discard = EngineOutput::new();
        for handler in self.handlers.iter_mut().flatten() {
            handler.disable(&mut discard);
        }
    }

    /// Scans inbound bytes, stripping telnet commands and collecting the
    /// replies and actions they produce.
    pub fn process(&mut self, input: &[u8]) -> ProcessResult {
        let mut visible = BytesMut::with_capacity(input.len());
        let mut output = EngineOutput::new();
        let mut offset = 0;

        while offset < input.len() {
            let byte = input[offset];
            let mut advance = true;

            self.state = match (self.state, byte) {
                // ------------------------------------------------------------
                // Plain text
                // ------------------------------------------------------------
                (ScanState::Text, consts::IAC) => ScanState::Command,
                (ScanState::Text, byte) => {
                    visible.put_u8(byte);
                    ScanState::Text
                }

                // ------------------------------------------------------------
                // IAC <command>
                // ------------------------------------------------------------
                (ScanState::Command, consts::IAC) => {
                    // Escaped literal 0xFF.
                    visible.put_u8(consts::IAC);
                    ScanState::Text
                }
                (ScanState::Command, consts::WILL) => ScanState::Negotiate(TelnetVerb::Will),
                (ScanState::Command, consts::WONT) => ScanState::Negotiate(TelnetVerb::Wont),
                (ScanState::Command, consts::DO) => ScanState::Negotiate(TelnetVerb::Do),
                (ScanState::Command, consts::DONT) => ScanState::Negotiate(TelnetVerb::Dont),
                (ScanState::Command, consts::SB) => ScanState::SubnegotiateOption,
                (ScanState::Command, command @ consts::EOR..=consts::GA) => {
                    trace!("consumed single-byte command {}", command);
                    ScanState::Text
                }
                (ScanState::Command, unexpected) => {
                    warn!(
                        "unexpected byte {} after IAC, dropping the IAC",
                        unexpected
                    );
                    advance = false;
                    ScanState::Text
                }

                // ------------------------------------------------------------
                // IAC WILL/WONT/DO/DONT <option>
                // ------------------------------------------------------------
                (ScanState::Negotiate(verb), option) => {
                    self.negotiate(verb, TelnetOption::from_u8(option), &mut output);
                    ScanState::Text
                }

                // ------------------------------------------------------------
                // IAC SB <option> <payload> IAC SE
                // ------------------------------------------------------------
                (ScanState::SubnegotiateOption, option) => {
                    self.subneg_buffer.clear();
                    ScanState::Subnegotiate(option)
                }
                (ScanState::Subnegotiate(consts::option::COMPRESS1), consts::WILL) => {
                    ScanState::SubnegotiateMccp1
                }
                (ScanState::Subnegotiate(option), consts::IAC) => {
                    ScanState::SubnegotiateCommand(option)
                }
                (ScanState::Subnegotiate(option), byte) => {
                    self.subneg_buffer.put_u8(byte);
                    ScanState::Subnegotiate(option)
                }
                (ScanState::SubnegotiateCommand(option), consts::SE) => {
                    self.dispatch_subnegotiation(option, &mut output);
                    ScanState::Text
                }
                (ScanState::SubnegotiateCommand(option), consts::IAC) => {
                    // Escaped literal 0xFF inside the payload.
                    self.subneg_buffer.put_u8(consts::IAC);
                    ScanState::Subnegotiate(option)
                }
                (ScanState::SubnegotiateCommand(option), unexpected) => {
                    warn!(
                        "unexpected byte {} inside subnegotiation for option {}, \
                         discarding the payload",
                        unexpected, option
                    );
                    self.subneg_buffer.clear();
                    advance = false;
                    ScanState::Text
                }
                (ScanState::SubnegotiateMccp1, consts::SE) => {
                    self.subneg_buffer.put_u8(consts::WILL);
                    self.dispatch_subnegotiation(consts::option::COMPRESS1, &mut output);
                    ScanState::Text
                }
                (ScanState::SubnegotiateMccp1, _) => {
                    // Not the v1 activation after all; the WILL was payload.
                    self.subneg_buffer.put_u8(consts::WILL);
                    advance = false;
                    ScanState::Subnegotiate(consts::option::COMPRESS1)
                }
            };

            if advance {
                offset += 1;
            }
            if output.halt {
                // Everything past this point is zlib data for the caller's
                // decompressor.
                break;
            }
        }

        ProcessResult {
            visible_text: visible,
            replies: output.replies,
            actions: output.actions,
            consumed: offset,
        }
    }

    /// Runs one completed line of visible text past the enabled handlers.
    pub fn scan_line(&mut self, line: &[u8]) -> LineScanResult {
        let mut output = EngineOutput::new();
        let mut gag = false;
        for handler in self.handlers.iter_mut().flatten() {
            if !self.options.is_enabled(handler.option()) {
                continue;
            }
            if handler.scan_line(line, &mut output) == LineDisposition::Gag {
                gag = true;
            }
        }
        LineScanResult {
            gag,
            replies: output.replies,
            actions: output.actions,
        }
    }

    /// Asks the server to begin performing an option, returning the bytes to
    /// transmit. Empty when the request is already settled or outstanding.
    ///
    /// # Errors
    ///
    /// [`EngineError`](crate::EngineError) when the option is not supported
    /// on the remote side.
    pub fn request_enable(&mut self, option: TelnetOption) -> EngineResult<BytesMut> {
        let mut output = EngineOutput::new();
        if let Some((verb, option)) = self.options.request_enable_remote(option)? {
            output.send_negotiation(verb, option);
        }
        Ok(output.replies)
    }

    /// Asks the server to stop performing an option, returning the bytes to
    /// transmit. Empty when the option was never up.
    pub fn request_disable(&mut self, option: TelnetOption) -> BytesMut {
        let mut output = EngineOutput::new();
        if let Some((verb, option)) = self.options.request_disable_remote(option) {
            output.send_negotiation(verb, option);
        }
        output.replies
    }

    /// Frames a ZMP command for transmission, or `None` while the option is
    /// not negotiated.
    pub fn zmp_command(&self, parts: &[&str]) -> Option<BytesMut> {
        if !self.options.is_enabled(TelnetOption::ZMP) {
            return None;
        }
        let payload = crate::handlers::zmp::encode_command(parts);
        let mut output = EngineOutput::new();
        output.send_subnegotiation(TelnetOption::ZMP, &payload);
        Some(output.replies)
    }

    fn negotiate(&mut self, verb: TelnetVerb, option: TelnetOption, output: &mut EngineOutput) {
        let outcome = self.options.receive(verb, option);
        if let Some((reply_verb, reply_option)) = outcome.reply {
            output.send_negotiation(reply_verb, reply_option);
        }
        match outcome.status_change {
            Some(true) => {
                output.push_action(EngineAction::OptionStatus(option, true));
                if let Some(handler) = self.handlers[option.to_u8() as usize].as_mut() {
                    handler.enable(output);
                }
            }
            Some(false) => {
                output.push_action(EngineAction::OptionStatus(option, false));
                if let Some(handler) = self.handlers[option.to_u8() as usize].as_mut() {
                    handler.disable(output);
                }
            }
            None => {}
        }
    }

    fn dispatch_subnegotiation(&mut self, option_byte: u8, output: &mut EngineOutput) {
        let option = TelnetOption::from_u8(option_byte);
        let payload = self.subneg_buffer.split();
        if !self.options.is_enabled(option) {
            debug!("discarding subnegotiation for unnegotiated option {}", option);
            return;
        }
        match self.handlers[option_byte as usize].as_mut() {
            Some(handler) => {
                if let Err(error) = handler.handle_subnegotiation(&payload, output) {
                    warn!("subnegotiation for {} failed: {}", option, error);
                }
            }
            None => {
                debug!("no handler for option {}, payload discarded", option);
            }
        }
    }
}

impl Default for TelnetEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TelnetEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelnetEngine")
            .field("state", &self.state)
            .field("pending_subnegotiation", &self.subneg_buffer.len())
            .finish()
    }
}
