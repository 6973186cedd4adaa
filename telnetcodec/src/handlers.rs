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

use crate::event::{EngineAction, TelnetVerb};
use crate::options::TelnetOption;
use crate::{EngineResult, consts};
use bytes::{BufMut, BytesMut};

/// Charset (RFC 2066) negotiation handler.
pub mod charset;
/// MCCP compression activation handlers.
pub mod compress;
/// Server-side echo tracking for password suppression.
pub mod echo;
/// MSP sound and download trigger scanning.
pub mod msp;
/// ZMP out-of-band command handler.
pub mod zmp;

///
/// Accumulates everything a handler wants to happen as a consequence of one
/// engine step: bytes to transmit back to the server and actions for the
/// owning session.
///
/// Handlers never touch the socket. They write wire replies here and the
/// engine surfaces them through [`ProcessResult`](crate::ProcessResult).
///
#[derive(Debug, Default)]
pub struct EngineOutput {
    pub(crate) replies: BytesMut,
    pub(crate) actions: Vec<EngineAction>,
    pub(crate) halt: bool,
}

impl EngineOutput {
    /// Creates an empty output accumulator.
    pub fn new() -> Self {
        EngineOutput {
            replies: BytesMut::new(),
            actions: Vec::new(),
            halt: false,
        }
    }

    /// Queues `IAC <verb> <option>` for transmission.
    pub fn send_negotiation(&mut self, verb: TelnetVerb, option: TelnetOption) {
        self.replies.put_u8(consts::IAC);
        self.replies.put_u8(verb.to_u8());
        self.replies.put_u8(option.to_u8());
    }

    /// Queues `IAC SB <option> <payload> IAC SE` for transmission, escaping
    /// any literal `0xFF` bytes inside the payload.
    pub fn send_subnegotiation(&mut self, option: TelnetOption, payload: &[u8]) {
        self.replies.put_u8(consts::IAC);
        self.replies.put_u8(consts::SB);
        self.replies.put_u8(option.to_u8());
        for byte in payload {
            if *byte == consts::IAC {
                self.replies.put_u8(consts::IAC);
            }
            self.replies.put_u8(*byte);
        }
        self.replies.put_u8(consts::IAC);
        self.replies.put_u8(consts::SE);
    }

    /// Records an action for the owning session.
    ///
    /// [`EngineAction::StartCompression`] additionally marks the engine
    /// output as halting: every byte after the activation sequence belongs
    /// to the compressed stream and must not be scanned as telnet.
    pub fn push_action(&mut self, action: EngineAction) {
        if matches!(action, EngineAction::StartCompression(_)) {
            self.halt = true;
        }
        self.actions.push(action);
    }
}

/// Verdict of a handler's completed-line scan.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineDisposition {
    /// The line is ordinary text and should reach the display.
    Show,
    /// The line was consumed by the handler and must be suppressed.
    Gag,
}

///
/// Capability contract for a single telnet option.
///
/// The engine owns one handler per option code it cares about and calls in
/// on the option's lifecycle. All methods other than [`OptionHandler::option`]
/// have empty defaults so a handler only implements the hooks it needs.
///
pub trait OptionHandler: Send {
    /// Option code this handler is registered for.
    fn option(&self) -> TelnetOption;

    /// Called when negotiation for the option completes affirmatively.
    fn enable(&mut self, _output: &mut EngineOutput) {}

    /// Called when the option is refused or torn down. Must be idempotent
    /// and reset all handler state.
    fn disable(&mut self, _output: &mut EngineOutput) {}

    /// Called with the full subnegotiation payload, IAC de-escaped, once
    /// `IAC SB <option> ... IAC SE` has been completely received.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`](crate::EngineError) when the payload does
    /// not parse; the engine logs it and the stream continues.
    fn handle_subnegotiation(
        &mut self,
        _payload: &[u8],
        _output: &mut EngineOutput,
    ) -> EngineResult<()> {
        Ok(())
    }

    /// Called with each completed line of visible text while the option is
    /// enabled, before the line reaches the display.
    fn scan_line(&mut self, _line: &[u8], _output: &mut EngineOutput) -> LineDisposition {
        LineDisposition::Show
    }
}

///
/// Handler that accepts an option's negotiation but ignores everything the
/// peer sends for it.
///
pub struct NoOpHandler {
    option: TelnetOption,
}

impl NoOpHandler {
    /// Creates a no-op handler for the given option.
    pub fn new(option: TelnetOption) -> Self {
        NoOpHandler { option }
    }
}

impl OptionHandler for NoOpHandler {
    fn option(&self) -> TelnetOption {
        self.option
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CompressionVersion;

    // ============================================================================
    // EngineOutput wire framing
    // ============================================================================

    #[test]
    fn negotiation_reply_is_three_bytes() {
        let mut output = EngineOutput::new();
        output.send_negotiation(TelnetVerb::Do, TelnetOption::Compress2);
        assert_eq!(
            &output.replies[..],
            &[consts::IAC, consts::DO, consts::option::COMPRESS2]
        );
    }

    #[test]
    fn subnegotiation_payload_is_framed_and_escaped() {
        let mut output = EngineOutput::new();
        output.send_subnegotiation(TelnetOption::Charset, &[0x02, 0xFF, 0x55]);
        assert_eq!(
            &output.replies[..],
            &[
                consts::IAC,
                consts::SB,
                consts::option::CHARSET,
                0x02,
                0xFF,
                0xFF,
                0x55,
                consts::IAC,
                consts::SE
            ]
        );
    }

    #[test]
    fn start_compression_marks_output_halted() {
        let mut output = EngineOutput::new();
        assert!(!output.halt);
        output.push_action(EngineAction::SetLocalEcho(false));
        assert!(!output.halt);
        output.push_action(EngineAction::StartCompression(CompressionVersion::V2));
        assert!(output.halt);
    }

    // ============================================================================
    // NoOpHandler
    // ============================================================================

    #[test]
    fn noop_handler_accepts_everything_silently() {
        let mut handler = NoOpHandler::new(TelnetOption::SuppressGoAhead);
        let mut output = EngineOutput::new();
        handler.enable(&mut output);
        handler
            .handle_subnegotiation(&[1, 2, 3], &mut output)
            .unwrap();
        let disposition = handler.scan_line(b"ordinary text", &mut output);
        handler.disable(&mut output);
        assert!(output.replies.is_empty());
        assert!(output.actions.is_empty());
        assert_eq!(disposition, LineDisposition::Show);
    }
}
