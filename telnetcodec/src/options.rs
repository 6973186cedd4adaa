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

use crate::event::TelnetVerb;
use crate::{EngineError, EngineResult, consts};
use tracing::debug;

///
/// Telnet options a MUD client encounters in practice, from the
/// [IANA registry](https://www.iana.org/assignments/telnet-options/telnet-options.xhtml)
/// plus the unregistered MUD extension numbers.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TelnetOption {
    /// [`consts::option::BINARY`] Binary Transmission [RFC856](https://tools.ietf.org/html/rfc856)
    TransmitBinary,
    /// [`consts::option::ECHO`] Echo [RFC857](https://tools.ietf.org/html/rfc857)
    Echo,
    /// [`consts::option::SGA`] Suppress Go Ahead [RFC858](https://tools.ietf.org/html/rfc858)
    SuppressGoAhead,
    /// [`consts::option::STATUS`] Status [RFC859](https://tools.ietf.org/html/rfc859)
    Status,
    /// [`consts::option::TM`] Timing Mark [RFC860](https://tools.ietf.org/html/rfc860)
    TimingMark,
    /// [`consts::option::TTYPE`] Terminal Type [RFC1091](https://tools.ietf.org/html/rfc1091)
    TerminalType,
    /// [`consts::option::EOR`] End of Record [RFC885](https://tools.ietf.org/html/rfc885)
    EndOfRecord,
    /// [`consts::option::NAWS`] Negotiate About Window Size [RFC1073](https://tools.ietf.org/html/rfc1073)
    WindowSize,
    /// [`consts::option::TSPEED`] Terminal Speed [RFC1079](https://tools.ietf.org/html/rfc1079)
    TerminalSpeed,
    /// [`consts::option::LFLOW`] Remote Flow Control [RFC1372](https://tools.ietf.org/html/rfc1372)
    FlowControl,
    /// [`consts::option::LINEMODE`] Linemode [RFC1184](https://tools.ietf.org/html/rfc1184)
    Linemode,
    /// [`consts::option::NEW_ENVIRONMENT`] New Environment [RFC1572](https://tools.ietf.org/html/rfc1572)
    NewEnvironment,
    /// [`consts::option::CHARSET`] Charset [RFC2066](https://tools.ietf.org/html/rfc2066)
    Charset,
    /// [`consts::option::MSDP`] Mud Server Data Protocol [MSDP](https://tintin.sourceforge.io/protocols/msdp/)
    MSDP,
    /// [`consts::option::MSSP`] Mud Server Status Protocol [MSSP](https://tintin.sourceforge.io/protocols/mssp/)
    MSSP,
    /// [`consts::option::COMPRESS1`] Mud Client Compression Protocol version 1 [MCCPv1](http://www.gammon.com.au/mccp/protocol.html)
    Compress1,
    /// [`consts::option::COMPRESS2`] Mud Client Compression Protocol version 2 [MCCPv2](https://tintin.sourceforge.io/protocols/mccp/)
    Compress2,
    /// [`consts::option::MSP`] Mud Sound Protocol [MSP](https://www.zuggsoft.com/zmud/msp.htm)
    MSP,
    /// [`consts::option::MXP`] Mud eXtension Protocol [MXP](https://www.zuggsoft.com/zmud/mxp.htm)
    MXP,
    /// [`consts::option::ZMP`] Zenith Mud Protocol [ZMP](http://discworld.starturtle.net/external/protocols/zmp.html)
    ZMP,
    /// [`consts::option::GMCP`] Generic Mud Communication Protocol [GMCP](https://www.gammon.com.au/gmcp)
    GMCP,
    /// Any option this client has no name for.
    Unknown(u8),
}

impl TelnetOption {
    /// Converts this option to its wire code.
    pub fn to_u8(&self) -> u8 {
        match self {
            TelnetOption::TransmitBinary => consts::option::BINARY,
            TelnetOption::Echo => consts::option::ECHO,
            TelnetOption::SuppressGoAhead => consts::option::SGA,
            TelnetOption::Status => consts::option::STATUS,
            TelnetOption::TimingMark => consts::option::TM,
            TelnetOption::TerminalType => consts::option::TTYPE,
            TelnetOption::EndOfRecord => consts::option::EOR,
            TelnetOption::WindowSize => consts::option::NAWS,
            TelnetOption::TerminalSpeed => consts::option::TSPEED,
            TelnetOption::FlowControl => consts::option::LFLOW,
            TelnetOption::Linemode => consts::option::LINEMODE,
            TelnetOption::NewEnvironment => consts::option::NEW_ENVIRONMENT,
            TelnetOption::Charset => consts::option::CHARSET,
            TelnetOption::MSDP => consts::option::MSDP,
            TelnetOption::MSSP => consts::option::MSSP,
            TelnetOption::Compress1 => consts::option::COMPRESS1,
            TelnetOption::Compress2 => consts::option::COMPRESS2,
            TelnetOption::MSP => consts::option::MSP,
            TelnetOption::MXP => consts::option::MXP,
            TelnetOption::ZMP => consts::option::ZMP,
            TelnetOption::GMCP => consts::option::GMCP,
            TelnetOption::Unknown(byte) => *byte,
        }
    }

    /// Converts a wire code into the corresponding option, falling back to
    /// [`TelnetOption::Unknown`] for codes this client has no name for.
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            consts::option::BINARY => TelnetOption::TransmitBinary,
            consts::option::ECHO => TelnetOption::Echo,
            consts::option::SGA => TelnetOption::SuppressGoAhead,
            consts::option::STATUS => TelnetOption::Status,
            consts::option::TM => TelnetOption::TimingMark,
            consts::option::TTYPE => TelnetOption::TerminalType,
            consts::option::EOR => TelnetOption::EndOfRecord,
            consts::option::NAWS => TelnetOption::WindowSize,
            consts::option::TSPEED => TelnetOption::TerminalSpeed,
            consts::option::LFLOW => TelnetOption::FlowControl,
            consts::option::LINEMODE => TelnetOption::Linemode,
            consts::option::NEW_ENVIRONMENT => TelnetOption::NewEnvironment,
            consts::option::CHARSET => TelnetOption::Charset,
            consts::option::MSDP => TelnetOption::MSDP,
            consts::option::MSSP => TelnetOption::MSSP,
            consts::option::COMPRESS1 => TelnetOption::Compress1,
            consts::option::COMPRESS2 => TelnetOption::Compress2,
            consts::option::MSP => TelnetOption::MSP,
            consts::option::MXP => TelnetOption::MXP,
            consts::option::ZMP => TelnetOption::ZMP,
            consts::option::GMCP => TelnetOption::GMCP,
            byte => TelnetOption::Unknown(byte),
        }
    }

    /// Whether we are willing to perform this option ourselves
    /// (answer DO with WILL).
    pub fn supported_local(&self) -> bool {
        consts::option::SUPPORT[self.to_u8() as usize].0
    }

    /// Whether we are willing to have the peer perform this option
    /// (answer WILL with DO).
    pub fn supported_remote(&self) -> bool {
        consts::option::SUPPORT[self.to_u8() as usize].1
    }
}

impl std::fmt::Display for TelnetOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelnetOption::TransmitBinary => write!(f, "TransmitBinary"),
            TelnetOption::Echo => write!(f, "Echo"),
            TelnetOption::SuppressGoAhead => write!(f, "SuppressGoAhead"),
            TelnetOption::Status => write!(f, "Status"),
            TelnetOption::TimingMark => write!(f, "TimingMark"),
            TelnetOption::TerminalType => write!(f, "TerminalType"),
            TelnetOption::EndOfRecord => write!(f, "EndOfRecord"),
            TelnetOption::WindowSize => write!(f, "WindowSize"),
            TelnetOption::TerminalSpeed => write!(f, "TerminalSpeed"),
            TelnetOption::FlowControl => write!(f, "FlowControl"),
            TelnetOption::Linemode => write!(f, "Linemode"),
            TelnetOption::NewEnvironment => write!(f, "NewEnvironment"),
            TelnetOption::Charset => write!(f, "Charset"),
            TelnetOption::MSDP => write!(f, "MSDP"),
            TelnetOption::MSSP => write!(f, "MSSP"),
            TelnetOption::Compress1 => write!(f, "Compress1"),
            TelnetOption::Compress2 => write!(f, "Compress2"),
            TelnetOption::MSP => write!(f, "MSP"),
            TelnetOption::MXP => write!(f, "MXP"),
            TelnetOption::ZMP => write!(f, "ZMP"),
            TelnetOption::GMCP => write!(f, "GMCP"),
            TelnetOption::Unknown(option) => write!(f, "Unknown({option})"),
        }
    }
}

impl From<u8> for TelnetOption {
    fn from(byte: u8) -> Self {
        Self::from_u8(byte)
    }
}

impl From<TelnetOption> for u8 {
    fn from(option: TelnetOption) -> Self {
        option.to_u8()
    }
}

///
/// Negotiation state of a single option.
///
/// Every option starts as [`NegotiationState::NotNegotiated`] and moves
/// through the handshake exactly once per connection; a refusal or teardown
/// parks it at [`NegotiationState::Disabled`] until the engine is reset.
///
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NegotiationState {
    /// Neither side has mentioned the option yet.
    #[default]
    NotNegotiated,
    /// We sent DO (or WILL) and are waiting for the peer's answer.
    RequestedByUs,
    /// The peer offered the option and our answer is being decided.
    RequestedByThem,
    /// The handshake completed affirmatively.
    Enabled,
    /// The option was refused or torn down.
    Disabled,
}

/// What an inbound negotiation byte pair resolved to.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct NegotiationOutcome {
    /// Reply to transmit, if the rules call for one.
    pub reply: Option<(TelnetVerb, TelnetOption)>,
    /// `Some(true)` when the option just became enabled, `Some(false)` when
    /// it just became disabled after being enabled, `None` when the
    /// observable status did not change.
    pub status_change: Option<bool>,
}

///
/// Per-option negotiation table.
///
/// Tracks one [`NegotiationState`] per option code and answers inbound
/// WILL/WONT/DO/DONT with loop-free replies: an affirmative is only sent
/// when it changes the option's state, so a repeated offer never produces
/// a second acknowledgment.
///
#[derive(Clone, Debug)]
pub struct OptionTable {
    state: [NegotiationState; 256],
}

impl OptionTable {
    /// Creates a table with every option not negotiated.
    pub fn new() -> Self {
        OptionTable {
            state: [NegotiationState::NotNegotiated; 256],
        }
    }

    /// Current negotiation state for an option.
    pub fn state(&self, option: TelnetOption) -> NegotiationState {
        self.state[option.to_u8() as usize]
    }

    /// Whether the handshake for this option has completed affirmatively.
    pub fn is_enabled(&self, option: TelnetOption) -> bool {
        self.state(option) == NegotiationState::Enabled
    }

    /// Forgets all negotiation, as if the connection were new.
    pub fn reset(&mut self) {
        self.state = [NegotiationState::NotNegotiated; 256];
    }

    /// Asks the peer to start performing an option (sends DO).
    ///
    /// Returns the verb/option pair to transmit, or `None` when the option
    /// is already enabled or a request is already outstanding.
    ///
    /// # Errors
    ///
    /// [`EngineError::NegotiationError`] when the support table forbids the
    /// option on the remote side, since a DO we would immediately contradict
    /// must never reach the wire.
    pub fn request_enable_remote(
        &mut self,
        option: TelnetOption,
    ) -> EngineResult<Option<(TelnetVerb, TelnetOption)>> {
        if !option.supported_remote() {
            return Err(EngineError::NegotiationError {
                option: Some(option.to_u8()),
                reason: "option is not supported on the remote side".into(),
            });
        }
        match self.state(option) {
            NegotiationState::Enabled | NegotiationState::RequestedByUs => Ok(None),
            _ => {
                self.set(option, NegotiationState::RequestedByUs);
                Ok(Some((TelnetVerb::Do, option)))
            }
        }
    }

    /// Asks the peer to stop performing an option (sends DONT).
    ///
    /// Returns `None` when the option is already disabled or was never
    /// negotiated, so repeated teardown requests stay silent.
    pub fn request_disable_remote(
        &mut self,
        option: TelnetOption,
    ) -> Option<(TelnetVerb, TelnetOption)> {
        match self.state(option) {
            NegotiationState::Enabled | NegotiationState::RequestedByUs => {
                self.set(option, NegotiationState::Disabled);
                Some((TelnetVerb::Dont, option))
            }
            _ => None,
        }
    }

    /// Applies an inbound negotiation and computes the loop-free reply.
    pub(crate) fn receive(&mut self, verb: TelnetVerb, option: TelnetOption) -> NegotiationOutcome {
        let outcome = match verb {
            TelnetVerb::Will => self.recv_will(option),
            TelnetVerb::Wont => self.recv_wont(option),
            TelnetVerb::Do => self.recv_do(option),
            TelnetVerb::Dont => self.recv_dont(option),
        };
        debug!(
            "negotiation: recv {} {} -> {:?}, reply {:?}",
            verb,
            option,
            self.state(option),
            outcome.reply
        );
        outcome
    }

    fn set(&mut self, option: TelnetOption, state: NegotiationState) {
        self.state[option.to_u8() as usize] = state;
    }

    /// Peer announces it will perform `option`.
    fn recv_will(&mut self, option: TelnetOption) -> NegotiationOutcome {
        match self.state(option) {
            // Already agreed; a second affirmative would start a loop.
            NegotiationState::Enabled => NegotiationOutcome::default(),
            // Acknowledgment of the DO we sent.
            NegotiationState::RequestedByUs => {
                self.set(option, NegotiationState::Enabled);
                NegotiationOutcome {
                    reply: None,
                    status_change: Some(true),
                }
            }
            _ => {
                self.set(option, NegotiationState::RequestedByThem);
                if option.supported_remote() {
                    self.set(option, NegotiationState::Enabled);
                    NegotiationOutcome {
                        reply: Some((TelnetVerb::Do, option)),
                        status_change: Some(true),
                    }
                } else {
                    self.set(option, NegotiationState::Disabled);
                    NegotiationOutcome {
                        reply: Some((TelnetVerb::Dont, option)),
                        status_change: None,
                    }
                }
            }
        }
    }

    /// Peer refuses or tears down an option it performs.
    fn recv_wont(&mut self, option: TelnetOption) -> NegotiationOutcome {
        match self.state(option) {
            NegotiationState::Enabled => {
                self.set(option, NegotiationState::Disabled);
                NegotiationOutcome {
                    reply: Some((TelnetVerb::Dont, option)),
                    status_change: Some(false),
                }
            }
            // Answer to our DO; the WONT itself is the whole exchange.
            NegotiationState::RequestedByUs => {
                self.set(option, NegotiationState::Disabled);
                NegotiationOutcome::default()
            }
            _ => {
                self.set(option, NegotiationState::Disabled);
                NegotiationOutcome::default()
            }
        }
    }

    /// Peer asks us to perform `option`.
    fn recv_do(&mut self, option: TelnetOption) -> NegotiationOutcome {
        match self.state(option) {
            NegotiationState::Enabled => NegotiationOutcome::default(),
            // Acknowledgment of the WILL we sent.
            NegotiationState::RequestedByUs => {
                self.set(option, NegotiationState::Enabled);
                NegotiationOutcome {
                    reply: None,
                    status_change: Some(true),
                }
            }
            _ => {
                self.set(option, NegotiationState::RequestedByThem);
                if option.supported_local() {
                    self.set(option, NegotiationState::Enabled);
                    NegotiationOutcome {
                        reply: Some((TelnetVerb::Will, option)),
                        status_change: Some(true),
                    }
                } else {
                    self.set(option, NegotiationState::Disabled);
                    NegotiationOutcome {
                        reply: Some((TelnetVerb::Wont, option)),
                        status_change: None,
                    }
                }
            }
        }
    }

    /// Peer demands we stop performing an option.
    fn recv_dont(&mut self, option: TelnetOption) -> NegotiationOutcome {
        match self.state(option) {
            NegotiationState::Enabled => {
                self.set(option, NegotiationState::Disabled);
                NegotiationOutcome {
                    reply: Some((TelnetVerb::Wont, option)),
                    status_change: Some(false),
                }
            }
            NegotiationState::RequestedByUs => {
                self.set(option, NegotiationState::Disabled);
                NegotiationOutcome::default()
            }
            _ => {
                self.set(option, NegotiationState::Disabled);
                NegotiationOutcome::default()
            }
        }
    }
}

impl Default for OptionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Option code mapping
    // ============================================================================

    #[test]
    fn option_round_trips_through_wire_code() {
        for byte in 0..=255u8 {
            assert_eq!(TelnetOption::from_u8(byte).to_u8(), byte);
        }
    }

    #[test]
    fn mud_extension_codes() {
        assert_eq!(TelnetOption::Compress2.to_u8(), 86);
        assert_eq!(TelnetOption::MSP.to_u8(), 90);
        assert_eq!(TelnetOption::ZMP.to_u8(), 93);
        assert_eq!(TelnetOption::Charset.to_u8(), 42);
    }

    // ============================================================================
    // Inbound negotiation
    // ============================================================================

    #[test]
    fn will_for_supported_option_enables_and_replies_do() {
        let mut table = OptionTable::new();
        let outcome = table.receive(TelnetVerb::Will, TelnetOption::Compress2);
        assert_eq!(outcome.reply, Some((TelnetVerb::Do, TelnetOption::Compress2)));
        assert_eq!(outcome.status_change, Some(true));
        assert!(table.is_enabled(TelnetOption::Compress2));
    }

    #[test]
    fn will_for_unsupported_option_replies_dont() {
        let mut table = OptionTable::new();
        let outcome = table.receive(TelnetVerb::Will, TelnetOption::GMCP);
        assert_eq!(outcome.reply, Some((TelnetVerb::Dont, TelnetOption::GMCP)));
        assert_eq!(outcome.status_change, None);
        assert_eq!(table.state(TelnetOption::GMCP), NegotiationState::Disabled);
    }

    #[test]
    fn repeated_will_does_not_reply_twice() {
        let mut table = OptionTable::new();
        let first = table.receive(TelnetVerb::Will, TelnetOption::MSP);
        let second = table.receive(TelnetVerb::Will, TelnetOption::MSP);
        assert!(first.reply.is_some());
        assert_eq!(second.reply, None);
        assert_eq!(second.status_change, None);
        assert!(table.is_enabled(TelnetOption::MSP));
    }

    #[test]
    fn do_for_locally_supported_option_replies_will() {
        let mut table = OptionTable::new();
        let outcome = table.receive(TelnetVerb::Do, TelnetOption::Charset);
        assert_eq!(outcome.reply, Some((TelnetVerb::Will, TelnetOption::Charset)));
        assert!(table.is_enabled(TelnetOption::Charset));
    }

    #[test]
    fn do_for_locally_unsupported_option_replies_wont() {
        let mut table = OptionTable::new();
        let outcome = table.receive(TelnetVerb::Do, TelnetOption::MSP);
        assert_eq!(outcome.reply, Some((TelnetVerb::Wont, TelnetOption::MSP)));
        assert_eq!(table.state(TelnetOption::MSP), NegotiationState::Disabled);
    }

    #[test]
    fn wont_tears_down_enabled_option_with_single_ack() {
        let mut table = OptionTable::new();
        table.receive(TelnetVerb::Will, TelnetOption::ZMP);
        let teardown = table.receive(TelnetVerb::Wont, TelnetOption::ZMP);
        assert_eq!(teardown.reply, Some((TelnetVerb::Dont, TelnetOption::ZMP)));
        assert_eq!(teardown.status_change, Some(false));
        let again = table.receive(TelnetVerb::Wont, TelnetOption::ZMP);
        assert_eq!(again.reply, None);
        assert_eq!(again.status_change, None);
    }

    #[test]
    fn wont_for_never_negotiated_option_is_silent() {
        let mut table = OptionTable::new();
        let outcome = table.receive(TelnetVerb::Wont, TelnetOption::Echo);
        assert_eq!(outcome.reply, None);
        assert_eq!(table.state(TelnetOption::Echo), NegotiationState::Disabled);
    }

    // ============================================================================
    // Outgoing requests
    // ============================================================================

    #[test]
    fn request_enable_remote_sends_do_once() {
        let mut table = OptionTable::new();
        let first = table.request_enable_remote(TelnetOption::Compress2).unwrap();
        assert_eq!(first, Some((TelnetVerb::Do, TelnetOption::Compress2)));
        assert_eq!(
            table.state(TelnetOption::Compress2),
            NegotiationState::RequestedByUs
        );
        let second = table.request_enable_remote(TelnetOption::Compress2).unwrap();
        assert_eq!(second, None);
    }

    #[test]
    fn request_enable_remote_rejects_unsupported_option() {
        let mut table = OptionTable::new();
        let result = table.request_enable_remote(TelnetOption::GMCP);
        assert!(result.is_err());
    }

    #[test]
    fn will_after_our_do_completes_without_reply() {
        let mut table = OptionTable::new();
        table.request_enable_remote(TelnetOption::Compress2).unwrap();
        let outcome = table.receive(TelnetVerb::Will, TelnetOption::Compress2);
        assert_eq!(outcome.reply, None);
        assert_eq!(outcome.status_change, Some(true));
        assert!(table.is_enabled(TelnetOption::Compress2));
    }

    #[test]
    fn wont_after_our_do_records_refusal() {
        let mut table = OptionTable::new();
        table.request_enable_remote(TelnetOption::MSP).unwrap();
        let outcome = table.receive(TelnetVerb::Wont, TelnetOption::MSP);
        assert_eq!(outcome.reply, None);
        assert_eq!(outcome.status_change, None);
        assert_eq!(table.state(TelnetOption::MSP), NegotiationState::Disabled);
    }

    #[test]
    fn reset_returns_every_option_to_not_negotiated() {
        let mut table = OptionTable::new();
        table.receive(TelnetVerb::Will, TelnetOption::Compress2);
        table.receive(TelnetVerb::Do, TelnetOption::Charset);
        table.reset();
        assert_eq!(
            table.state(TelnetOption::Compress2),
            NegotiationState::NotNegotiated
        );
        assert_eq!(
            table.state(TelnetOption::Charset),
            NegotiationState::NotNegotiated
        );
    }
}
