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

//! Wire-level constants for the Telnet protocol and the MUD extensions
//! handled by this crate.

/// End of Record command (used with the EOR option). `0xEF`
pub const EOR: u8 = 239;
/// End of subnegotiation parameters. `0xF0`
pub const SE: u8 = 240;
/// No operation. `0xF1`
pub const NOP: u8 = 241;
/// Data Mark: the data stream portion of a Synch. `0xF2`
pub const DM: u8 = 242;
/// Break key. `0xF3`
pub const BRK: u8 = 243;
/// Interrupt Process. `0xF4`
pub const IP: u8 = 244;
/// Abort Output. `0xF5`
pub const AO: u8 = 245;
/// Are You There. `0xF6`
pub const AYT: u8 = 246;
/// Erase Character. `0xF7`
pub const EC: u8 = 247;
/// Erase Line. `0xF8`
pub const EL: u8 = 248;
/// Go Ahead. `0xF9`
pub const GA: u8 = 249;
/// Begin subnegotiation of the indicated option. `0xFA`
pub const SB: u8 = 250;
/// Indicates the desire to begin performing the indicated option. `0xFB`
pub const WILL: u8 = 251;
/// Indicates the refusal to perform the indicated option. `0xFC`
pub const WONT: u8 = 252;
/// Indicates the request that the other party perform the option. `0xFD`
pub const DO: u8 = 253;
/// Indicates the demand that the other party stop performing the option. `0xFE`
pub const DONT: u8 = 254;
/// Interpret As Command escape byte. `0xFF`
pub const IAC: u8 = 255;

/// Telnet option codes relevant to a MUD client, from the
/// [IANA registry](https://www.iana.org/assignments/telnet-options/telnet-options.xhtml)
/// plus the de-facto MUD extension numbers.
pub mod option {
    /// Binary Transmission [RFC856](https://tools.ietf.org/html/rfc856)
    pub const BINARY: u8 = 0;
    /// Echo [RFC857](https://tools.ietf.org/html/rfc857)
    pub const ECHO: u8 = 1;
    /// Suppress Go Ahead [RFC858](https://tools.ietf.org/html/rfc858)
    pub const SGA: u8 = 3;
    /// Status [RFC859](https://tools.ietf.org/html/rfc859)
    pub const STATUS: u8 = 5;
    /// Timing Mark [RFC860](https://tools.ietf.org/html/rfc860)
    pub const TM: u8 = 6;
    /// Terminal Type [RFC1091](https://tools.ietf.org/html/rfc1091)
    pub const TTYPE: u8 = 24;
    /// End of Record [RFC885](https://tools.ietf.org/html/rfc885)
    pub const EOR: u8 = 25;
    /// Negotiate About Window Size [RFC1073](https://tools.ietf.org/html/rfc1073)
    pub const NAWS: u8 = 31;
    /// Terminal Speed [RFC1079](https://tools.ietf.org/html/rfc1079)
    pub const TSPEED: u8 = 32;
    /// Remote Flow Control [RFC1372](https://tools.ietf.org/html/rfc1372)
    pub const LFLOW: u8 = 33;
    /// Linemode [RFC1184](https://tools.ietf.org/html/rfc1184)
    pub const LINEMODE: u8 = 34;
    /// New Environment [RFC1572](https://tools.ietf.org/html/rfc1572)
    pub const NEW_ENVIRONMENT: u8 = 39;
    /// Charset [RFC2066](https://tools.ietf.org/html/rfc2066)
    pub const CHARSET: u8 = 42;
    /// Mud Server Data Protocol [MSDP](https://tintin.sourceforge.io/protocols/msdp/)
    pub const MSDP: u8 = 69;
    /// Mud Server Status Protocol [MSSP](https://tintin.sourceforge.io/protocols/mssp/)
    pub const MSSP: u8 = 70;
    /// Mud Client Compression Protocol version 1 [MCCPv1](http://www.gammon.com.au/mccp/protocol.html)
    pub const COMPRESS1: u8 = 85;
    /// Mud Client Compression Protocol version 2 [MCCPv2](https://tintin.sourceforge.io/protocols/mccp/)
    pub const COMPRESS2: u8 = 86;
    /// Mud Sound Protocol [MSP](https://www.zuggsoft.com/zmud/msp.htm)
    pub const MSP: u8 = 90;
    /// Mud eXtension Protocol [MXP](https://www.zuggsoft.com/zmud/mxp.htm)
    pub const MXP: u8 = 91;
    /// Zenith Mud Protocol [ZMP](http://discworld.starturtle.net/external/protocols/zmp.html)
    pub const ZMP: u8 = 93;
    /// Generic Mud Communication Protocol [GMCP](https://www.gammon.com.au/gmcp)
    pub const GMCP: u8 = 201;

    /// Default support table indexed by option code: `(local, remote)`.
    ///
    /// `local` means we are willing to perform the option ourselves
    /// (answering DO with WILL); `remote` means we are willing to have the
    /// peer perform it (answering WILL with DO). Everything not listed here
    /// is refused on both sides.
    pub const SUPPORT: [(bool, bool); 256] = {
        let mut table = [(false, false); 256];
        table[ECHO as usize] = (false, true);
        table[CHARSET as usize] = (true, true);
        table[COMPRESS1 as usize] = (false, true);
        table[COMPRESS2 as usize] = (false, true);
        table[MSP as usize] = (false, true);
        table[ZMP as usize] = (false, true);
        table
    };
}

/// Subnegotiation verbs for the Charset option [RFC2066](https://tools.ietf.org/html/rfc2066).
pub mod charset {
    /// Offer a list of charsets, first byte after is the separator.
    pub const REQUEST: u8 = 1;
    /// Accept one charset from the offered list.
    pub const ACCEPTED: u8 = 2;
    /// Reject every offered charset.
    pub const REJECTED: u8 = 3;
    /// Transmit a translation table.
    pub const TTABLE_IS: u8 = 4;
    /// Refuse a translation table.
    pub const TTABLE_REJECTED: u8 = 5;
    /// Acknowledge a translation table.
    pub const TTABLE_ACK: u8 = 6;
    /// Report a corrupt translation table.
    pub const TTABLE_NAK: u8 = 7;
}
