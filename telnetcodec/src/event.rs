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

use crate::TelnetOption;

///
/// A negotiation verb as it appears on the wire after an IAC.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TelnetVerb {
    /// Offer to perform an option.
    Will,
    /// Refusal or teardown of an option the sender performs.
    Wont,
    /// Request that the other party perform an option.
    Do,
    /// Demand that the other party stop performing an option.
    Dont,
}

impl TelnetVerb {
    /// The wire byte for this verb.
    pub fn to_u8(self) -> u8 {
        match self {
            TelnetVerb::Will => crate::consts::WILL,
            TelnetVerb::Wont => crate::consts::WONT,
            TelnetVerb::Do => crate::consts::DO,
            TelnetVerb::Dont => crate::consts::DONT,
        }
    }
}

impl std::fmt::Display for TelnetVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelnetVerb::Will => write!(f, "WILL"),
            TelnetVerb::Wont => write!(f, "WONT"),
            TelnetVerb::Do => write!(f, "DO"),
            TelnetVerb::Dont => write!(f, "DONT"),
        }
    }
}

///
/// MCCP protocol revision that activated compression.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompressionVersion {
    /// MCCP version 1, option 85, activated by `IAC SB 85 WILL SE`.
    V1,
    /// MCCP version 2, option 86, activated by `IAC SB 86 IAC SE`.
    V2,
}

///
/// Session-level effect produced while scanning inbound bytes.
///
/// The engine strips telnet control traffic out of the byte stream and
/// reports everything that matters above the wire as one of these actions.
/// The caller applies them in order after each [`crate::TelnetEngine::process`]
/// call.
///
#[derive(Clone, Debug, PartialEq)]
pub enum EngineAction {
    /// An option finished negotiating on (`true`) or off (`false`).
    OptionStatus(TelnetOption, bool),
    /// The peer took over (or gave back) echoing; local echo should follow.
    SetLocalEcho(bool),
    /// All bytes after the activating subnegotiation are zlib-compressed;
    /// the caller must route the rest of the stream through a decompressor
    /// before feeding it back to the engine.
    StartCompression(CompressionVersion),
    /// Compression torn down (option disabled or connection reset).
    StopCompression,
    /// The peer negotiated a text encoding for subsequent output.
    SetEncoding(String),
    /// Revert to the session's configured default encoding.
    ResetEncoding,
    /// A sound/media trigger asked for a file to be fetched.
    QueueDownload {
        /// Fully resolved source URL.
        url: String,
        /// Suggested local file name (last path segment, no directories).
        file_name: String,
    },
    /// An out-of-band ZMP command (name first, then arguments).
    ZmpCommand(Vec<String>),
}
