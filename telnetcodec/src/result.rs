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

/// Result Type for Engine Operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the telnet engine.
///
/// The engine recovers from malformed wire data on its own (permissive
/// resynchronization, see [`crate::TelnetEngine::process`]), so these
/// errors only describe conditions the caller must act on, such as a
/// subnegotiation payload that cannot be honored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Error occurred during telnet option negotiation.
    NegotiationError {
        /// The option being negotiated, if known
        option: Option<u8>,
        /// Description of what went wrong during negotiation
        reason: String,
    },

    /// Error occurred while interpreting a subnegotiation payload.
    SubnegotiationError {
        /// The telnet option being subnegotiated
        option: u8,
        /// Specific reason for the failure
        reason: SubnegotiationErrorKind,
    },
}

/// Specific kinds of subnegotiation failures with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubnegotiationErrorKind {
    /// Payload ended before the structure it announced was complete.
    Truncated {
        /// Description of what data is missing
        description: String,
    },

    /// Invalid verb or command byte in the payload.
    InvalidCommand {
        /// The offending byte
        command: u8,
    },

    /// Payload is not valid for the option's wire format.
    Malformed {
        /// Description of the violation
        description: String,
    },
}

impl std::error::Error for EngineError {}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NegotiationError { option, reason } => {
                if let Some(opt) = option {
                    write!(f, "Negotiation error for option {}: {}", opt, reason)
                } else {
                    write!(f, "Negotiation error: {}", reason)
                }
            }
            EngineError::SubnegotiationError { option, reason } => {
                write!(f, "Subnegotiation error for option {}: {}", option, reason)
            }
        }
    }
}

impl std::fmt::Display for SubnegotiationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubnegotiationErrorKind::Truncated { description } => {
                write!(f, "truncated payload: {}", description)
            }
            SubnegotiationErrorKind::InvalidCommand { command } => {
                write!(f, "invalid command: 0x{:02X}", command)
            }
            SubnegotiationErrorKind::Malformed { description } => {
                write!(f, "malformed payload: {}", description)
            }
        }
    }
}
