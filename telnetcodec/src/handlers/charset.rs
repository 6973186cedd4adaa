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

//! Charset negotiation (RFC 2066)
//!
//! The server offers a separator-delimited list of charset names in a
//! `REQUEST` subnegotiation; the client answers `ACCEPTED` with the first
//! name it can decode or `REJECTED` when none fit. Which names qualify is
//! decided by an acceptance policy injected at construction, so the engine
//! stays independent of the decoder the embedding session actually uses.
//!
//! Translation tables (`TTABLE-IS`) are always refused.

use crate::consts::charset;
use crate::event::EngineAction;
use crate::handlers::{EngineOutput, OptionHandler};
use crate::options::TelnetOption;
use crate::result::{EngineError, EngineResult, SubnegotiationErrorKind};
use tracing::debug;

/// Decides whether a charset name offered by the server is acceptable.
pub type CharsetPolicy = Box<dyn Fn(&str) -> bool + Send>;

/// Negotiates the session text encoding with the server.
pub struct CharsetHandler {
    policy: CharsetPolicy,
}

impl CharsetHandler {
    /// Creates a handler that accepts offered charsets per `policy`.
    pub fn new(policy: CharsetPolicy) -> Self {
        CharsetHandler { policy }
    }

    fn handle_request(&self, payload: &[u8], output: &mut EngineOutput) -> EngineResult<()> {
        let mut rest = payload;

        // An optional translation table preamble precedes the separator.
        if rest.starts_with(b"[TTABLE]") {
            rest = &rest[b"[TTABLE]".len()..];
            if rest.is_empty() {
                return Err(truncated("request ends inside TTABLE version"));
            }
            rest = &rest[1..];
        }

        let Some((separator, names)) = rest.split_first() else {
            return Err(malformed("request carries no separator"));
        };

        for candidate in names.split(|byte| byte == separator) {
            let name = String::from_utf8_lossy(candidate);
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if (self.policy)(name) {
                debug!("charset: accepting {}", name);
                let mut reply = Vec::with_capacity(name.len() + 1);
                reply.push(charset::ACCEPTED);
                reply.extend_from_slice(name.as_bytes());
                output.send_subnegotiation(TelnetOption::Charset, &reply);
                output.push_action(EngineAction::SetEncoding(name.to_owned()));
                return Ok(());
            }
        }

        debug!("charset: no offered charset is acceptable");
        output.send_subnegotiation(TelnetOption::Charset, &[charset::REJECTED]);
        Ok(())
    }
}

impl OptionHandler for CharsetHandler {
    fn option(&self) -> TelnetOption {
        TelnetOption::Charset
    }

    fn disable(&mut self, output: &mut EngineOutput) {
        output.push_action(EngineAction::ResetEncoding);
    }

    fn handle_subnegotiation(
        &mut self,
        payload: &[u8],
        output: &mut EngineOutput,
    ) -> EngineResult<()> {
        let Some((verb, rest)) = payload.split_first() else {
            return Err(truncated("subnegotiation carries no verb"));
        };
        match *verb {
            charset::REQUEST => self.handle_request(rest, output),
            // We never send REQUEST, so answers are stray but harmless.
            charset::ACCEPTED | charset::REJECTED => {
                debug!("charset: ignoring unsolicited answer verb {}", verb);
                Ok(())
            }
            charset::TTABLE_IS => {
                output.send_subnegotiation(TelnetOption::Charset, &[charset::TTABLE_REJECTED]);
                Ok(())
            }
            other => Err(EngineError::SubnegotiationError {
                option: crate::consts::option::CHARSET,
                reason: SubnegotiationErrorKind::InvalidCommand { command: other },
            }),
        }
    }
}

fn truncated(description: &str) -> EngineError {
    EngineError::SubnegotiationError {
        option: crate::consts::option::CHARSET,
        reason: SubnegotiationErrorKind::Truncated {
            description: description.into(),
        },
    }
}

fn malformed(description: &str) -> EngineError {
    EngineError::SubnegotiationError {
        option: crate::consts::option::CHARSET,
        reason: SubnegotiationErrorKind::Malformed {
            description: description.into(),
        },
    }
}
