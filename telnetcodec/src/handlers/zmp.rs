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

//! Zenith MUD Protocol (ZMP)
//!
//! ZMP carries out-of-band commands as subnegotiation payloads: a command
//! name followed by its arguments, every string NUL-terminated. The handler
//! implements the mandatory `zmp.` core package (identification, ping and
//! package discovery) and surfaces every inbound command as
//! [`EngineAction::ZmpCommand`] for the session.

use crate::event::EngineAction;
use crate::handlers::{EngineOutput, OptionHandler};
use crate::options::TelnetOption;
use crate::result::{EngineError, EngineResult, SubnegotiationErrorKind};
use tracing::debug;

/// Commands of the core `zmp.` package this client understands.
const CORE_COMMANDS: [&str; 4] = ["zmp.ping", "zmp.time", "zmp.check", "zmp.ident"];

/// Handles the ZMP core package and command framing.
pub struct ZmpHandler {
    client_name: String,
    client_version: String,
}

impl ZmpHandler {
    /// Creates a handler that identifies itself to servers with the given
    /// client name and version.
    pub fn new(client_name: impl Into<String>, client_version: impl Into<String>) -> Self {
        ZmpHandler {
            client_name: client_name.into(),
            client_version: client_version.into(),
        }
    }
}

/// Encodes a command and its arguments as NUL-terminated strings.
///
/// NUL bytes inside an argument are dropped since the framing cannot carry
/// them.
pub(crate) fn encode_command(parts: &[&str]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(parts.iter().map(|part| part.len() + 1).sum());
    for part in parts {
        payload.extend(part.bytes().filter(|byte| *byte != 0));
        payload.push(0);
    }
    payload
}

/// Splits a subnegotiation payload into command name and arguments.
fn parse_command(payload: &[u8]) -> EngineResult<Vec<String>> {
    if payload.is_empty() {
        return Err(EngineError::SubnegotiationError {
            option: crate::consts::option::ZMP,
            reason: SubnegotiationErrorKind::Malformed {
                description: "empty command payload".into(),
            },
        });
    }
    if payload.last() != Some(&0) {
        return Err(EngineError::SubnegotiationError {
            option: crate::consts::option::ZMP,
            reason: SubnegotiationErrorKind::Truncated {
                description: "command payload missing final NUL".into(),
            },
        });
    }
    let parts: Vec<String> = payload[..payload.len() - 1]
        .split(|byte| *byte == 0)
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect();
    if parts.first().is_none_or(String::is_empty) {
        return Err(EngineError::SubnegotiationError {
            option: crate::consts::option::ZMP,
            reason: SubnegotiationErrorKind::Malformed {
                description: "empty command name".into(),
            },
        });
    }
    Ok(parts)
}

fn is_supported(name: &str) -> bool {
    name == "zmp." || CORE_COMMANDS.contains(&name)
}

impl OptionHandler for ZmpHandler {
    fn option(&self) -> TelnetOption {
        TelnetOption::ZMP
    }

    fn enable(&mut self, output: &mut EngineOutput) {
        let ident = encode_command(&[
            "zmp.ident",
            &self.client_name,
            &self.client_version,
            "a MUD session client",
        ]);
        output.send_subnegotiation(TelnetOption::ZMP, &ident);
    }

    fn handle_subnegotiation(
        &mut self,
        payload: &[u8],
        output: &mut EngineOutput,
    ) -> EngineResult<()> {
        let command = parse_command(payload)?;
        debug!("zmp: received {:?}", command);

        match command[0].as_str() {
            "zmp.ping" => {
                let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
                let reply = encode_command(&["zmp.time", &now]);
                output.send_subnegotiation(TelnetOption::ZMP, &reply);
            }
            "zmp.check" => {
                let Some(name) = command.get(1) else {
                    return Err(EngineError::SubnegotiationError {
                        option: crate::consts::option::ZMP,
                        reason: SubnegotiationErrorKind::Malformed {
                            description: "zmp.check without a package argument".into(),
                        },
                    });
                };
                let verdict = if is_supported(name) {
                    "zmp.support"
                } else {
                    "zmp.no-support"
                };
                let reply = encode_command(&[verdict, name]);
                output.send_subnegotiation(TelnetOption::ZMP, &reply);
            }
            _ => {}
        }

        output.push_action(EngineAction::ZmpCommand(command));
        Ok(())
    }
}
