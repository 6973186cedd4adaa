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

//! Echo (RFC 857)
//!
//! MUD servers negotiate `WILL ECHO` before a password prompt to tell the
//! client to stop echoing keystrokes locally, and tear it down afterwards.
//! The handler translates that handshake into [`EngineAction::SetLocalEcho`]
//! so the session can hide input and redact its history entry.

use crate::event::EngineAction;
use crate::handlers::{EngineOutput, OptionHandler};
use crate::options::TelnetOption;

/// Tracks the server-side echo option and toggles local echo to match.
pub struct EchoHandler;

impl OptionHandler for EchoHandler {
    fn option(&self) -> TelnetOption {
        TelnetOption::Echo
    }

    fn enable(&mut self, output: &mut EngineOutput) {
        // Server echoes now, so the client must not.
        output.push_action(EngineAction::SetLocalEcho(false));
    }

    fn disable(&mut self, output: &mut EngineOutput) {
        output.push_action(EngineAction::SetLocalEcho(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_turns_local_echo_off() {
        let mut handler = EchoHandler;
        let mut output = EngineOutput::new();
        handler.enable(&mut output);
        assert_eq!(output.actions, vec![EngineAction::SetLocalEcho(false)]);
    }

    #[test]
    fn disable_restores_local_echo() {
        let mut handler = EchoHandler;
        let mut output = EngineOutput::new();
        handler.disable(&mut output);
        assert_eq!(output.actions, vec![EngineAction::SetLocalEcho(true)]);
    }
}
