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

//! MUD Client Compression Protocol (MCCP)
//!
//! Both protocol versions negotiate an option and then send one activation
//! subnegotiation, after which every byte from the server is part of a zlib
//! stream:
//!
//! * MCCPv1 (option 85) activates with `IAC SB 85 WILL SE`. The missing IAC
//!   before SE is a defect in the original protocol that servers still emit,
//!   so the engine frames it specially and this handler sees `WILL` as the
//!   payload.
//! * MCCPv2 (option 86) activates with a properly framed, empty
//!   subnegotiation `IAC SB 86 IAC SE`.
//!
//! The handler never inflates anything itself. It emits
//! [`EngineAction::StartCompression`], which also halts engine consumption
//! so the session can route the remaining bytes through a decompressor.

use crate::event::{CompressionVersion, EngineAction};
use crate::handlers::{EngineOutput, OptionHandler};
use crate::options::TelnetOption;
use crate::result::{EngineError, EngineResult, SubnegotiationErrorKind};
use crate::consts;

/// Activation handler for one MCCP protocol version.
pub struct CompressHandler {
    version: CompressionVersion,
    active: bool,
}

impl CompressHandler {
    /// Creates a handler for MCCP version 1 (option 85).
    pub fn v1() -> Self {
        CompressHandler {
            version: CompressionVersion::V1,
            active: false,
        }
    }

    /// Creates a handler for MCCP version 2 (option 86).
    pub fn v2() -> Self {
        CompressHandler {
            version: CompressionVersion::V2,
            active: false,
        }
    }
}

impl OptionHandler for CompressHandler {
    fn option(&self) -> TelnetOption {
        match self.version {
            CompressionVersion::V1 => TelnetOption::Compress1,
            CompressionVersion::V2 => TelnetOption::Compress2,
        }
    }

    fn disable(&mut self, output: &mut EngineOutput) {
        if self.active {
            self.active = false;
            output.push_action(EngineAction::StopCompression);
        }
    }

    fn handle_subnegotiation(
        &mut self,
        payload: &[u8],
        output: &mut EngineOutput,
    ) -> EngineResult<()> {
        let valid = match self.version {
            CompressionVersion::V1 => payload == [consts::WILL],
            CompressionVersion::V2 => payload.is_empty(),
        };
        if !valid {
            return Err(EngineError::SubnegotiationError {
                option: self.option().to_u8(),
                reason: SubnegotiationErrorKind::Malformed {
                    description: "unexpected payload in compression activation".into(),
                },
            });
        }
        self.active = true;
        output.push_action(EngineAction::StartCompression(self.version));
        Ok(())
    }
}
