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

//! Session text encoding

use encoding_rs::Encoding;
use tracing::warn;

/// The session's text encoding: a configured default plus an optional
/// override negotiated by the server over the Charset option.
#[derive(Debug)]
pub struct SessionEncoding {
    default: &'static Encoding,
    negotiated: Option<&'static Encoding>,
}

impl SessionEncoding {
    /// Creates an encoding from a label, falling back to UTF-8 when the
    /// label is unknown.
    pub fn new(label: &str) -> Self {
        let default = Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
            warn!("unknown encoding label {:?}, using UTF-8", label);
            encoding_rs::UTF_8
        });
        SessionEncoding {
            default,
            negotiated: None,
        }
    }

    /// Whether a label names an encoding this client can use.
    pub fn resolves(label: &str) -> bool {
        Encoding::for_label(label.as_bytes()).is_some()
    }

    /// The encoding currently in effect.
    pub fn active(&self) -> &'static Encoding {
        self.negotiated.unwrap_or(self.default)
    }

    /// Installs a server-negotiated encoding. Unknown labels are ignored
    /// with a warning; the Charset handler rejects them before this point.
    pub fn set_remote(&mut self, label: &str) {
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => self.negotiated = Some(encoding),
            None => warn!("server selected unknown encoding {:?}", label),
        }
    }

    /// Reverts to the configured default.
    pub fn reset(&mut self) {
        self.negotiated = None;
    }

    /// Decodes inbound bytes for display. Malformed sequences become
    /// replacement characters; the renderer never sees raw bytes.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, _, _) = self.active().decode(bytes);
        text.into_owned()
    }

    /// Encodes outbound text. When the text cannot be represented in the
    /// active encoding the original UTF-8 bytes go out verbatim, which the
    /// server may mangle but the user's input is never silently dropped.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = self.active().encode(text);
        if had_errors {
            warn!(
                encoding = self.active().name(),
                "input not representable, sending raw UTF-8"
            );
            return text.as_bytes().to_vec();
        }
        bytes.into_owned()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
