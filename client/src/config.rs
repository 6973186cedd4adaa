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

//! Session configuration

use std::path::PathBuf;
use std::time::Duration;

/// MUD session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server hostname or IP address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Optional SOCKS proxy, `socks4://host[:port]` or `socks5://host[:port]`
    pub proxy: Option<String>,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Allow the server to switch the session encoding via Charset negotiation
    pub remote_encoding_allowed: bool,

    /// Allow media triggers from the server to queue file downloads
    pub remote_download_allowed: bool,

    /// Echo sent commands back into the display stream
    pub echo_sent_text: bool,

    /// Pass sent commands to the logging hook as well
    pub log_input: bool,

    /// Route outbound commands through `zmp.input` when ZMP is negotiated
    pub zmp_output_enabled: bool,

    /// Default text encoding label (e.g., "UTF-8", "latin1")
    pub encoding: String,

    /// Divider splitting one input line into multiple commands
    pub command_divider: String,

    /// Text sent automatically once the first server line arrives
    pub connect_string: Option<String>,

    /// Directory for files fetched by media triggers
    pub download_dir: PathBuf,

    /// Client name reported in the ZMP ident
    pub terminal_name: String,

    /// Client version reported in the ZMP ident
    pub client_version: String,

    /// Maximum number of retained input history entries
    pub history_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 23,
            proxy: None,
            connect_timeout: Duration::from_secs(10),
            remote_encoding_allowed: true,
            remote_download_allowed: false,
            echo_sent_text: true,
            log_input: false,
            zmp_output_enabled: false,
            encoding: "UTF-8".to_string(),
            command_divider: ";".to_string(),
            connect_string: None,
            download_dir: PathBuf::from("."),
            terminal_name: "mudlink".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            history_limit: 200,
        }
    }
}

impl SessionConfig {
    /// Create a new session configuration with the given host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the SOCKS proxy URL
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Allow or forbid server-driven encoding changes
    pub fn with_remote_encoding_allowed(mut self, allowed: bool) -> Self {
        self.remote_encoding_allowed = allowed;
        self
    }

    /// Allow or forbid server-triggered media downloads
    pub fn with_remote_download_allowed(mut self, allowed: bool) -> Self {
        self.remote_download_allowed = allowed;
        self
    }

    /// Enable or disable local echo of sent commands
    pub fn with_echo_sent_text(mut self, enabled: bool) -> Self {
        self.echo_sent_text = enabled;
        self
    }

    /// Route sent commands to the logging hook
    pub fn with_log_input(mut self, enabled: bool) -> Self {
        self.log_input = enabled;
        self
    }

    /// Route outbound commands through the ZMP sidechannel when negotiated
    pub fn with_zmp_output_enabled(mut self, enabled: bool) -> Self {
        self.zmp_output_enabled = enabled;
        self
    }

    /// Set the default text encoding label
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Set the command divider (empty disables splitting)
    pub fn with_command_divider(mut self, divider: impl Into<String>) -> Self {
        self.command_divider = divider.into();
        self
    }

    /// Set the text sent automatically on the first server line
    pub fn with_connect_string(mut self, text: impl Into<String>) -> Self {
        self.connect_string = Some(text.into());
        self
    }

    /// Set the directory for media downloads
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Set the client name reported over ZMP
    pub fn with_terminal_name(mut self, name: impl Into<String>) -> Self {
        self.terminal_name = name.into();
        self
    }

    /// Set the input history capacity
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Get the server address as a string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let config = SessionConfig::new("mud.example.com", 4000)
            .with_proxy("socks5://127.0.0.1:9050")
            .with_encoding("latin1")
            .with_command_divider("")
            .with_connect_string("guest")
            .with_history_limit(50);

        assert_eq!(config.address(), "mud.example.com:4000");
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:9050"));
        assert_eq!(config.encoding, "latin1");
        assert!(config.command_divider.is_empty());
        assert_eq!(config.connect_string.as_deref(), Some("guest"));
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn defaults_are_conservative() {
        let config = SessionConfig::default();
        assert!(!config.zmp_output_enabled);
        assert!(!config.remote_download_allowed);
        assert!(config.remote_encoding_allowed);
        assert_eq!(config.encoding, "UTF-8");
        assert_eq!(config.command_divider, ";");
    }
}
