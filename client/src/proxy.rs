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

//! SOCKS proxy dialing
//!
//! Both protocols are used in their hostname-forwarding form (SOCKS4a and
//! SOCKS5 ATYP=DOMAIN) so name resolution happens on the proxy. No
//! authentication methods are offered.

use crate::{Result, SessionError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

const DEFAULT_PROXY_PORT: u16 = 1080;

/// SOCKS protocol revision.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProxyKind {
    /// SOCKS4 with the 4a hostname extension.
    Socks4,
    /// SOCKS5, no authentication.
    Socks5,
}

/// A parsed proxy specification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProxySpec {
    /// Protocol to speak to the proxy.
    pub kind: ProxyKind,
    /// Proxy host.
    pub host: String,
    /// Proxy port.
    pub port: u16,
}

impl ProxySpec {
    /// Parses `socks4://host[:port]` or `socks5://host[:port]`.
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || SessionError::InvalidProxy(url.to_string());
        let (scheme, rest) = url.split_once("://").ok_or_else(invalid)?;
        let kind = match scheme {
            "socks4" => ProxyKind::Socks4,
            "socks5" => ProxyKind::Socks5,
            _ => return Err(invalid()),
        };
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (rest, DEFAULT_PROXY_PORT),
        };
        if host.is_empty() {
            return Err(invalid());
        }
        Ok(ProxySpec {
            kind,
            host: host.to_string(),
            port,
        })
    }

    /// Address of the proxy itself, for the TCP dial.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Runs the CONNECT handshake for `host:port` over an already
    /// established stream to the proxy.
    pub async fn establish<S>(&self, stream: &mut S, host: &str, port: u16) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if host.len() > 255 {
            return Err(SessionError::InvalidProxy(format!(
                "hostname too long for SOCKS: {host}"
            )));
        }
        debug!(proxy = %self.address(), target = %host, port, "SOCKS handshake");
        match self.kind {
            ProxyKind::Socks4 => establish_socks4a(stream, host, port).await,
            ProxyKind::Socks5 => establish_socks5(stream, host, port).await,
        }
    }
}

async fn establish_socks4a<S>(stream: &mut S, host: &str, port: u16) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // VN=4 CD=CONNECT, invalid destination 0.0.0.x signals that the
    // hostname follows (the 4a extension).
    let mut request = vec![0x04, 0x01];
    request.extend_from_slice(&port.to_be_bytes());
    request.extend_from_slice(&[0, 0, 0, 1]);
    request.push(0); // empty userid
    request.extend_from_slice(host.as_bytes());
    request.push(0);
    stream.write_all(&request).await?;
    stream.flush().await?;

    let mut reply = [0u8; 8];
    stream.read_exact(&mut reply).await?;
    match reply[1] {
        0x5A => Ok(()),
        code => Err(SessionError::ProxyRefused(format!(
            "SOCKS4 reply code {code:#04x}"
        ))),
    }
}

async fn establish_socks5<S>(stream: &mut S, host: &str, port: u16) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // Greeting: one method offered, no authentication.
    stream.write_all(&[0x05, 0x01, 0x00]).await?;
    stream.flush().await?;
    let mut choice = [0u8; 2];
    stream.read_exact(&mut choice).await?;
    if choice != [0x05, 0x00] {
        return Err(SessionError::ProxyRefused(format!(
            "SOCKS5 method selection {:#04x}",
            choice[1]
        )));
    }

    // CONNECT with ATYP=DOMAIN.
    let mut request = vec![0x05, 0x01, 0x00, 0x03, host.len() as u8];
    request.extend_from_slice(host.as_bytes());
    request.extend_from_slice(&port.to_be_bytes());
    stream.write_all(&request).await?;
    stream.flush().await?;

    let mut head = [0u8; 4];
    stream.read_exact(&mut head).await?;
    if head[1] != 0x00 {
        return Err(SessionError::ProxyRefused(format!(
            "SOCKS5 reply code {:#04x}",
            head[1]
        )));
    }
    // Drain the bound address, which varies by address type.
    let addr_len = match head[3] {
        0x01 => 4,
        0x04 => 16,
        0x03 => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await?;
            len[0] as usize
        }
        atyp => {
            return Err(SessionError::ProxyRefused(format!(
                "SOCKS5 bound address type {atyp:#04x}"
            )));
        }
    };
    let mut bound = vec![0u8; addr_len + 2];
    stream.read_exact(&mut bound).await?;
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
