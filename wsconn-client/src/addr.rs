//! Network addresses of a connection

use http::Uri;
use std::fmt;
use wsconn_core::protocol::constants;
use wsconn_core::{Error, Result};

/// Remote address of a connection: the URL it was dialed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addr {
    uri: Uri,
}

impl Addr {
    /// Parse an absolute URL. Scheme and authority are required.
    pub fn parse(url: &str) -> Result<Self> {
        let uri: Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| Error::InvalidAddr(format!("{url}: {e}")))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(Error::InvalidAddr(format!("{url}: not an absolute URL")));
        }
        Ok(Self { uri })
    }

    /// Network name, always `"websocket"`
    pub fn network(&self) -> &'static str {
        constants::NETWORK
    }

    /// The parsed URL
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Host part of the URL
    pub fn host(&self) -> &str {
        self.uri.host().unwrap_or_default()
    }

    /// Port, falling back to the scheme's default
    pub fn port(&self) -> Option<u16> {
        self.uri
            .port_u16()
            .or_else(|| match self.uri.scheme_str() {
                Some("ws") | Some("http") => Some(80),
                Some("wss") | Some("https") => Some(443),
                _ => None,
            })
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}
