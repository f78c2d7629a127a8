//! WebSocket protocol constants and utilities
//!
//! This module contains the pieces of RFC 6455 that are visible through a
//! host WebSocket object: ready states and close status codes. Framing,
//! masking and the opening handshake are the host's business.

use std::fmt;

/// Lifecycle stage of a host transport, mirroring the `readyState` attribute.
///
/// See <https://websockets.spec.whatwg.org/#dom-websocket-readystate>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum ReadyState {
    /// The connection has not yet been established.
    Connecting = 0,
    /// The connection is established and communication is possible.
    Open = 1,
    /// The connection is going through the closing handshake, or `close()`
    /// has been invoked.
    Closing = 2,
    /// The connection has been closed or could not be opened.
    Closed = 3,
}

impl ReadyState {
    /// Map the host's numeric ready state. Unknown values are treated as
    /// closed.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }

    /// Numeric value as exposed by the host.
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadyState::Connecting => "Connecting",
            ReadyState::Open => "Open",
            ReadyState::Closing => "Closing",
            ReadyState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// WebSocket close codes as defined in RFC 6455
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseCode {
    /// Normal closure
    Normal,
    /// Going away
    Away,
    /// Protocol error
    ProtocolError,
    /// Unsupported data
    Unsupported,
    /// No status received
    NoStatus,
    /// Abnormal closure
    Abnormal,
    /// Invalid frame payload data
    InvalidPayload,
    /// Policy violation
    PolicyViolation,
    /// Message too big
    TooBig,
    /// Mandatory extension
    MandatoryExtension,
    /// Internal server error
    Internal,
    /// Service restart
    Restart,
    /// Try again later
    TryAgainLater,
    /// Bad gateway
    BadGateway,
    /// TLS handshake failure
    TlsHandshake,
    /// Registered by libraries and frameworks (3000-3999) or private use
    /// (4000-4999)
    Application(u16),
    /// Anything else, including reserved values
    Other(u16),
}

impl CloseCode {
    /// Create a CloseCode from a u16
    pub fn from(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::Away,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::Unsupported,
            1005 => CloseCode::NoStatus,
            1006 => CloseCode::Abnormal,
            1007 => CloseCode::InvalidPayload,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::TooBig,
            1010 => CloseCode::MandatoryExtension,
            1011 => CloseCode::Internal,
            1012 => CloseCode::Restart,
            1013 => CloseCode::TryAgainLater,
            1014 => CloseCode::BadGateway,
            1015 => CloseCode::TlsHandshake,
            code if (3000..=4999).contains(&code) => CloseCode::Application(code),
            code => CloseCode::Other(code),
        }
    }

    /// Get the numeric value of the close code
    pub fn code(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::Away => 1001,
            CloseCode::ProtocolError => 1002,
            CloseCode::Unsupported => 1003,
            CloseCode::NoStatus => 1005,
            CloseCode::Abnormal => 1006,
            CloseCode::InvalidPayload => 1007,
            CloseCode::PolicyViolation => 1008,
            CloseCode::TooBig => 1009,
            CloseCode::MandatoryExtension => 1010,
            CloseCode::Internal => 1011,
            CloseCode::Restart => 1012,
            CloseCode::TryAgainLater => 1013,
            CloseCode::BadGateway => 1014,
            CloseCode::TlsHandshake => 1015,
            CloseCode::Application(code) | CloseCode::Other(code) => *code,
        }
    }

    /// Check if this is a reserved close code that must never be sent in a
    /// close frame
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            CloseCode::NoStatus | CloseCode::Abnormal | CloseCode::TlsHandshake
        ) || matches!(self, CloseCode::Other(1004))
    }

    /// Check if this close code indicates an error
    pub fn is_error(&self) -> bool {
        !matches!(self, CloseCode::Normal | CloseCode::Away | CloseCode::NoStatus)
    }

    /// Codes a script may pass to the host's `close()`: 1000 and 3000-4999.
    pub fn is_sendable(&self) -> bool {
        matches!(self, CloseCode::Normal | CloseCode::Application(_))
    }

    /// Human readable meaning, from the registry in RFC 6455 section 11.7.
    pub fn description(&self) -> &'static str {
        close_code_text(self.code())
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        CloseCode::from(code)
    }
}

/// WebSocket Close Code Number Registry (RFC 6455 section 11.7, plus the
/// IANA additions 1012-1014).
const CLOSE_CODE_TEXT: &[(u16, &str)] = &[
    (1000, "Normal Closure"),
    (1001, "Going Away"),
    (1002, "Protocol error"),
    (1003, "Unsupported Data"),
    (1004, "Reserved"),
    (1005, "No Status Rcvd"),
    (1006, "Abnormal Closure"),
    (1007, "Invalid frame payload data"),
    (1008, "Policy Violation"),
    (1009, "Message Too Big"),
    (1010, "Mandatory Ext."),
    (1011, "Internal Server Error"),
    (1012, "Service Restart"),
    (1013, "Try Again Later"),
    (1014, "Bad Gateway"),
    (1015, "TLS handshake"),
];

/// Look up the registered name of a close code.
pub fn close_code_text(code: u16) -> &'static str {
    match CLOSE_CODE_TEXT.binary_search_by_key(&code, |(c, _)| *c) {
        Ok(idx) => CLOSE_CODE_TEXT[idx].1,
        Err(_) if (3000..=3999).contains(&code) => "Registered",
        Err(_) if (4000..=4999).contains(&code) => "Private Use",
        Err(_) => "Unknown",
    }
}

/// Protocol constants
pub mod constants {
    /// Close code sent by a plain `close()`: the purpose for which the
    /// connection was established has been fulfilled (RFC 6455 section 7.4).
    pub const NORMAL_CLOSURE: u16 = 1000;

    /// Close code reported when the connection dropped without a close frame.
    pub const ABNORMAL_CLOSURE: u16 = 1006;

    /// Maximum close reason length in bytes (a control frame payload is 125
    /// bytes, two of which carry the code).
    pub const MAX_CLOSE_REASON: usize = 123;

    /// Network name reported by connection addresses.
    pub const NETWORK: &str = "websocket";
}
