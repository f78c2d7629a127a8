//! Error types for wsconn
//!
//! This module defines all error types used throughout the wsconn crates.
//! Host faults are captured at the boundary of the operation that raised
//! them and surface as one of the typed variants below; nothing here is
//! retried.

use crate::host::CloseEvent;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for wsconn operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for wsconn operations
#[derive(Error, Debug)]
pub enum Error {
    /// The host closed the transport abnormally, before it opened or while
    /// data was being read
    #[error("{0}")]
    Closed(CloseEvent),

    /// The host refused to construct the transport
    #[error("failed to create WebSocket: {0}")]
    Host(HostFault),

    /// The host rejected a payload
    #[error("send failed: {0}")]
    Send(HostFault),

    /// The host faulted while closing
    #[error("close failed: {0}")]
    Close(HostFault),

    /// A read deadline passed with no frame available
    #[error("i/o timeout: deadline reached")]
    DeadlineExceeded,

    /// The transport did not open within the configured connect timeout
    #[error("connection not established within {0:?}")]
    DialTimeout(Duration),

    /// Operation the host environment cannot provide
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Transport URL could not be parsed as an address
    #[error("invalid remote address {0:?}")]
    InvalidAddr(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether the error was caused by a deadline or timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::DeadlineExceeded | Error::DialTimeout(_))
    }

    /// Whether retrying the same operation later may succeed. Only timeouts
    /// qualify; a closed stream stays closed.
    pub fn is_temporary(&self) -> bool {
        matches!(self, Error::DeadlineExceeded)
    }

    /// Close information, when the error was derived from a close event.
    pub fn close_event(&self) -> Option<&CloseEvent> {
        match self {
            Error::Closed(event) => Some(event),
            _ => None,
        }
    }

    /// The host fault behind this error, if any.
    pub fn fault(&self) -> Option<&HostFault> {
        match self {
            Error::Host(fault) | Error::Send(fault) | Error::Close(fault) => Some(fault),
            _ => None,
        }
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            Error::Closed(_) => io::ErrorKind::ConnectionAborted,
            Error::Host(fault) => match fault.kind {
                FaultKind::Syntax => io::ErrorKind::InvalidInput,
                FaultKind::Security => io::ErrorKind::PermissionDenied,
                _ => io::ErrorKind::ConnectionRefused,
            },
            Error::Send(fault) => match fault.kind {
                FaultKind::InvalidState => io::ErrorKind::NotConnected,
                FaultKind::Syntax => io::ErrorKind::InvalidInput,
                _ => io::ErrorKind::BrokenPipe,
            },
            Error::Close(_) => io::ErrorKind::Other,
            Error::DeadlineExceeded | Error::DialTimeout(_) => io::ErrorKind::TimedOut,
            Error::Unsupported(_) => io::ErrorKind::Unsupported,
            Error::InvalidAddr(_) | Error::Config(_) => io::ErrorKind::InvalidInput,
            Error::Io(err) => err.kind(),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(err) => err,
            err => io::Error::new(err.io_kind(), err),
        }
    }
}

/// Category of a fault raised by the host.
///
/// Browsers report failures by throwing a `DOMException`; its `name` picks the
/// category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// `SyntaxError`: malformed URL, bad scheme, invalid subprotocol or close
    /// reason
    Syntax,
    /// `InvalidStateError`: operation not allowed in the current ready state
    InvalidState,
    /// `InvalidAccessError`: e.g. a close code outside the permitted range
    InvalidAccess,
    /// `SecurityError`: blocked port or mixed content
    Security,
    /// `NetworkError`
    Network,
    /// Any other named exception
    Other(String),
}

impl FaultKind {
    /// Classify by exception name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "SyntaxError" => FaultKind::Syntax,
            "InvalidStateError" => FaultKind::InvalidState,
            "InvalidAccessError" => FaultKind::InvalidAccess,
            "SecurityError" => FaultKind::Security,
            "NetworkError" => FaultKind::Network,
            other => FaultKind::Other(other.to_string()),
        }
    }

    /// Exception name for this category.
    pub fn name(&self) -> &str {
        match self {
            FaultKind::Syntax => "SyntaxError",
            FaultKind::InvalidState => "InvalidStateError",
            FaultKind::InvalidAccess => "InvalidAccessError",
            FaultKind::Security => "SecurityError",
            FaultKind::Network => "NetworkError",
            FaultKind::Other(name) => name,
        }
    }
}

/// A fault raised synchronously by a host call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}{}", .kind.name(), detail(.message))]
pub struct HostFault {
    /// Fault category
    pub kind: FaultKind,
    /// Host diagnostic
    pub message: String,
}

impl HostFault {
    /// Create a fault
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a `SyntaxError`
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Syntax, message)
    }

    /// Shorthand for an `InvalidStateError`
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(FaultKind::InvalidState, message)
    }
}

fn detail(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {message}")
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Offending value
        value: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Send(HostFault::invalid_state("still in CONNECTING state"));
        assert_eq!(
            err.to_string(),
            "send failed: InvalidStateError: still in CONNECTING state"
        );
        assert_eq!(
            Error::DeadlineExceeded.to_string(),
            "i/o timeout: deadline reached"
        );
    }

    #[test]
    fn test_host_fault_display() {
        let fault = HostFault::new(FaultKind::Network, "");
        assert_eq!(fault.to_string(), "NetworkError");
        let fault = HostFault::syntax("bad scheme");
        assert_eq!(fault.to_string(), "SyntaxError: bad scheme");

        let source: &dyn std::error::Error = &fault;
        assert!(source.source().is_none());
    }

    #[test]
    fn test_timeout_classification() {
        assert!(Error::DeadlineExceeded.is_timeout());
        assert!(Error::DeadlineExceeded.is_temporary());
        assert!(Error::DialTimeout(Duration::from_secs(1)).is_timeout());
        assert!(!Error::DialTimeout(Duration::from_secs(1)).is_temporary());
        assert!(!Error::Unsupported("local address").is_timeout());
    }

    #[test]
    fn test_fault_kind_names() {
        for name in [
            "SyntaxError",
            "InvalidStateError",
            "InvalidAccessError",
            "SecurityError",
            "NetworkError",
            "TypeError",
        ] {
            assert_eq!(FaultKind::from_name(name).name(), name);
        }
        assert_eq!(FaultKind::from_name("TypeError"), FaultKind::Other("TypeError".into()));
    }

    #[test]
    fn test_io_conversion_keeps_source() {
        let io_err: io::Error = Error::DeadlineExceeded.into();
        assert_eq!(io_err.kind(), io::ErrorKind::TimedOut);
        let inner = io_err
            .get_ref()
            .and_then(|e| e.downcast_ref::<Error>())
            .expect("typed error kept as source");
        assert!(inner.is_temporary());

        let closed: io::Error = Error::Closed(CloseEvent::new(1006, "", false)).into();
        assert_eq!(closed.kind(), io::ErrorKind::ConnectionAborted);
        let event = closed
            .get_ref()
            .and_then(|e| e.downcast_ref::<Error>())
            .and_then(Error::close_event)
            .expect("close event kept");
        assert_eq!(event.code, 1006);

        let refused: io::Error = Error::Host(HostFault::syntax("bad scheme")).into();
        assert_eq!(refused.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_io_error_round_trip_is_not_rewrapped() {
        let original = io::Error::new(io::ErrorKind::WouldBlock, "busy");
        let converted: io::Error = Error::from(original).into();
        assert_eq!(converted.kind(), io::ErrorKind::WouldBlock);
    }
}
