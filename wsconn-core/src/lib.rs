//! # wsconn Core
//!
//! Foundation types for wsconn: everything that sits between a host-provided
//! WebSocket object and the blocking stream adapter in `wsconn-client`.
//!
//! It includes:
//!
//! - Error handling and types
//! - Close codes (RFC 6455 section 11.7) and ready states
//! - Received frames
//! - The host collaborator traits ([`Host`], [`HostSocket`])
//! - A low-level, non-blocking event wrapper ([`WebSocket`])
//! - An in-memory host for tests (feature `mock`)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/wsconn-core/")]

// Core modules
pub mod error;
pub mod frame;
pub mod host;
pub mod logging;
pub mod protocol;
pub mod socket;

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub mod mock;

// Prelude module with common imports
pub mod prelude;

// Re-export key types for convenience
pub use error::{ConfigError, Error, FaultKind, HostFault, Result};
pub use frame::{Frame, FrameKind, Payload};
pub use host::{BinaryType, CloseEvent, EventKind, Host, HostEvent, HostSocket, Listener, ListenerId};
pub use protocol::{CloseCode, ReadyState};
pub use socket::{Subscription, WebSocket};
