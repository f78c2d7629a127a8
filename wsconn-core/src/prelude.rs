//! Prelude module for wsconn Core
//!
//! This module re-exports commonly used types and traits to make them
//! easily accessible for users of the library.

pub use crate::error::{Error, HostFault, Result};
pub use crate::frame::{Frame, FrameKind, Payload};
pub use crate::host::{BinaryType, CloseEvent, EventKind, Host, HostEvent, HostSocket};
pub use crate::protocol::{CloseCode, ReadyState};
pub use crate::socket::{Subscription, WebSocket};

// Re-export commonly used external dependencies
pub use bytes::Bytes;

#[cfg(feature = "serde")]
pub use serde::{Deserialize, Serialize};
