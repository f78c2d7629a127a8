//! Prelude module for the wsconn client
//!
//! This module re-exports commonly used types and traits to make them
//! easily accessible for users of the client library.

pub use crate::addr::Addr;
pub use crate::client::Client;
pub use crate::config::DialConfig;
pub use crate::conn::{dial, dial_with_config, CloseHandle, Conn};

// Re-export core types for convenience
pub use wsconn_core::prelude::*;

// Re-export commonly used external dependencies
pub use std::time::{Duration, Instant};
