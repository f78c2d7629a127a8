//! wsconn client
//!
//! Blocking, deadline-aware byte streams on top of host WebSockets.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::io::{Read, Write};
//! use wsconn_client::prelude::*;
//!
//! fn talk<H: Host>(host: &H) -> std::io::Result<()> {
//!     let mut conn = wsconn_client::dial(host, "wss://echo.example.test/")?;
//!
//!     conn.write_all(b"Hello, wsconn!")?;
//!
//!     let mut buf = [0u8; 64];
//!     let n = conn.read(&mut buf)?;
//!     println!("Received: {:?}", &buf[..n]);
//!
//!     conn.close()?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/wsconn-client/")]

// Public modules
pub mod addr;
pub mod client;
pub mod config;
pub mod conn;

// Internal plumbing
mod queue;
mod signal;

// Prelude module
pub mod prelude;

// Re-export key types for convenience
pub use addr::Addr;
pub use client::Client;
pub use config::DialConfig;
pub use conn::{dial, dial_with_config, CloseHandle, Conn};
