//! # wsconn
//!
//! **Blocking byte streams over host-provided WebSockets**
//!
//! A browser exposes WebSockets as event-driven, frame-oriented objects. wsconn
//! wraps them twice: a thin non-blocking event wrapper ([`WebSocket`]), and a
//! connection that reads and writes bytes with `std::io` semantics and read
//! deadlines (`client::Conn`).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::io::{Read, Write};
//! use std::time::{Duration, Instant};
//! use wsconn::prelude::*;
//!
//! fn ping<H: Host>(host: &H) -> std::io::Result<Vec<u8>> {
//!     let mut conn = wsconn::client::dial(host, "wss://echo.example.test/")?;
//!     conn.set_read_deadline(Some(Instant::now() + Duration::from_secs(5)))?;
//!
//!     conn.write_all(b"ping")?;
//!     let mut reply = vec![0u8; 4];
//!     conn.read_exact(&mut reply)?;
//!
//!     conn.close()?;
//!     Ok(reply)
//! }
//! ```
//!
//! ## Features
//!
//! - `client` (default): the blocking connection
//! - `wasm`: the browser host, built on `web-sys`
//! - `mock`: an in-memory threaded host for tests
//! - `logging` (default): `tracing` events
//! - `metrics`: frame and byte counters
//! - `serde`: `Serialize`/`Deserialize` for plain data types

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/wsconn/")]

// Re-export core components
pub use wsconn_core::*;

#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub use wsconn_client as client;

#[cfg(feature = "wasm")]
#[cfg_attr(docsrs, doc(cfg(feature = "wasm")))]
pub use wsconn_wasm as wasm;

/// Prelude module with common imports
pub mod prelude {
    pub use wsconn_core::prelude::*;

    #[cfg(feature = "client")]
    pub use wsconn_client::prelude::*;

    #[cfg(feature = "wasm")]
    pub use wsconn_wasm::prelude::*;
}
