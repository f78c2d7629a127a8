//! Browser host for wsconn
//!
//! [`BrowserHost`] implements the wsconn host traits over the browser's
//! `WebSocket` through `web-sys`. Use it with the event wrapper,
//! [`wsconn_core::WebSocket`]: register callbacks and let the browser's
//! event loop call them.
//!
//! The blocking `Conn` from `wsconn-client` does not work with this host.
//! The browser dispatches a socket's events on the thread that created it,
//! only after that thread returns to its event loop, and a [`BrowserSocket`]
//! cannot move to another thread. A thread parked in `dial` or `read` would
//! wait forever.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![doc(html_root_url = "https://docs.rs/wsconn-wasm/")]

#[cfg(feature = "wasm-bindgen")]
#[cfg_attr(docsrs, doc(cfg(feature = "wasm-bindgen")))]
pub mod browser;

#[cfg(feature = "wasm-bindgen")]
pub use browser::{BrowserHost, BrowserSocket};

/// Prelude module
pub mod prelude {
    #[cfg(feature = "wasm-bindgen")]
    pub use crate::browser::{BrowserHost, BrowserSocket};
    pub use wsconn_core::prelude::*;
}
