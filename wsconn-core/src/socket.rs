//! Low-level WebSocket event wrapper
//!
//! [`WebSocket`] is a minimal non-blocking façade over a [`HostSocket`]. It
//! owns no buffering and no threads: callbacks run wherever the host
//! dispatches them, sends return as soon as the host buffered the payload,
//! and every host fault is converted into the operation's typed [`Error`].
//!
//! For a blocking byte stream on top of this, see `wsconn-client`.

use crate::error::{Error, Result};
use crate::frame::{Frame, Payload};
use crate::host::{BinaryType, CloseEvent, EventKind, Host, HostEvent, HostSocket, ListenerId};
use crate::protocol::{constants, ReadyState};
use std::fmt;
use std::sync::Arc;

/// A registered callback, returned by the `on_*` methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "dropping a Subscription leaves the callback registered"]
pub struct Subscription {
    kind: EventKind,
    id: ListenerId,
}

impl Subscription {
    /// Event category the callback listens to
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// Non-blocking wrapper around a host socket
pub struct WebSocket<S> {
    socket: S,
}

impl<S: HostSocket> WebSocket<S> {
    /// Create a new socket. Returns immediately; the connection opens (or
    /// fails) asynchronously.
    pub fn create<H>(host: &H, url: &str) -> Result<Self>
    where
        H: Host<Socket = S> + ?Sized,
    {
        Self::create_with_protocols(host, url, &[])
    }

    /// Create a new socket offering the given subprotocols
    pub fn create_with_protocols<H>(host: &H, url: &str, protocols: &[String]) -> Result<Self>
    where
        H: Host<Socket = S> + ?Sized,
    {
        match host.connect(url, protocols) {
            Ok(socket) => {
                crate::log_debug!(url, "created host socket");
                Ok(Self { socket })
            }
            Err(fault) => {
                crate::log_debug!(url, %fault, "host refused socket");
                Err(Error::Host(fault))
            }
        }
    }

    /// Wrap an already constructed host socket
    pub fn from_socket(socket: S) -> Self {
        Self { socket }
    }

    /// Underlying host socket
    pub fn socket(&self) -> &S {
        &self.socket
    }

    fn listen<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(HostEvent) + Send + Sync + 'static,
    {
        let id = self.socket.add_event_listener(kind, Arc::new(callback));
        Subscription { kind, id }
    }

    /// Register a callback for the `open` event
    pub fn on_open<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listen(EventKind::Open, move |event| {
            if let HostEvent::Open = event {
                callback()
            }
        })
    }

    /// Register a callback for the `error` event
    pub fn on_error<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.listen(EventKind::Error, move |event| {
            if let HostEvent::Error(message) = event {
                callback(&message)
            }
        })
    }

    /// Register a callback for the `close` event
    pub fn on_close<F>(&self, callback: F) -> Subscription
    where
        F: Fn(CloseEvent) + Send + Sync + 'static,
    {
        self.listen(EventKind::Close, move |event| {
            if let HostEvent::Close(close) = event {
                callback(close)
            }
        })
    }

    /// Register a callback for the `message` event
    pub fn on_message<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Frame) + Send + Sync + 'static,
    {
        self.listen(EventKind::Message, move |event| {
            if let HostEvent::Message(frame) = event {
                callback(frame)
            }
        })
    }

    /// Remove a previously registered callback
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.socket
            .remove_event_listener(subscription.kind, subscription.id);
    }

    /// Hand a payload to the host for transmission
    pub fn send(&self, payload: Payload<'_>) -> Result<()> {
        self.socket.send(payload).map_err(|fault| {
            crate::log_debug!(%fault, len = payload.len(), "host rejected send");
            Error::Send(fault)
        })
    }

    /// Send a text frame
    pub fn send_text(&self, text: &str) -> Result<()> {
        self.send(Payload::Text(text))
    }

    /// Send a binary frame
    pub fn send_binary(&self, data: &[u8]) -> Result<()> {
        self.send(Payload::Binary(data))
    }

    /// Close the socket with a normal closure code.
    ///
    /// Calling this on a socket that is already closing or closed is up to
    /// the host; a fault is reported as [`Error::Close`].
    pub fn close(&self) -> Result<()> {
        self.close_with(constants::NORMAL_CLOSURE, "")
    }

    /// Close the socket with an explicit code and reason
    pub fn close_with(&self, code: u16, reason: &str) -> Result<()> {
        self.socket.close(code, reason).map_err(|fault| {
            crate::log_debug!(%fault, code, "host faulted on close");
            Error::Close(fault)
        })
    }

    /// URL as resolved by the host
    pub fn url(&self) -> String {
        self.socket.url()
    }

    /// Current ready state
    pub fn ready_state(&self) -> ReadyState {
        self.socket.ready_state()
    }

    /// Bytes accepted by `send` but not yet transmitted
    pub fn buffered_amount(&self) -> u64 {
        self.socket.buffered_amount()
    }

    /// Format of delivered binary data
    pub fn binary_type(&self) -> BinaryType {
        self.socket.binary_type()
    }

    /// Change the format of delivered binary data
    pub fn set_binary_type(&self, binary_type: BinaryType) {
        self.socket.set_binary_type(binary_type)
    }

    /// Subprotocol selected by the server
    pub fn protocol(&self) -> String {
        self.socket.protocol()
    }

    /// Extensions selected by the server
    pub fn extensions(&self) -> String {
        self.socket.extensions()
    }
}

impl<S: HostSocket> fmt::Debug for WebSocket<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocket")
            .field("url", &self.socket.url())
            .field("ready_state", &self.socket.ready_state())
            .finish()
    }
}
