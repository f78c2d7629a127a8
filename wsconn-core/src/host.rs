//! Host collaborator abstraction
//!
//! The WebSocket protocol itself is implemented by the host environment
//! (usually a browser). These traits describe the small surface wsconn needs
//! from it: construct a socket, add and remove event listeners, send, close,
//! and read a handful of attributes.
//!
//! Implementations must dispatch events from their own callback context, never
//! synchronously from inside the call that registered a listener or that
//! triggered the event.

use crate::error::HostFault;
use crate::frame::{Frame, Payload};
use crate::protocol::{CloseCode, ReadyState};
use std::fmt;
use std::sync::Arc;

/// Event categories a host socket raises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The connection opened
    Open,
    /// An error occurred; always followed by a close event
    Error,
    /// The connection closed, or failed to open
    Close,
    /// A frame arrived
    Message,
}

impl EventKind {
    /// DOM event name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Open => "open",
            EventKind::Error => "error",
            EventKind::Close => "close",
            EventKind::Message => "message",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event raised by a host socket, with its data already converted from
/// host types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// `open`
    Open,
    /// `error`, with whatever diagnostic the host offers
    Error(String),
    /// `close`
    Close(CloseEvent),
    /// `message`
    Message(Frame),
}

impl HostEvent {
    /// The category this event is dispatched under
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Open => EventKind::Open,
            HostEvent::Error(_) => EventKind::Error,
            HostEvent::Close(_) => EventKind::Close,
            HostEvent::Message(_) => EventKind::Message,
        }
    }
}

/// Data of a host `close` event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CloseEvent {
    /// Close status code
    pub code: u16,
    /// Close reason sent by the peer
    pub reason: String,
    /// Whether the closing handshake completed
    pub was_clean: bool,
}

impl CloseEvent {
    /// Create a close event
    pub fn new(code: u16, reason: impl Into<String>, was_clean: bool) -> Self {
        Self {
            code,
            reason: reason.into(),
            was_clean,
        }
    }

    /// A clean closure with code 1000 and no reason
    pub fn normal() -> Self {
        Self::new(crate::protocol::constants::NORMAL_CLOSURE, "", true)
    }

    /// The status code as a [`CloseCode`]
    pub fn close_code(&self) -> CloseCode {
        CloseCode::from(self.code)
    }
}

impl fmt::Display for CloseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clean = if self.was_clean { "clean" } else { "unclean" };
        write!(f, "CloseEvent: ({}) ({}) {}", clean, self.code, self.reason)
    }
}

/// Format in which the host delivers binary frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryType {
    /// `Blob` objects, what a freshly created socket uses
    #[default]
    Blob,
    /// `ArrayBuffer` objects, readable synchronously
    ArrayBuffer,
}

impl BinaryType {
    /// Attribute value as the host spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryType::Blob => "blob",
            BinaryType::ArrayBuffer => "arraybuffer",
        }
    }
}

/// Callback invoked by the host for each dispatched event
pub type Listener = Arc<dyn Fn(HostEvent) + Send + Sync>;

/// Handle returned by [`HostSocket::add_event_listener`], used to remove
/// the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// A host-provided bidirectional socket object
pub trait HostSocket {
    /// Attach a listener for one event category
    fn add_event_listener(&self, kind: EventKind, listener: Listener) -> ListenerId;

    /// Detach a listener. Unknown ids are ignored.
    fn remove_event_listener(&self, kind: EventKind, id: ListenerId);

    /// Queue a payload for transmission. Returns once the host has accepted
    /// it into its send buffer.
    fn send(&self, payload: Payload<'_>) -> Result<(), HostFault>;

    /// Start the closing handshake
    fn close(&self, code: u16, reason: &str) -> Result<(), HostFault>;

    /// URL the socket was created with, as resolved by the host
    fn url(&self) -> String;

    /// Current lifecycle stage
    fn ready_state(&self) -> ReadyState;

    /// Bytes queued by `send` but not yet transmitted
    fn buffered_amount(&self) -> u64;

    /// Format of delivered binary data
    fn binary_type(&self) -> BinaryType;

    /// Change the format of delivered binary data
    fn set_binary_type(&self, binary_type: BinaryType);

    /// Subprotocol selected by the server
    fn protocol(&self) -> String;

    /// Extensions selected by the server
    fn extensions(&self) -> String;
}

/// Factory for host sockets
pub trait Host {
    /// Socket type produced by this host
    type Socket: HostSocket;

    /// Construct a socket. Does not wait for it to open; the host validates
    /// the URL and raises a fault if it is unacceptable.
    fn connect(&self, url: &str, protocols: &[String]) -> Result<Self::Socket, HostFault>;
}

impl<H: Host + ?Sized> Host for &H {
    type Socket = H::Socket;

    fn connect(&self, url: &str, protocols: &[String]) -> Result<Self::Socket, HostFault> {
        (**self).connect(url, protocols)
    }
}
