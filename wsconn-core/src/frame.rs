//! Received frames and outgoing payloads
//!
//! A [`Frame`] is one complete message as delivered by the host. The host
//! has already reassembled fragments and removed masking, so a frame here is
//! just a kind tag and an immutable payload.

use bytes::Bytes;
use std::fmt;

/// Kind of data carried by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameKind {
    /// UTF-8 text
    Text,
    /// Arbitrary bytes
    Binary,
}

/// A complete message received from the host
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    kind: FrameKind,
    payload: Bytes,
}

impl Frame {
    /// Create a text frame
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: FrameKind::Text,
            payload: Bytes::from(text.into()),
        }
    }

    /// Create a binary frame
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self {
            kind: FrameKind::Binary,
            payload: data.into(),
        }
    }

    /// Frame kind
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Check if this is a text frame
    pub fn is_text(&self) -> bool {
        self.kind == FrameKind::Text
    }

    /// Payload bytes
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Take ownership of the payload
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload as text, if this is a text frame holding valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        match self.kind {
            FrameKind::Text => std::str::from_utf8(&self.payload).ok(),
            FrameKind::Binary => None,
        }
    }

    /// Borrow this frame as an outgoing payload
    pub fn as_payload(&self) -> Payload<'_> {
        match self.as_text() {
            Some(text) => Payload::Text(text),
            None => Payload::Binary(&self.payload),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("kind", &self.kind)
            .field("len", &self.payload.len())
            .finish()
    }
}

impl From<Payload<'_>> for Frame {
    fn from(payload: Payload<'_>) -> Self {
        match payload {
            Payload::Text(text) => Frame::text(text),
            Payload::Binary(data) => Frame::binary(Bytes::copy_from_slice(data)),
        }
    }
}

/// Outgoing data handed to the host's `send`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    /// Sent as a text frame
    Text(&'a str),
    /// Sent as a binary frame
    Binary(&'a [u8]),
}

impl Payload<'_> {
    /// Payload length in bytes
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(data) => data.len(),
        }
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
