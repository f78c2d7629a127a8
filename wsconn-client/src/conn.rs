//! Blocking byte-stream connection
//!
//! [`Conn`] turns the event-driven, frame-oriented [`WebSocket`] into a
//! [`Read`]/[`Write`] byte stream. Host callbacks only feed the frame queue;
//! everything else (carry-over, deadline, the latched end of stream) belongs
//! to the `Conn` and is reached through `&mut self`.

use crate::addr::Addr;
use crate::config::DialConfig;
use crate::queue::{frame_queue, FrameQueue, Item, Producer};
use crate::signal::{open_signal, Outcome, WaitError};
use bytes::Bytes;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use wsconn_core::protocol::constants;
use wsconn_core::{
    BinaryType, CloseEvent, Error, Host, HostSocket, ReadyState, Result, Subscription, WebSocket,
};

/// Open a connection and block until it is established.
///
/// Returns [`Error::Closed`] if the host closed the transport before it
/// opened, or [`Error::Host`] if the host refused to create it.
///
/// The calling thread parks until the host reports an outcome, so the host
/// must dispatch events independently of it. A browser does not: it runs
/// callbacks on the socket's thread after control returns to its event loop.
pub fn dial<H>(host: &H, url: &str) -> Result<Conn<H::Socket>>
where
    H: Host + ?Sized,
{
    dial_with_config(host, url, &DialConfig::default())
}

/// Open a connection with explicit options
#[cfg_attr(feature = "logging", tracing::instrument(skip(host, config)))]
pub fn dial_with_config<H>(host: &H, url: &str, config: &DialConfig) -> Result<Conn<H::Socket>>
where
    H: Host + ?Sized,
{
    config.validate()?;

    let socket = WebSocket::create_with_protocols(host, url, &config.protocols)?;
    socket.set_binary_type(BinaryType::ArrayBuffer);

    let (producer, frames) = frame_queue();
    let message = {
        let producer = Arc::clone(&producer);
        socket.on_message(move |frame| producer.push_frame(frame))
    };
    let close = {
        let producer = Arc::clone(&producer);
        socket.on_close(move |event| {
            producer.end(event);
        })
    };

    // Both outcome listeners are attached before control returns to the
    // host, so whichever event comes first finds its listener.
    let (resolver, waiter) = open_signal();
    let refused = {
        let resolver = resolver.clone();
        socket.on_close(move |event| {
            resolver.resolve(Outcome::Closed(event));
        })
    };
    let opened = socket.on_open(move || {
        resolver.resolve(Outcome::Opened);
    });

    let outcome = waiter.wait(config.connect_timeout);
    socket.unsubscribe(opened);
    socket.unsubscribe(refused);

    let conn = Conn {
        inner: Arc::new(Inner {
            socket,
            producer,
            subscriptions: Mutex::new(vec![message, close]),
        }),
        frames,
        carry: None,
        read_deadline: None,
        end: None,
    };

    match outcome {
        Ok(Outcome::Opened) => {
            wsconn_core::log_debug!(protocol = %conn.protocol(), "connection open");
            #[cfg(feature = "metrics")]
            metrics::counter!("wsconn_client_connections_opened_total").increment(1);
            Ok(conn)
        }
        Ok(Outcome::Closed(event)) => {
            wsconn_core::log_debug!(%event, "closed before open");
            Err(conn.fail(Error::Closed(event)))
        }
        Err(WaitError::TimedOut) => {
            let timeout = config.connect_timeout.unwrap_or_default();
            wsconn_core::log_debug!(?timeout, "connect timeout elapsed");
            Err(conn.fail(Error::DialTimeout(timeout)))
        }
        Err(WaitError::Abandoned) => {
            let event = CloseEvent::new(constants::ABNORMAL_CLOSURE, "", false);
            wsconn_core::log_warn!("host dropped the open listeners without an outcome");
            Err(conn.fail(Error::Closed(event)))
        }
    }
}

struct Inner<S: HostSocket> {
    socket: WebSocket<S>,
    producer: Arc<Producer>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl<S: HostSocket> Inner<S> {
    /// Ask the host to close the transport. The handlers stay attached: the
    /// stream ends when the host's close event arrives, after every frame
    /// dispatched before it.
    fn close(&self) -> Result<()> {
        if self.producer.has_ended()
            || matches!(self.socket.ready_state(), ReadyState::Closing | ReadyState::Closed)
        {
            return Ok(());
        }
        self.socket.close()?;
        wsconn_core::log_debug!(url = %self.socket.url(), "closing locally");
        #[cfg(feature = "metrics")]
        metrics::counter!("wsconn_client_connections_closed_total").increment(1);
        Ok(())
    }

    /// Detach the message and close handlers
    fn release(&self) {
        let subscriptions = std::mem::take(
            &mut *self
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for subscription in subscriptions {
            self.socket.unsubscribe(subscription);
        }
    }
}

/// A blocking, deadline-aware byte stream over a host WebSocket.
///
/// Every received frame's payload is delivered in order; a frame larger than
/// the read buffer is split across reads. Writes send one binary frame each.
///
/// Reads end with `Ok(0)` once the connection closed cleanly, or with an
/// [`io::ErrorKind::ConnectionAborted`] error wrapping [`Error::Closed`] if it
/// closed abnormally. Either outcome is repeated by every later read.
///
/// An empty `write` returns `Ok(0)` without sending anything: an empty frame
/// carries no bytes and readers of this type skip it.
pub struct Conn<S: HostSocket> {
    inner: Arc<Inner<S>>,
    frames: FrameQueue,
    carry: Option<Bytes>,
    read_deadline: Option<Instant>,
    end: Option<CloseEvent>,
}

impl<S: HostSocket> Conn<S> {
    fn fail(self, err: Error) -> Error {
        #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
        if let Err(close_err) = self.inner.close() {
            wsconn_core::log_debug!(%close_err, "close after failed dial");
        }
        err
    }

    /// Send a text frame
    pub fn send_text(&self, text: &str) -> Result<()> {
        self.inner.socket.send_text(text)?;
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("wsconn_client_frames_sent_total").increment(1);
            metrics::counter!("wsconn_client_bytes_sent_total").increment(text.len() as u64);
        }
        Ok(())
    }

    /// Close the connection.
    ///
    /// Reads keep returning the frames the host delivers until its close
    /// event fires; pending and later reads then see the end of the stream.
    /// Closing again, or closing a transport the peer already closed, is
    /// harmless.
    pub fn close(&self) -> Result<()> {
        self.inner.close()
    }

    /// A handle that can close this connection from elsewhere, for example
    /// to unblock a thread parked in [`read`](Read::read)
    pub fn closer(&self) -> CloseHandle<S> {
        CloseHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Set the read deadline. Equivalent to [`set_read_deadline`](Self::set_read_deadline),
    /// since writes never block.
    pub fn set_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.set_read_deadline(deadline)
    }

    /// Set the deadline for subsequent reads. `None` disables it.
    ///
    /// A read that finds no data by the deadline fails with
    /// [`io::ErrorKind::TimedOut`]; the connection stays usable.
    pub fn set_read_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.read_deadline = deadline;
        Ok(())
    }

    /// Accepted for symmetry; writes hand data to the host and never block.
    pub fn set_write_deadline(&mut self, _deadline: Option<Instant>) -> Result<()> {
        Ok(())
    }

    /// The host exposes no local endpoint, so this always fails with
    /// [`Error::Unsupported`].
    pub fn local_addr(&self) -> Result<Addr> {
        Err(Error::Unsupported("local address"))
    }

    /// Remote address, parsed from the transport URL
    pub fn remote_addr(&self) -> Result<Addr> {
        Addr::parse(&self.inner.socket.url())
    }

    /// Current ready state of the transport
    pub fn ready_state(&self) -> ReadyState {
        self.inner.socket.ready_state()
    }

    /// Bytes written but not yet transmitted by the host
    pub fn buffered_amount(&self) -> u64 {
        self.inner.socket.buffered_amount()
    }

    /// URL as resolved by the host
    pub fn url(&self) -> String {
        self.inner.socket.url()
    }

    /// Subprotocol selected by the server
    pub fn protocol(&self) -> String {
        self.inner.socket.protocol()
    }

    /// The underlying event wrapper
    pub fn socket(&self) -> &WebSocket<S> {
        &self.inner.socket
    }

    fn finish(&self, event: &CloseEvent) -> io::Result<usize> {
        if event.was_clean {
            Ok(0)
        } else {
            Err(Error::Closed(event.clone()).into())
        }
    }
}

impl<S: HostSocket> Read for Conn<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if let Some(carry) = self.carry.as_mut() {
            let n = copy_into(carry, buf);
            if carry.is_empty() {
                self.carry = None;
            }
            if n > 0 {
                return Ok(n);
            }
        }

        if let Some(event) = &self.end {
            return self.finish(event);
        }

        loop {
            match self.frames.receive(self.read_deadline)? {
                Item::Frame(frame) => {
                    let mut payload = frame.into_payload();
                    if payload.is_empty() {
                        continue;
                    }

                    #[cfg(feature = "metrics")]
                    {
                        metrics::counter!("wsconn_client_frames_received_total").increment(1);
                        metrics::counter!("wsconn_client_bytes_received_total")
                            .increment(payload.len() as u64);
                    }

                    let n = copy_into(&mut payload, buf);
                    if !payload.is_empty() {
                        wsconn_core::log_trace!(kept = payload.len(), "partial frame read");
                        self.carry = Some(payload);
                    }
                    return Ok(n);
                }
                Item::End(event) => {
                    wsconn_core::log_debug!(%event, "end of stream");
                    self.inner.release();
                    let result = self.finish(&event);
                    self.end = Some(event);
                    return result;
                }
            }
        }
    }
}

impl<S: HostSocket> Write for Conn<S> {
    /// Send `buf` as one binary frame. An empty buffer returns `Ok(0)` and
    /// sends no frame.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.inner.socket.send_binary(buf)?;
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("wsconn_client_frames_sent_total").increment(1);
            metrics::counter!("wsconn_client_bytes_sent_total").increment(buf.len() as u64);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: HostSocket> Drop for Conn<S> {
    fn drop(&mut self) {
        let closed = if self.end.is_none()
            && matches!(self.ready_state(), ReadyState::Connecting | ReadyState::Open)
        {
            self.inner.close()
        } else {
            Ok(())
        };
        #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
        if let Err(err) = closed {
            wsconn_core::log_debug!(%err, "close on drop failed");
        }
        self.inner.release();
    }
}

impl<S: HostSocket> fmt::Debug for Conn<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conn")
            .field("url", &self.inner.socket.url())
            .field("ready_state", &self.inner.socket.ready_state())
            .field("carry", &self.carry.as_ref().map(Bytes::len))
            .field("read_deadline", &self.read_deadline)
            .field("end", &self.end)
            .finish()
    }
}

fn copy_into(src: &mut Bytes, dst: &mut [u8]) -> usize {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src.split_to(n));
    n
}

/// Closes a [`Conn`] from another owner or thread
pub struct CloseHandle<S: HostSocket> {
    inner: Arc<Inner<S>>,
}

impl<S: HostSocket> CloseHandle<S> {
    /// Same as [`Conn::close`]. A reader blocked on the connection wakes up
    /// once the host reports the close.
    pub fn close(&self) -> Result<()> {
        self.inner.close()
    }

    /// Whether the host has reported the close
    pub fn is_closed(&self) -> bool {
        self.inner.producer.has_ended()
    }
}

impl<S: HostSocket> Clone for CloseHandle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: HostSocket> fmt::Debug for CloseHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}
