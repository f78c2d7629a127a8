//! In-memory host for testing
//!
//! [`MockHost`] behaves like a browser's `WebSocket` constructor without any
//! network: every socket gets its own dispatcher thread, so callbacks run
//! asynchronously relative to the code that registered them, exactly as
//! they would on a browser event loop. The server side of each connection is
//! driven through a [`MockRemote`].
//!
//! Opening is triggered the first time someone listens for `open`, which
//! stands in for "the script yielded to the event loop". Listeners that must
//! not miss the outcome are registered before that one.

use crate::error::{FaultKind, HostFault};
use crate::frame::{Frame, Payload};
use crate::host::{BinaryType, CloseEvent, EventKind, Host, HostEvent, HostSocket, Listener, ListenerId};
use crate::protocol::{constants, CloseCode, ReadyState};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Opening {
    Open,
    Hold,
    Refuse(CloseEvent),
}

/// Host that creates in-memory sockets
#[derive(Debug)]
pub struct MockHost {
    opening: Opening,
    echo: bool,
    accepted_tx: Sender<MockRemote>,
    accepted_rx: Receiver<MockRemote>,
}

impl MockHost {
    /// Host whose sockets open as soon as someone listens for `open`
    pub fn new() -> Self {
        let (accepted_tx, accepted_rx) = unbounded();
        Self {
            opening: Opening::Open,
            echo: false,
            accepted_tx,
            accepted_rx,
        }
    }

    /// Keep sockets in `Connecting` until [`MockRemote::open`] or
    /// [`MockRemote::refuse`] is called. Connections are handed to
    /// [`accept_timeout`](Self::accept_timeout) immediately.
    pub fn hold_open(mut self) -> Self {
        self.opening = Opening::Hold;
        self
    }

    /// Fail every connection before it opens, with an `error` event followed
    /// by the given close event
    pub fn refuse(mut self, event: CloseEvent) -> Self {
        self.opening = Opening::Refuse(event);
        self
    }

    /// Send every frame the client writes straight back to it
    pub fn echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Wait for the next connection to be established and return its server
    /// side
    pub fn accept_timeout(&self, timeout: Duration) -> Option<MockRemote> {
        let deadline = Instant::now() + timeout;
        let remote = self.accepted_rx.recv_deadline(deadline).ok()?;
        if !matches!(self.opening, Opening::Hold) {
            remote
                .shared
                .wait_until(deadline, |state| state.ready_state != ReadyState::Connecting)?;
        }
        Some(remote)
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MockHost {
    type Socket = MockSocket;

    fn connect(&self, url: &str, protocols: &[String]) -> Result<MockSocket, HostFault> {
        let url = resolve_url(url)?;
        validate_protocols(protocols)?;

        let shared = Arc::new(Shared::new(url, protocols.to_vec(), self.opening.clone(), self.echo));
        let (tasks, queue) = unbounded();

        let dispatcher = Arc::clone(&shared);
        thread::Builder::new()
            .name("mock-host-dispatch".to_string())
            .spawn(move || dispatcher.run(queue))
            .map_err(|e| HostFault::new(FaultKind::Other("Error".to_string()), e.to_string()))?;

        if !matches!(self.opening, Opening::Refuse(_)) {
            let _ = self.accepted_tx.send(MockRemote {
                shared: Arc::clone(&shared),
                tasks: tasks.clone(),
            });
        }

        Ok(MockSocket { shared, tasks })
    }
}

/// Browser-like URL checks: absolute ws/wss URL, no fragment. A URL with no
/// path gets `/` appended, as the browser does when it resolves it.
fn resolve_url(url: &str) -> Result<String, HostFault> {
    let rest = url
        .strip_prefix("ws://")
        .or_else(|| url.strip_prefix("wss://"))
        .ok_or_else(|| {
            HostFault::syntax(format!(
                "The URL's scheme must be either 'ws' or 'wss'. '{url}' is not allowed."
            ))
        })?;
    if url.contains('#') {
        return Err(HostFault::syntax(format!(
            "The URL contains a fragment identifier ('{url}')."
        )));
    }
    let authority = rest.split(['/', '?']).next().unwrap_or_default();
    if authority.is_empty() {
        return Err(HostFault::syntax(format!("The URL '{url}' is invalid.")));
    }
    if rest.len() == authority.len() || rest[authority.len()..].starts_with('?') {
        let (base, query) = url.split_at(url.len() - (rest.len() - authority.len()));
        return Ok(format!("{base}/{query}"));
    }
    Ok(url.to_string())
}

fn validate_protocols(protocols: &[String]) -> Result<(), HostFault> {
    for (i, protocol) in protocols.iter().enumerate() {
        let token = !protocol.is_empty()
            && protocol
                .bytes()
                .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b));
        if !token {
            return Err(HostFault::syntax(format!(
                "The subprotocol '{protocol}' is invalid."
            )));
        }
        if protocols[..i].contains(protocol) {
            return Err(HostFault::syntax(format!(
                "The subprotocol '{protocol}' is duplicated."
            )));
        }
    }
    Ok(())
}

enum Task {
    Dispatch(HostEvent),
    Flush(Sender<()>),
}

struct State {
    url: String,
    protocols: Vec<String>,
    protocol: String,
    ready_state: ReadyState,
    binary_type: BinaryType,
    listeners: Vec<(EventKind, ListenerId, Listener)>,
    next_id: u64,
    armed: bool,
    opening: Opening,
    echo: bool,
    sent: VecDeque<Frame>,
}

struct Shared {
    state: Mutex<State>,
    changed: Condvar,
}

impl Shared {
    fn new(url: String, protocols: Vec<String>, opening: Opening, echo: bool) -> Self {
        Self {
            state: Mutex::new(State {
                url,
                protocols,
                protocol: String::new(),
                ready_state: ReadyState::Connecting,
                binary_type: BinaryType::default(),
                listeners: Vec::new(),
                next_id: 0,
                armed: matches!(opening, Opening::Hold),
                opening,
                echo,
                sent: VecDeque::new(),
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_until<F>(&self, deadline: Instant, mut ready: F) -> Option<MutexGuard<'_, State>>
    where
        F: FnMut(&State) -> bool,
    {
        let mut state = self.lock();
        while !ready(&state) {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            state = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        Some(state)
    }

    fn run(&self, queue: Receiver<Task>) {
        for task in queue {
            match task {
                Task::Dispatch(event) => self.dispatch(event),
                Task::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
    }

    fn dispatch(&self, event: HostEvent) {
        let kind = event.kind();
        let targets: Vec<(ListenerId, Listener)> = {
            let mut state = self.lock();
            match &event {
                HostEvent::Open => {
                    if state.ready_state != ReadyState::Connecting {
                        return;
                    }
                    state.ready_state = ReadyState::Open;
                    state.protocol = state.protocols.first().cloned().unwrap_or_default();
                }
                HostEvent::Close(_) => {
                    if state.ready_state == ReadyState::Closed {
                        return;
                    }
                    state.ready_state = ReadyState::Closed;
                }
                HostEvent::Message(_) => {
                    if !matches!(state.ready_state, ReadyState::Open | ReadyState::Closing) {
                        return;
                    }
                }
                HostEvent::Error(_) => {}
            }
            self.changed.notify_all();
            state
                .listeners
                .iter()
                .filter(|(k, _, _)| *k == kind)
                .map(|(_, id, listener)| (*id, Arc::clone(listener)))
                .collect()
        };

        for (id, listener) in targets {
            // Listeners removed by an earlier listener of the same event are
            // skipped, as in DOM dispatch.
            let registered = self.lock().listeners.iter().any(|(_, i, _)| *i == id);
            if registered {
                listener(event.clone());
            }
        }
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Shared")
            .field("url", &state.url)
            .field("ready_state", &state.ready_state)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

/// Client side of an in-memory connection
#[derive(Debug)]
pub struct MockSocket {
    shared: Arc<Shared>,
    tasks: Sender<Task>,
}

impl MockSocket {
    fn enqueue(&self, event: HostEvent) {
        let _ = self.tasks.send(Task::Dispatch(event));
    }
}

impl HostSocket for MockSocket {
    fn add_event_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let mut state = self.shared.lock();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push((kind, id, listener));

        if !state.armed && kind == EventKind::Open {
            state.armed = true;
            match state.opening.clone() {
                Opening::Open => self.enqueue(HostEvent::Open),
                Opening::Refuse(event) => {
                    self.enqueue(HostEvent::Error("connection refused".to_string()));
                    self.enqueue(HostEvent::Close(event));
                }
                Opening::Hold => {}
            }
        }
        id
    }

    fn remove_event_listener(&self, kind: EventKind, id: ListenerId) {
        self.shared
            .lock()
            .listeners
            .retain(|(k, i, _)| !(*k == kind && *i == id));
    }

    fn send(&self, payload: Payload<'_>) -> Result<(), HostFault> {
        let mut state = self.shared.lock();
        if state.ready_state != ReadyState::Open {
            return Err(HostFault::invalid_state(format!(
                "Failed to execute 'send' on 'WebSocket': socket is {}.",
                state.ready_state
            )));
        }
        let frame = Frame::from(payload);
        if state.echo {
            self.enqueue(HostEvent::Message(frame.clone()));
        }
        state.sent.push_back(frame);
        self.shared.changed.notify_all();
        Ok(())
    }

    fn close(&self, code: u16, reason: &str) -> Result<(), HostFault> {
        if !CloseCode::from(code).is_sendable() {
            return Err(HostFault::new(
                FaultKind::InvalidAccess,
                format!("The close code must be either 1000, or between 3000 and 4999. {code} is neither."),
            ));
        }
        if reason.len() > constants::MAX_CLOSE_REASON {
            return Err(HostFault::syntax("The close reason must not be greater than 123 UTF-8 bytes."));
        }

        let mut state = self.shared.lock();
        match state.ready_state {
            ReadyState::Connecting => {
                state.ready_state = ReadyState::Closing;
                state.armed = true;
                self.enqueue(HostEvent::Error(
                    "WebSocket is closed before the connection is established.".to_string(),
                ));
                self.enqueue(HostEvent::Close(CloseEvent::new(
                    constants::ABNORMAL_CLOSURE,
                    "",
                    false,
                )));
            }
            ReadyState::Open => {
                state.ready_state = ReadyState::Closing;
                self.enqueue(HostEvent::Close(CloseEvent::new(code, reason, true)));
            }
            ReadyState::Closing | ReadyState::Closed => {}
        }
        self.shared.changed.notify_all();
        Ok(())
    }

    fn url(&self) -> String {
        self.shared.lock().url.clone()
    }

    fn ready_state(&self) -> ReadyState {
        self.shared.lock().ready_state
    }

    fn buffered_amount(&self) -> u64 {
        0
    }

    fn binary_type(&self) -> BinaryType {
        self.shared.lock().binary_type
    }

    fn set_binary_type(&self, binary_type: BinaryType) {
        self.shared.lock().binary_type = binary_type;
    }

    fn protocol(&self) -> String {
        self.shared.lock().protocol.clone()
    }

    fn extensions(&self) -> String {
        String::new()
    }
}

/// Server side of an in-memory connection
#[derive(Debug, Clone)]
pub struct MockRemote {
    shared: Arc<Shared>,
    tasks: Sender<Task>,
}

impl MockRemote {
    fn enqueue(&self, event: HostEvent) {
        let _ = self.tasks.send(Task::Dispatch(event));
    }

    /// Complete the opening handshake (for [`MockHost::hold_open`])
    pub fn open(&self) {
        self.enqueue(HostEvent::Open);
    }

    /// Fail the opening handshake (for [`MockHost::hold_open`])
    pub fn refuse(&self, event: CloseEvent) {
        self.enqueue(HostEvent::Error("connection refused".to_string()));
        self.enqueue(HostEvent::Close(event));
    }

    /// Deliver a text frame to the client
    pub fn send_text(&self, text: &str) {
        self.enqueue(HostEvent::Message(Frame::text(text)));
    }

    /// Deliver a binary frame to the client
    pub fn send_binary(&self, data: &[u8]) {
        self.enqueue(HostEvent::Message(Frame::from(Payload::Binary(data))));
    }

    /// Deliver a frame to the client
    pub fn send_frame(&self, frame: Frame) {
        self.enqueue(HostEvent::Message(frame));
    }

    /// Close the connection cleanly from the server side
    pub fn close(&self, code: u16, reason: &str) {
        self.enqueue(HostEvent::Close(CloseEvent::new(code, reason, true)));
    }

    /// Drop the connection without a closing handshake (code 1006)
    pub fn abort(&self) {
        self.enqueue(HostEvent::Error("connection lost".to_string()));
        self.enqueue(HostEvent::Close(CloseEvent::new(
            constants::ABNORMAL_CLOSURE,
            "",
            false,
        )));
    }

    /// Wait for the next frame written by the client
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Frame> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.wait_until(deadline, |state| !state.sent.is_empty())?;
        state.sent.pop_front()
    }

    /// Block until every event queued so far has been dispatched
    pub fn flush(&self) {
        let (done_tx, done_rx) = bounded(1);
        if self.tasks.send(Task::Flush(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }

    /// Wait until the connection reached `Closed`
    pub fn wait_closed(&self, timeout: Duration) -> bool {
        self.shared
            .wait_until(Instant::now() + timeout, |state| {
                state.ready_state == ReadyState::Closed
            })
            .is_some()
    }

    /// Current ready state of the connection
    pub fn ready_state(&self) -> ReadyState {
        self.shared.lock().ready_state
    }

    /// URL the client connected to
    pub fn url(&self) -> String {
        self.shared.lock().url.clone()
    }

    /// Subprotocols offered by the client
    pub fn protocols(&self) -> Vec<String> {
        self.shared.lock().protocols.clone()
    }

    /// Number of listeners the client currently has registered
    pub fn listener_count(&self) -> usize {
        self.shared.lock().listeners.len()
    }
}
