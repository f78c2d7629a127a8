//! Browser `WebSocket` host
//!
//! Listeners are attached with `addEventListener`, each through its own
//! [`Closure`] kept alive in the socket until it is removed or the socket is
//! dropped. Exceptions thrown by the browser become [`HostFault`]s classified
//! by the exception's `name`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wsconn_core::{
    BinaryType, CloseEvent, EventKind, FaultKind, Frame, Host, HostEvent, HostFault, HostSocket,
    Listener, ListenerId, Payload, ReadyState,
};

type EventClosure = Closure<dyn FnMut(web_sys::Event)>;

/// Creates sockets with the browser's `WebSocket` constructor
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHost;

impl BrowserHost {
    /// Create a new browser host
    pub fn new() -> Self {
        Self
    }
}

impl Host for BrowserHost {
    type Socket = BrowserSocket;

    fn connect(&self, url: &str, protocols: &[String]) -> Result<BrowserSocket, HostFault> {
        let ws = if protocols.is_empty() {
            web_sys::WebSocket::new(url)
        } else {
            let protocols = protocols
                .iter()
                .map(|p| JsValue::from_str(p))
                .collect::<js_sys::Array>();
            web_sys::WebSocket::new_with_str_sequence(url, &protocols)
        }
        .map_err(fault_from_js)?;

        Ok(BrowserSocket::new(ws))
    }
}

/// A browser `WebSocket` with its registered listeners
pub struct BrowserSocket {
    ws: web_sys::WebSocket,
    listeners: RefCell<HashMap<ListenerId, (EventKind, EventClosure)>>,
    next_id: Cell<u64>,
}

impl BrowserSocket {
    /// Take over an existing `WebSocket` object
    pub fn new(ws: web_sys::WebSocket) -> Self {
        Self {
            ws,
            listeners: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    /// The underlying `WebSocket` object
    pub fn inner(&self) -> &web_sys::WebSocket {
        &self.ws
    }
}

impl HostSocket for BrowserSocket {
    fn add_event_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            if let Some(event) = convert_event(kind, &event) {
                listener(event);
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
        if let Err(err) = self
            .ws
            .add_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref())
        {
            wsconn_core::log_warn!(%kind, fault = %fault_from_js(err), "addEventListener failed");
        }

        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().insert(id, (kind, closure));
        id
    }

    fn remove_event_listener(&self, kind: EventKind, id: ListenerId) {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            match listeners.get(&id) {
                Some((registered, _)) if *registered == kind => listeners.remove(&id),
                _ => None,
            }
        };
        if let Some((_, closure)) = removed {
            let _ = self
                .ws
                .remove_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref());
        }
    }

    fn send(&self, payload: Payload<'_>) -> Result<(), HostFault> {
        match payload {
            Payload::Text(text) => self.ws.send_with_str(text),
            Payload::Binary(data) => self.ws.send_with_u8_array(data),
        }
        .map_err(fault_from_js)
    }

    fn close(&self, code: u16, reason: &str) -> Result<(), HostFault> {
        self.ws
            .close_with_code_and_reason(code, reason)
            .map_err(fault_from_js)
    }

    fn url(&self) -> String {
        self.ws.url()
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::from_u16(self.ws.ready_state())
    }

    fn buffered_amount(&self) -> u64 {
        u64::from(self.ws.buffered_amount())
    }

    fn binary_type(&self) -> BinaryType {
        match self.ws.binary_type() {
            web_sys::BinaryType::Arraybuffer => BinaryType::ArrayBuffer,
            _ => BinaryType::Blob,
        }
    }

    fn set_binary_type(&self, binary_type: BinaryType) {
        self.ws.set_binary_type(match binary_type {
            BinaryType::ArrayBuffer => web_sys::BinaryType::Arraybuffer,
            BinaryType::Blob => web_sys::BinaryType::Blob,
        });
    }

    fn protocol(&self) -> String {
        self.ws.protocol()
    }

    fn extensions(&self) -> String {
        self.ws.extensions()
    }
}

impl Drop for BrowserSocket {
    fn drop(&mut self) {
        // Detach before the closures are freed; the browser may still fire.
        for (_, (kind, closure)) in self.listeners.get_mut().drain() {
            let _ = self
                .ws
                .remove_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref());
        }
    }
}

impl fmt::Debug for BrowserSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSocket")
            .field("url", &self.ws.url())
            .field("ready_state", &self.ready_state())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

fn convert_event(kind: EventKind, event: &web_sys::Event) -> Option<HostEvent> {
    match kind {
        EventKind::Open => Some(HostEvent::Open),
        EventKind::Error => Some(HostEvent::Error(
            event
                .dyn_ref::<web_sys::ErrorEvent>()
                .map(|e| e.message())
                .unwrap_or_else(|| event.type_()),
        )),
        EventKind::Close => {
            let event = event.dyn_ref::<web_sys::CloseEvent>()?;
            Some(HostEvent::Close(CloseEvent::new(
                event.code(),
                event.reason(),
                event.was_clean(),
            )))
        }
        EventKind::Message => {
            let event = event.dyn_ref::<web_sys::MessageEvent>()?;
            frame_from_data(&event.data()).map(HostEvent::Message)
        }
    }
}

/// Convert `MessageEvent.data` into a frame. Strings become text frames and
/// `ArrayBuffer`s binary frames; a `Blob` cannot be read synchronously and is
/// dropped.
pub fn frame_from_data(data: &JsValue) -> Option<Frame> {
    if let Some(buffer) = data.dyn_ref::<js_sys::ArrayBuffer>() {
        return Some(Frame::binary(js_sys::Uint8Array::new(buffer).to_vec()));
    }
    if let Some(text) = data.as_string() {
        return Some(Frame::text(text));
    }
    wsconn_core::log_warn!("dropping message that is neither text nor ArrayBuffer");
    None
}

/// Classify a thrown JavaScript value
pub fn fault_from_js(value: JsValue) -> HostFault {
    if let Some(exception) = value.dyn_ref::<web_sys::DomException>() {
        return HostFault::new(FaultKind::from_name(&exception.name()), exception.message());
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return HostFault::new(
            FaultKind::from_name(&String::from(error.name())),
            String::from(error.message()),
        );
    }
    let message = value.as_string().unwrap_or_else(|| format!("{value:?}"));
    HostFault::new(FaultKind::Other("Error".to_string()), message)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_bad_scheme_is_syntax_fault() {
        let fault = BrowserHost::new()
            .connect("blah://blah.example/invalid", &[])
            .unwrap_err();
        assert_eq!(fault.kind, FaultKind::Syntax);
    }

    #[wasm_bindgen_test]
    fn test_socket_attributes_and_listeners() {
        let socket = BrowserHost::new()
            .connect("ws://127.0.0.1:9/", &["chat".to_string()])
            .unwrap();
        assert_eq!(socket.url(), "ws://127.0.0.1:9/");
        assert_eq!(socket.ready_state(), ReadyState::Connecting);
        assert_eq!(socket.binary_type(), BinaryType::Blob);
        socket.set_binary_type(BinaryType::ArrayBuffer);
        assert_eq!(socket.binary_type(), BinaryType::ArrayBuffer);

        let id = socket.add_event_listener(EventKind::Message, Arc::new(|_| {}));
        assert_eq!(socket.listeners.borrow().len(), 1);
        socket.remove_event_listener(EventKind::Close, id);
        assert_eq!(socket.listeners.borrow().len(), 1);
        socket.remove_event_listener(EventKind::Message, id);
        assert!(socket.listeners.borrow().is_empty());

        let fault = socket.send(Payload::Text("early")).unwrap_err();
        assert_eq!(fault.kind, FaultKind::InvalidState);
    }

    #[wasm_bindgen_test]
    fn test_close_code_is_validated() {
        let socket = BrowserHost::new().connect("ws://127.0.0.1:9/", &[]).unwrap();
        let fault = socket.close(1001, "").unwrap_err();
        assert_eq!(fault.kind, FaultKind::InvalidAccess);
        socket.close(1000, "").unwrap();
        assert_eq!(socket.ready_state(), ReadyState::Closing);
    }

    #[wasm_bindgen_test]
    fn test_events_wait_for_the_event_loop() {
        let socket = BrowserHost::new().connect("ws://127.0.0.1:9/", &[]).unwrap();
        let closed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&closed);
        socket.add_event_listener(
            EventKind::Close,
            Arc::new(move |_| flag.store(true, Ordering::SeqCst)),
        );

        // The close event is queued as a task; this thread has to return to
        // the event loop before it runs, so blocking here would never see it.
        socket.close(1000, "").unwrap();
        assert_eq!(socket.ready_state(), ReadyState::Closing);
        assert!(!closed.load(Ordering::SeqCst));
    }

    #[wasm_bindgen_test]
    fn test_frame_from_data() {
        assert_eq!(frame_from_data(&JsValue::from_str("hi")), Some(Frame::text("hi")));
        let bytes = js_sys::Uint8Array::from(&[1u8, 2, 3][..]);
        assert_eq!(
            frame_from_data(&bytes.buffer().into()),
            Some(Frame::binary(vec![1u8, 2, 3]))
        );
        assert_eq!(frame_from_data(&JsValue::NULL), None);
    }

    #[wasm_bindgen_test]
    fn test_fault_from_dom_exception() {
        let exception =
            web_sys::DomException::new_with_message_and_name("bad", "SecurityError").unwrap();
        let fault = fault_from_js(exception.into());
        assert_eq!(fault.kind, FaultKind::Security);
        assert_eq!(fault.message, "bad");

        let fault = fault_from_js(JsValue::from_str("thrown string"));
        assert_eq!(fault.message, "thrown string");
    }
}
