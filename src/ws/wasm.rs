//! WASM WebSocket client using `web-sys::WebSocket`.
//!
//! - `web-sys::WebSocket` + `wasm-bindgen` closures
//! - Exponential backoff reconnection via `gloo-timers`
//! - Callback-based event system (`on_event: impl Fn(WsEvent)`)
//!
//! State lives in an `Rc<RefCell<_>>` owned by each [`WsClient`] (WASM is
//! single-threaded). JS callbacks hold a weak reference and are detached on
//! close. Like the native client, nothing is queued or replayed across a
//! reconnect.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

use crate::error::WsError;
use crate::feed::Channel;
use crate::ws::{backoff_delay_ms, MessageIn, MessageOut, ReadyState, WsConfig, WsEvent};

type EventCallback = Rc<dyn Fn(WsEvent)>;

struct Handlers {
    _onopen: Closure<dyn FnMut()>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
    _onerror: Closure<dyn FnMut(ErrorEvent)>,
    _onclose: Closure<dyn FnMut(CloseEvent)>,
}

struct Inner {
    config: WsConfig,
    on_event: Option<EventCallback>,
    ws: Option<WebSocket>,
    handlers: Option<Handlers>,
    /// Handlers of the last detached socket. One of them may still be on the
    /// stack when it is detached, so it is only dropped on the next detach.
    retired: Option<Handlers>,
    reconnect_timeout: Option<Timeout>,
    reconnect_scheduled: bool,
    reconnect_attempts: u32,
    closed_by_user: bool,
}

/// WASM WebSocket client.
///
/// Cloning is cheap and every clone drives the same socket, so one clone can
/// be handed to a [`ChartFeed`](crate::feed::ChartFeed) while another stays
/// with the page for `disconnect`.
#[derive(Clone)]
pub struct WsClient {
    inner: Rc<RefCell<Inner>>,
}

impl WsClient {
    /// Create the client and start connecting.
    ///
    /// `on_event` is called for every connection event (connected,
    /// disconnected, message, error, max reconnect reached). It may call
    /// back into the client.
    pub fn connect(config: WsConfig, on_event: impl Fn(WsEvent) + 'static) -> Self {
        let client = Self {
            inner: Rc::new(RefCell::new(Inner {
                config,
                on_event: Some(Rc::new(on_event)),
                ws: None,
                handlers: None,
                retired: None,
                reconnect_timeout: None,
                reconnect_scheduled: false,
                reconnect_attempts: 0,
                closed_by_user: false,
            })),
        };
        client.do_connect();
        client
    }

    /// Send a message if the socket is open.
    ///
    /// Never triggers a reconnect; returns `WsError::NotConnected` instead.
    pub fn send(&self, message: MessageOut) -> Result<(), WsError> {
        let frame = message.to_frame()?;
        let inner = self.inner.borrow();
        match inner.ws.as_ref() {
            Some(w) if ReadyState::from(w.ready_state()) == ReadyState::Open => {
                tracing::debug!("WS send: {}", message);
                w.send_with_str(&frame)
                    .map_err(|e| WsError::SendFailed(extract_js_error(&e)))
            }
            _ => {
                tracing::debug!("Cannot send {}: WebSocket not open", message);
                Err(WsError::NotConnected)
            }
        }
    }

    /// Force a fresh connection attempt.
    ///
    /// Closes any existing connection, cancels pending reconnection,
    /// resets the attempt counter, and initiates a new connection.
    pub fn restart_connection(&self) {
        if self.ready_state() == ReadyState::Connecting {
            tracing::info!("Already connecting, skipping restart");
            return;
        }

        tracing::info!("Manual reconnection requested");
        {
            let mut inner = self.inner.borrow_mut();
            detach(&mut inner);
            inner.reconnect_timeout = None;
            inner.reconnect_scheduled = false;
            inner.reconnect_attempts = 0;
            inner.closed_by_user = false;
        }
        self.do_connect();
    }

    /// Close the socket, cancel reconnection and drop the event callback.
    pub fn disconnect(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.closed_by_user = true;
        inner.reconnect_timeout = None;
        inner.reconnect_scheduled = false;
        detach(&mut inner);
        inner.on_event = None;
        tracing::info!("WebSocket disconnected by client");
    }

    pub fn is_connected(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    pub fn ready_state(&self) -> ReadyState {
        self.inner
            .try_borrow()
            .ok()
            .and_then(|inner| inner.ws.as_ref().map(|w| ReadyState::from(w.ready_state())))
            .unwrap_or(ReadyState::Closed)
    }

    // ── Internal ──────────────────────────────────────────────────────────

    fn dispatch(&self, event: WsEvent) {
        let callback = self.inner.borrow().on_event.clone();
        if let Some(f) = callback {
            f(event);
        }
    }

    fn downgrade(&self) -> Weak<RefCell<Inner>> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<RefCell<Inner>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn do_connect(&self) {
        match self.ready_state() {
            ReadyState::Connecting | ReadyState::Open => {
                tracing::info!("Already connected or connecting, skipping");
                return;
            }
            _ => {}
        }

        let (url, display_url) = {
            let inner = self.inner.borrow();
            (inner.config.connect_url(), inner.config.url.clone())
        };
        tracing::info!("Creating WebSocket connection to {}", display_url);

        match WebSocket::new(&url) {
            Err(err) => {
                let msg = extract_js_error(&err);
                tracing::error!("Failed to create WebSocket: {}", msg);
                self.dispatch(WsEvent::Error(format!("Failed to create WebSocket: {}", msg)));
                self.schedule_reconnect(false);
            }
            Ok(ws) => self.setup_connection(ws),
        }
    }

    fn setup_connection(&self, ws: WebSocket) {
        let weak = self.downgrade();
        let onopen = Closure::<dyn FnMut()>::new(move || {
            let Some(client) = Self::upgrade(&weak) else { return };
            tracing::info!("WebSocket opened");
            {
                let mut inner = client.inner.borrow_mut();
                inner.reconnect_attempts = 0;
                inner.reconnect_scheduled = false;
            }
            client.dispatch(WsEvent::Connected);
        });
        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));

        let weak = self.downgrade();
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |e: MessageEvent| {
            let Some(client) = Self::upgrade(&weak) else { return };
            let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() else {
                tracing::debug!("Ignoring non-text WS frame");
                return;
            };
            let txt: String = txt.into();

            match MessageIn::parse(&txt) {
                Ok(msg) => client.dispatch(WsEvent::Message(msg.kind)),
                Err(err) => {
                    tracing::warn!("WS frame rejected: {}, raw: {}", err, txt);
                    client.dispatch(WsEvent::Error(err.to_string()));
                }
            }
        });
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        let weak = self.downgrade();
        let onerror = Closure::<dyn FnMut(ErrorEvent)>::new(move |e: ErrorEvent| {
            let Some(client) = Self::upgrade(&weak) else { return };
            let msg = extract_js_error(&e.error());
            tracing::error!("WebSocket error: {}", msg);
            client.dispatch(WsEvent::Error(msg));
        });
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        let weak = self.downgrade();
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |e: CloseEvent| {
            let Some(client) = Self::upgrade(&weak) else { return };
            let (code, reason) = (e.code(), e.reason());
            tracing::info!("WebSocket closed: code={}, reason={}", code, reason);

            let retry = {
                let mut inner = client.inner.borrow_mut();
                detach(&mut inner);
                inner.config.reconnect && !inner.closed_by_user && code != 1000
            };
            client.dispatch(WsEvent::Disconnected {
                code: Some(code),
                reason,
            });
            if retry {
                client.schedule_reconnect(code == 1008);
            }
        });
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        let mut inner = self.inner.borrow_mut();
        inner.ws = Some(ws);
        inner.handlers = Some(Handlers {
            _onopen: onopen,
            _onmessage: onmessage,
            _onerror: onerror,
            _onclose: onclose,
        });
    }

    // ── Reconnection ──────────────────────────────────────────────────────

    fn schedule_reconnect(&self, is_rate_limit: bool) {
        let scheduled = {
            let mut inner = self.inner.borrow_mut();
            if inner.reconnect_scheduled {
                tracing::info!("Reconnect already scheduled, skipping");
                return;
            }

            inner.reconnect_attempts += 1;
            let max_attempts = inner.config.max_reconnect_attempts;
            if inner.reconnect_attempts > max_attempts {
                tracing::warn!("Max reconnection attempts ({}) exceeded", max_attempts);
                false
            } else {
                let (jitter_max, cap) = if is_rate_limit {
                    (1_000u32, 300_000u32)
                } else {
                    (500u32, 60_000u32)
                };
                let jitter = (js_sys::Math::random() * jitter_max as f64) as u32;
                let delay = backoff_delay_ms(
                    inner.config.base_reconnect_delay_ms,
                    inner.reconnect_attempts,
                    jitter,
                    cap,
                );

                tracing::info!(
                    "Scheduling reconnect attempt {} in {}ms (rate_limit: {})",
                    inner.reconnect_attempts,
                    delay,
                    is_rate_limit
                );

                let weak = self.downgrade();
                inner.reconnect_scheduled = true;
                inner.reconnect_timeout = Some(Timeout::new(delay, move || {
                    let Some(client) = Self::upgrade(&weak) else { return };
                    tracing::info!("Reconnect timeout fired");
                    client.inner.borrow_mut().reconnect_scheduled = false;
                    client.do_connect();
                }));
                true
            }
        };

        if !scheduled {
            self.dispatch(WsEvent::MaxReconnectReached);
        }
    }
}

impl Channel for WsClient {
    fn emit(&self, msg: MessageOut) -> Result<(), WsError> {
        self.send(msg)
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Detach callbacks from the current socket and close it if still open.
fn detach(inner: &mut Inner) {
    if let Some(w) = inner.ws.take() {
        w.set_onopen(None);
        w.set_onmessage(None);
        w.set_onerror(None);
        w.set_onclose(None);

        if ReadyState::from(w.ready_state()) == ReadyState::Open {
            let _ = w.close_with_code(1000);
        }
    }
    if let Some(handlers) = inner.handlers.take() {
        inner.retired = Some(handlers);
    }
}

fn extract_js_error(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        let name = error.name().as_string().unwrap_or_else(|| "Error".to_string());
        let message = error.message().as_string().unwrap_or_default();
        return if message.is_empty() {
            name
        } else {
            format!("{}: {}", name, message)
        };
    }

    if let Ok(json_str) = js_sys::JSON::stringify(err) {
        if let Some(s) = json_str.as_string() {
            if !s.is_empty() && s != "null" && s != "undefined" {
                return s;
            }
        }
    }

    match err.as_string() {
        Some(s) if !s.is_empty() => s,
        _ if err.is_undefined() => "undefined error".to_string(),
        _ if err.is_null() => "null error".to_string(),
        _ => "Unknown WebSocket error".to_string(),
    }
}
