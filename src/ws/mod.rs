//! WebSocket layer: messages, subscriptions, events.
//!
//! The actual WS transport is compile-time dispatched:
//! - `ws-native` feature → `tokio-tungstenite` (native.rs)
//! - `ws-wasm` feature → `web-sys::WebSocket` (wasm.rs)
//!
//! Both export a `WsClient` implementing [`crate::feed::Channel`].
//! This module defines the shared frame/message/event types.
//!
//! A frame is a JSON text message shaped like a socket event packet:
//! `["event"]` or `["event", payload]`.

pub mod codec;
pub mod subscriptions;

#[cfg(feature = "ws-native")]
pub mod native;

#[cfg(feature = "ws-wasm")]
pub mod wasm;

use crate::domain::session::UserReadyPayload;
use crate::error::WsError;
use crate::shared::{Timestamp, Topic};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

pub use codec::{decode_char_codes, Decoded, EncodedPayload};
pub use subscriptions::{OlderDataParams, SubscribeParams, Subscription, UnsubscribeParams};

/// Event names used on the channel.
pub mod events {
    pub const USER_INIT: &str = "userInit";
    pub const USER_READY: &str = "user-ready";
    pub const UPDATE_OLD_DATA: &str = "updateOldData";
    pub const UPDATE_STREAM: &str = "updateStream";
    pub const SUBSCRIBE: &str = "subscribe";
    pub const UNSUBSCRIBE: &str = "unsubscribe";
    pub const REQUEST_OLDER_DATA: &str = "requestOlderData";
}

// ─── Outbound messages ───────────────────────────────────────────────────────

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOut {
    UserInit,
    Subscribe(SubscribeParams),
    Unsubscribe(UnsubscribeParams),
    RequestOlderData(OlderDataParams),
}

impl MessageOut {
    pub fn subscribe(topic: &Topic) -> Self {
        MessageOut::Subscribe(topic.to_subscribe_params())
    }

    pub fn unsubscribe(topic: &Topic) -> Self {
        MessageOut::Unsubscribe(topic.to_unsubscribe_params())
    }

    pub fn request_older_data(topic: &Topic, first_time: Timestamp) -> Self {
        MessageOut::RequestOlderData(topic.to_older_data_params(first_time))
    }

    pub fn event(&self) -> &'static str {
        match self {
            MessageOut::UserInit => events::USER_INIT,
            MessageOut::Subscribe(_) => events::SUBSCRIBE,
            MessageOut::Unsubscribe(_) => events::UNSUBSCRIBE,
            MessageOut::RequestOlderData(_) => events::REQUEST_OLDER_DATA,
        }
    }

    /// Serialize to the text frame sent on the socket.
    pub fn to_frame(&self) -> Result<String, WsError> {
        serde_json::to_string(self).map_err(|e| WsError::SendFailed(e.to_string()))
    }
}

impl Serialize for MessageOut {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if matches!(self, MessageOut::UserInit) { 1 } else { 2 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(self.event())?;
        match self {
            MessageOut::UserInit => {}
            MessageOut::Subscribe(p) => seq.serialize_element(p)?,
            MessageOut::Unsubscribe(p) => seq.serialize_element(p)?,
            MessageOut::RequestOlderData(p) => seq.serialize_element(p)?,
        }
        seq.end()
    }
}

impl std::fmt::Display for MessageOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageOut::UserInit => write!(f, "{}", self.event()),
            MessageOut::Subscribe(p) => write!(f, "{} {}:{}", self.event(), p.symbol, p.chart_type),
            MessageOut::Unsubscribe(p) => {
                write!(f, "{} {}:{}", self.event(), p.symbol, p.chart_type)
            }
            MessageOut::RequestOlderData(p) => write!(
                f,
                "{} {}:{} before {}",
                self.event(),
                p.symbol,
                p.chart_type,
                p.first_time
            ),
        }
    }
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// Raw inbound message from the server.
#[derive(Debug, Clone)]
pub struct MessageIn {
    pub kind: Kind,
}

impl MessageIn {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, WsError> {
        let parts: Vec<Value> = serde_json::from_str(text)
            .map_err(|e| WsError::DeserializationError(e.to_string()))?;

        let mut parts = parts.into_iter();
        let event = match parts.next() {
            Some(Value::String(event)) => event,
            other => {
                return Err(WsError::ProtocolError(format!(
                    "frame must start with an event name, got {:?}",
                    other
                )))
            }
        };

        let kind = Kind::from_parts(event, parts.next())?;
        Ok(Self { kind })
    }
}

/// The type of inbound channel message.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    UserReady(UserReadyPayload),
    UpdateOldData(EncodedPayload),
    UpdateStream(EncodedPayload),
    Unknown { event: String, payload: Option<Value> },
}

impl Kind {
    pub fn from_parts(event: String, payload: Option<Value>) -> Result<Self, WsError> {
        let kind = if event == events::USER_READY {
            Kind::UserReady(deserialize(required(&event, payload)?)?)
        } else if event == events::UPDATE_OLD_DATA {
            Kind::UpdateOldData(deserialize(required(&event, payload)?)?)
        } else if event == events::UPDATE_STREAM {
            Kind::UpdateStream(deserialize(required(&event, payload)?)?)
        } else {
            Kind::Unknown { event, payload }
        };
        Ok(kind)
    }
}

fn required(event: &str, payload: Option<Value>) -> Result<Value, WsError> {
    payload.ok_or_else(|| WsError::ProtocolError(format!("{} without payload", event)))
}

fn deserialize<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, WsError> {
    serde_json::from_value(value).map_err(|e| WsError::DeserializationError(e.to_string()))
}

// ─── WsEvent ─────────────────────────────────────────────────────────────────

/// High-level events emitted by the WS client to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    /// A parsed message from the server.
    Message(Kind),
    /// Connection established.
    Connected,
    /// Connection lost (may trigger reconnect).
    Disconnected { code: Option<u16>, reason: String },
    /// A deserialization, protocol or connection error.
    Error(String),
    /// Reconnection gave up after `max_reconnect_attempts`.
    MaxReconnectReached,
}

// ─── ReadyState ──────────────────────────────────────────────────────────────

/// Connection state, numbered like the browser `WebSocket.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl From<u16> for ReadyState {
    fn from(value: u16) -> Self {
        match value {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

// ─── WsConfig ────────────────────────────────────────────────────────────────

/// Configuration for the WS client.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Shared secret, sent as the `secret` query parameter.
    pub secret: Option<String>,
    pub reconnect: bool,
    pub base_reconnect_delay_ms: u32,
    pub max_reconnect_attempts: u32,
    pub connect_timeout_ms: u64,
}

impl WsConfig {
    /// The URL actually dialed, with the secret appended.
    pub fn connect_url(&self) -> String {
        match self.secret.as_deref() {
            Some(secret) if !secret.is_empty() => {
                let sep = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{}secret={}", self.url, sep, urlencoding::encode(secret))
            }
            _ => self.url.clone(),
        }
    }
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            secret: None,
            reconnect: true,
            base_reconnect_delay_ms: 1_000,
            max_reconnect_attempts: 10,
            connect_timeout_ms: 30_000,
        }
    }
}

/// Exponential backoff with a jitter term, capped.
///
/// `attempt` is 1-based; the exponent stops growing after 10 doublings.
pub(crate) fn backoff_delay_ms(base_ms: u32, attempt: u32, jitter_ms: u32, cap_ms: u32) -> u32 {
    let exp = attempt.saturating_sub(1).min(10);
    base_ms
        .saturating_mul(1u32 << exp)
        .saturating_add(jitter_ms)
        .min(cap_ms)
}
