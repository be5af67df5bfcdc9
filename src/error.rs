//! Unified feed error types.

use thiserror::Error;

/// Top-level feed error.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// WebSocket errors.
#[derive(Error, Debug)]
pub enum WsError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed {
        code: Option<u16>,
        reason: String,
    },
}

/// Errors raised while turning a decoded payload into typed points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Payload is not structured: {0:?}")]
    Unstructured(String),

    #[error("Unexpected payload shape: {0}")]
    Shape(String),

    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("Invalid candle at {time}: open={open} high={high} low={low} close={close}")]
    InvalidCandle {
        time: u64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("Expected a batch (array) payload")]
    NotABatch,
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Shape(e.to_string())
    }
}

/// Point Normalizer failures. Callers drop the offending point.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimestampError {
    #[error("Non-finite time value: {0}")]
    NotFinite(f64),

    #[error("Negative time value: {0}")]
    Negative(f64),

    #[error("Time value out of range: {0}")]
    OutOfRange(f64),

    #[error("Unparseable date: {0:?}")]
    Unparseable(String),
}

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid endpoint {0:?}: expected ws:// or wss://")]
    InvalidEndpoint(String),
}
