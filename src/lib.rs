//! # chartfeed
//!
//! A real-time chart feed client supporting both native and WASM targets.
//! It keeps one area or candlestick series in sync with historical backfill
//! pages and live ticks, and drives an opaque charting surface.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core** — Timestamps, domain models, errors, config (always available, WASM-safe)
//! 2. **Wire** — Channel frames, payload decoding, subscription parameters
//! 3. **Transport** — Compile-time dispatch: `tokio-tungstenite` (native) / `web-sys` (WASM)
//! 4. **Chart** — `ChartSurface` trait and the viewport policy
//! 5. **Feed** — `ChartFeed`, the subscription state machine tying it all together
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chartfeed::prelude::*;
//!
//! let config = FeedConfig::from_env()?;
//! let mut client = WsClient::new(config.ws_config());
//! client.connect().await?;
//!
//! let mut feed = ChartFeed::new(&client, my_surface);
//! let mut events = client.events();
//! while let Some(event) = events.next().await {
//!     feed.handle_event(event);
//! }
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes and the timestamp normalizer.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Unified error types.
pub mod error;

/// Network defaults and environment variable names.
pub mod network;

/// Process-start configuration.
pub mod config;

// ── Layers 2–3: Wire + transport ─────────────────────────────────────────────

/// WebSocket client: frames, payload codec, subscriptions, events.
pub mod ws;

// ── Layer 4: Chart ───────────────────────────────────────────────────────────

/// Rendering surface seam and viewport controller.
pub mod chart;

// ── Layer 5: Feed ────────────────────────────────────────────────────────────

/// `ChartFeed` — the primary entry point.
pub mod feed;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{ChartType, RawTime, Symbol, Timestamp, Topic};

    // Domain types — series
    pub use crate::domain::series::{
        AreaPoint, Batch, CandlePoint, LiveUpdate, SeriesBuffer, SeriesPoint, Tick, TickPoint,
    };

    // Domain types — session
    pub use crate::domain::session::{SessionState, UserReadyPayload};

    // Errors
    pub use crate::error::{ConfigError, DecodeError, FeedError, TimestampError, WsError};

    // Config + network
    pub use crate::config::FeedConfig;
    pub use crate::network::DEFAULT_WS_URL;

    // WebSocket types
    pub use crate::ws::{
        Decoded, EncodedPayload, Kind, MessageIn, MessageOut, ReadyState, WsConfig, WsEvent,
    };

    #[cfg(feature = "ws-native")]
    pub use crate::ws::native::WsClient;
    #[cfg(all(feature = "ws-wasm", not(feature = "ws-native")))]
    pub use crate::ws::wasm::WsClient;

    // Chart
    pub use crate::chart::{
        ChartSurface, Granularity, TickFormat, TimeRange, ViewportConfig, ViewportController,
    };

    // Feed
    pub use crate::feed::{ActiveSeries, Channel, ChartFeed, FeedState, FeedStats};
}
