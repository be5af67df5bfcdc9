//! Chart feed: the subscription manager wiring channel events to a surface.
//!
//! [`ChartFeed`] owns the active series buffer and is driven by pushing
//! [`WsEvent`]s into [`ChartFeed::handle_event`]. Each event is handled inline:
//! decode, normalize, reconcile or apply, then redraw and reframe.
//!
//! ```text
//! Idle ──Connected──▶ AwaitingReady ──user-ready──▶ Subscribed(topic)
//!  ▲  └──Connected (topic known)───────────────────────────▲ │
//!  └───────────────Disconnected / teardown─────────────────┴─┘
//! ```
//!
//! Only one topic is ever live. Switching topics unsubscribes the old one and
//! resets the buffer before the new backfill and subscription are requested.

pub mod channel;
pub mod state;

pub use channel::Channel;
pub use state::{ActiveSeries, FeedState, FeedStats};

use crate::chart::{ChartSurface, ViewportConfig, ViewportController};
use crate::domain::series::{decode_batch, decode_tick, Batch, LiveUpdate, TickPoint};
use crate::domain::session::{SessionState, UserReadyPayload};
use crate::shared::{ChartType, Timestamp, Topic};
use crate::ws::{EncodedPayload, Kind, MessageOut, WsEvent};
use serde_json::Value;

type Clock = Box<dyn Fn() -> Timestamp + Send + Sync>;

/// Keeps one chart series in sync with the server.
pub struct ChartFeed<C: Channel, S: ChartSurface> {
    channel: C,
    surface: S,
    viewport: ViewportController,
    clock: Clock,
    state: FeedState,
    session: SessionState,
    /// Topic picked by the user; wins over the server's `lastAsset`.
    selection: Option<Topic>,
    series: ActiveSeries,
    earliest: Option<Timestamp>,
    stats: FeedStats,
    closed: bool,
}

impl<C: Channel, S: ChartSurface> ChartFeed<C, S> {
    pub fn new(channel: C, surface: S) -> Self {
        Self {
            channel,
            surface,
            viewport: ViewportController::default(),
            clock: Box::new(Timestamp::now),
            state: FeedState::Idle,
            session: SessionState::new(),
            selection: None,
            series: ActiveSeries::default(),
            earliest: None,
            stats: FeedStats::default(),
            closed: false,
        }
    }

    /// Replace the wall clock used to anchor the first backfill request.
    pub fn with_clock(mut self, clock: impl Fn() -> Timestamp + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_viewport(mut self, config: ViewportConfig) -> Self {
        self.viewport = ViewportController::new(config);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn series(&self) -> &ActiveSeries {
        &self.series
    }

    /// Earliest timestamp seen for the active subscription.
    pub fn earliest(&self) -> Option<Timestamp> {
        self.earliest
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    pub fn active_topic(&self) -> Option<&Topic> {
        self.state.topic()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn status_line(&self) -> String {
        self.session.status_line(self.active_topic())
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    // ── Events ───────────────────────────────────────────────────────────

    /// Handle one event from the transport. Never fails; anything skipped is
    /// logged and counted in [`FeedStats`].
    pub fn handle_event(&mut self, event: WsEvent) {
        if self.closed {
            tracing::debug!("Feed torn down, ignoring {:?}", event);
            return;
        }

        match event {
            WsEvent::Connected => self.on_connected(),
            WsEvent::Disconnected { code, reason } => {
                tracing::info!("Disconnected (code={:?}, reason={})", code, reason);
                self.on_disconnected();
            }
            WsEvent::Message(kind) => self.on_message(kind),
            WsEvent::Error(e) => tracing::warn!("Channel error: {}", e),
            WsEvent::MaxReconnectReached => {
                tracing::error!("Channel gave up reconnecting");
                self.session.connected = false;
            }
        }
    }

    /// Switch to `topic`. Before the first subscription the choice is kept
    /// and used when the feed bootstraps.
    pub fn select(&mut self, topic: Topic) {
        if self.closed {
            return;
        }

        self.selection = Some(topic.clone());
        match &self.state {
            FeedState::Subscribed(current) if *current == topic => {
                tracing::debug!("Already subscribed to {}", topic);
            }
            FeedState::Subscribed(_) => self.transition(topic),
            FeedState::Idle | FeedState::AwaitingReady => {
                tracing::debug!("Selection {} pending until bootstrap", topic);
            }
        }
    }

    /// Ask for the page before the earliest point held.
    ///
    /// Returns `false` when there is no subscription or nothing is loaded yet.
    pub fn request_more_old(&mut self) -> bool {
        let (Some(topic), Some(earliest)) = (self.state.topic().cloned(), self.earliest) else {
            return false;
        };
        self.emit(MessageOut::request_older_data(&topic, earliest))
    }

    /// The container was resized.
    pub fn handle_resize(&mut self) {
        self.viewport.on_resize(&mut self.surface);
    }

    /// The visible range changed (pan or zoom).
    pub fn handle_range_change(&mut self) {
        self.viewport.on_range_change(&mut self.surface);
    }

    /// Unsubscribe, drop buffered data and stop reacting to events.
    pub fn teardown(&mut self) {
        if let FeedState::Subscribed(topic) = std::mem::take(&mut self.state) {
            self.emit(MessageOut::unsubscribe(&topic));
            tracing::info!("Unsubscribed from {} on teardown", topic);
        }
        self.reset_series(self.series.chart_type());
        self.selection = None;
        self.closed = true;
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    fn on_connected(&mut self) {
        self.session.connected = true;

        match &self.state {
            FeedState::Subscribed(topic) => {
                tracing::debug!("Connected while subscribed to {}, ignoring", topic);
            }
            FeedState::Idle | FeedState::AwaitingReady => match self.known_topic() {
                Some(topic) => {
                    tracing::info!("Connected, resuming {}", topic);
                    self.transition(topic);
                }
                None => {
                    tracing::info!("Connected, requesting user configuration");
                    self.emit(MessageOut::UserInit);
                    self.state = FeedState::AwaitingReady;
                }
            },
        }
    }

    fn on_disconnected(&mut self) {
        self.session.connected = false;
        if let FeedState::Subscribed(topic) = std::mem::take(&mut self.state) {
            self.emit(MessageOut::unsubscribe(&topic));
        }
        self.reset_series(self.series.chart_type());
    }

    fn on_user_ready(&mut self, payload: UserReadyPayload) {
        tracing::info!(
            "User ready: lastAsset={} chartType={}",
            payload.last_asset,
            payload.chart_type
        );
        self.session.apply_ready(&payload);

        if self.state == FeedState::Idle {
            tracing::debug!("User ready while idle, topic kept for the next connect");
            return;
        }
        if let Some(topic) = self.known_topic() {
            if self.state.topic() != Some(&topic) {
                self.transition(topic);
            }
        }
    }

    fn known_topic(&self) -> Option<Topic> {
        self.selection.clone().or_else(|| self.session.topic())
    }

    fn transition(&mut self, topic: Topic) {
        if let FeedState::Subscribed(current) = std::mem::take(&mut self.state) {
            self.emit(MessageOut::unsubscribe(&current));
        }

        self.surface.clear();
        self.surface.set_series_kind(topic.chart_type);
        self.reset_series(topic.chart_type);

        let anchor = self.earliest.unwrap_or_else(|| (self.clock)());
        self.emit(MessageOut::request_older_data(&topic, anchor));
        self.emit(MessageOut::subscribe(&topic));

        tracing::info!("Subscribed to {} (backfill before {})", topic, anchor);
        self.state = FeedState::Subscribed(topic);
    }

    fn reset_series(&mut self, chart_type: ChartType) {
        self.series = ActiveSeries::empty(chart_type);
        self.earliest = None;
    }

    fn emit(&mut self, msg: MessageOut) -> bool {
        let event = msg.event();
        tracing::debug!("-> {}", msg);
        match self.channel.emit(msg) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to emit {}: {}", event, e);
                self.stats.failed_emits += 1;
                false
            }
        }
    }

    // ── Data ─────────────────────────────────────────────────────────────

    fn on_message(&mut self, kind: Kind) {
        match kind {
            Kind::UserReady(payload) => self.on_user_ready(payload),
            Kind::UpdateOldData(payload) => self.on_backfill(&payload),
            Kind::UpdateStream(payload) => self.on_tick(&payload),
            Kind::Unknown { event, .. } => tracing::debug!("Ignoring unknown event {}", event),
        }
    }

    fn on_backfill(&mut self, payload: &EncodedPayload) {
        let Some(topic) = self.state.topic() else {
            tracing::debug!("Backfill outside a subscription, ignoring");
            return;
        };
        let topic = topic.clone();

        let Some(value) = self.structured(payload, "backfill") else {
            return;
        };
        let decoded = match decode_batch(&topic, &value) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("Undecodable backfill: {}", e);
                self.stats.undecodable_payloads += 1;
                return;
            }
        };

        if decoded.dropped > 0 {
            tracing::warn!("Dropped {} invalid point(s) from backfill", decoded.dropped);
            self.stats.dropped_points += decoded.dropped as u64;
        }
        if decoded.stale > 0 {
            tracing::warn!("Dropped {} stale point(s) not for {}", decoded.stale, topic);
            self.stats.stale_points += decoded.stale as u64;
        }
        if decoded.batch.is_empty() {
            tracing::debug!("Empty backfill page");
            return;
        }

        match (&mut self.series, decoded.batch) {
            (ActiveSeries::Area(buf), Batch::Area(points)) => {
                self.earliest = buf.merge_backfill(&points);
                self.surface.set_area_data(buf.points());
            }
            (ActiveSeries::Candle(buf), Batch::Candle(points)) => {
                self.earliest = buf.merge_backfill(&points);
                self.surface.set_candle_data(buf.points());
            }
            (series, batch) => {
                tracing::warn!(
                    "Backfill of {} does not match active {} series",
                    batch.chart_type(),
                    series.chart_type()
                );
                return;
            }
        }

        tracing::debug!("Backfill merged, {} point(s) held", self.series.len());
        self.viewport.on_bulk_load(&mut self.surface, self.series.bounds());
    }

    fn on_tick(&mut self, payload: &EncodedPayload) {
        let Some(topic) = self.state.topic() else {
            tracing::debug!("Tick outside a subscription, ignoring");
            return;
        };
        let (chart_type, symbol) = (topic.chart_type, topic.symbol.clone());

        let Some(value) = self.structured(payload, "tick") else {
            return;
        };
        let tick = match decode_tick(chart_type, &value) {
            Ok(tick) => tick,
            Err(e) => {
                tracing::warn!("Dropping malformed payload: {}", e);
                self.stats.malformed_ticks += 1;
                return;
            }
        };

        if let Some(tagged) = tick.symbol.as_ref().filter(|s| **s != symbol) {
            tracing::debug!("Dropping stale tick for {} (active {})", tagged, symbol);
            self.stats.stale_ticks += 1;
            return;
        }

        let outcome = match (&mut self.series, tick.point) {
            (ActiveSeries::Area(buf), TickPoint::Area(point)) => {
                let outcome = buf.apply_live(point);
                if outcome.is_applied() {
                    self.surface.update_area(point);
                }
                outcome
            }
            (ActiveSeries::Candle(buf), TickPoint::Candle(point)) => {
                let outcome = buf.apply_live(point);
                if outcome.is_applied() {
                    self.surface.update_candle(point);
                }
                outcome
            }
            _ => {
                tracing::warn!("Tick does not match active {} series", chart_type);
                self.stats.malformed_ticks += 1;
                return;
            }
        };

        if let LiveUpdate::OutOfOrder { last } = outcome {
            tracing::warn!(
                "Dropping out-of-order tick at {} (last {})",
                tick.point.time(),
                last
            );
            self.stats.out_of_order_ticks += 1;
            return;
        }

        self.earliest = self.series.earliest();
        self.viewport.on_live_update(&mut self.surface);
    }

    fn structured(&mut self, payload: &EncodedPayload, what: &str) -> Option<Value> {
        match payload.decode().into_structured() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Undecodable {}: {}", what, e);
                self.stats.undecodable_payloads += 1;
                None
            }
        }
    }
}
