//! End-to-end tests for `ChartFeed`: a recording channel and a recording
//! surface stand in for the transport and the chart.

use std::cell::{Cell, RefCell};

use serde_json::{json, Value};

use chartfeed::chart::{ChartSurface, Granularity, TickFormat, TimeRange};
use chartfeed::domain::series::{AreaPoint, CandlePoint};
use chartfeed::domain::session::UserReadyPayload;
use chartfeed::error::WsError;
use chartfeed::feed::{ActiveSeries, Channel, ChartFeed, FeedState, FeedStats};
use chartfeed::shared::{ChartType, Symbol, Timestamp, Topic};
use chartfeed::ws::{EncodedPayload, Kind, MessageOut, SubscribeParams, WsEvent};

const NOW: u64 = 1_700_000_600;
const T0: u64 = 1_700_000_000;

// ─── Test doubles ────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingChannel {
    sent: RefCell<Vec<MessageOut>>,
    failing: Cell<bool>,
}

impl Channel for RecordingChannel {
    fn emit(&self, msg: MessageOut) -> Result<(), WsError> {
        if self.failing.get() {
            return Err(WsError::NotConnected);
        }
        self.sent.borrow_mut().push(msg);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    SetArea(usize),
    SetCandle(usize),
    UpdateArea(AreaPoint),
    UpdateCandle(CandlePoint),
    Clear,
    Kind(ChartType),
    Range(TimeRange),
    RightOffset(u32),
    Scroll,
    Format(TickFormat),
}

#[derive(Default)]
struct RecordingSurface {
    calls: Vec<Call>,
    area: Vec<AreaPoint>,
    candles: Vec<CandlePoint>,
    range: Option<TimeRange>,
    width: Option<f64>,
}

impl ChartSurface for RecordingSurface {
    fn set_area_data(&mut self, points: &[AreaPoint]) {
        self.area = points.to_vec();
        self.calls.push(Call::SetArea(points.len()));
    }
    fn set_candle_data(&mut self, points: &[CandlePoint]) {
        self.candles = points.to_vec();
        self.calls.push(Call::SetCandle(points.len()));
    }
    fn update_area(&mut self, point: AreaPoint) {
        self.calls.push(Call::UpdateArea(point));
    }
    fn update_candle(&mut self, point: CandlePoint) {
        self.calls.push(Call::UpdateCandle(point));
    }
    fn clear(&mut self) {
        self.area.clear();
        self.candles.clear();
        self.calls.push(Call::Clear);
    }
    fn set_series_kind(&mut self, kind: ChartType) {
        self.calls.push(Call::Kind(kind));
    }
    fn visible_range(&self) -> Option<TimeRange> {
        self.range
    }
    fn set_visible_range(&mut self, range: TimeRange) {
        self.range = Some(range);
        self.calls.push(Call::Range(range));
    }
    fn width(&self) -> Option<f64> {
        self.width
    }
    fn bar_spacing(&self) -> Option<f64> {
        None
    }
    fn set_right_offset(&mut self, bars: u32) {
        self.calls.push(Call::RightOffset(bars));
    }
    fn scroll_to_realtime(&mut self) {
        self.calls.push(Call::Scroll);
    }
    fn set_tick_format(&mut self, format: TickFormat) {
        self.calls.push(Call::Format(format));
    }
}

type Feed = ChartFeed<RecordingChannel, RecordingSurface>;

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn new_feed() -> Feed {
    ChartFeed::new(RecordingChannel::default(), RecordingSurface::default())
        .with_clock(|| Timestamp::from_secs(NOW))
}

fn topic(symbol: &str, chart_type: ChartType) -> Topic {
    Topic::new(symbol, chart_type)
}

fn user_ready(symbol: &str, chart_type: ChartType) -> WsEvent {
    WsEvent::Message(Kind::UserReady(UserReadyPayload {
        last_asset: Symbol::from(symbol),
        time: T0 as f64,
        amount: 100.0,
        payout: 0.85,
        chart_type,
    }))
}

fn backfill(value: Value) -> WsEvent {
    WsEvent::Message(Kind::UpdateOldData(EncodedPayload::from_text(&value.to_string())))
}

fn tick(value: Value) -> WsEvent {
    WsEvent::Message(Kind::UpdateStream(EncodedPayload::from_text(&value.to_string())))
}

fn sent(feed: &Feed) -> Vec<MessageOut> {
    feed.channel().sent.borrow().clone()
}

fn sent_since(feed: &Feed, from: usize) -> Vec<MessageOut> {
    feed.channel().sent.borrow()[from..].to_vec()
}

/// Subscriptions left open by the emitted subscribe/unsubscribe sequence.
fn active_subscriptions(feed: &Feed) -> Vec<SubscribeParams> {
    let mut subs: Vec<SubscribeParams> = Vec::new();
    for msg in feed.channel().sent.borrow().iter() {
        match msg {
            MessageOut::Subscribe(params) if !subs.contains(params) => subs.push(params.clone()),
            MessageOut::Unsubscribe(unsub) => {
                subs.retain(|s| s.symbol != unsub.symbol || s.chart_type != unsub.chart_type)
            }
            _ => {}
        }
    }
    subs
}

fn area_points(feed: &Feed) -> Vec<(u64, f64)> {
    feed.series()
        .as_area()
        .expect("area series")
        .iter()
        .map(|p| (p.time.as_secs(), p.value))
        .collect()
}

/// Connected + user-ready for `symbol`, returns a subscribed feed.
fn subscribed(symbol: &str, chart_type: ChartType) -> Feed {
    let mut feed = new_feed();
    feed.handle_event(WsEvent::Connected);
    feed.handle_event(user_ready(symbol, chart_type));
    assert_eq!(feed.state(), &FeedState::Subscribed(topic(symbol, chart_type)));
    feed
}

// ─── Bootstrap ───────────────────────────────────────────────────────────────

#[test]
fn test_bootstrap_user_init_then_subscribe() {
    let mut feed = new_feed();
    assert_eq!(feed.status_line(), "Disconnected");

    feed.handle_event(WsEvent::Connected);
    assert_eq!(feed.state(), &FeedState::AwaitingReady);
    assert_eq!(sent(&feed), vec![MessageOut::UserInit]);

    feed.handle_event(user_ready("XAUUSD", ChartType::Area));
    let xau = topic("XAUUSD", ChartType::Area);
    assert_eq!(
        sent(&feed),
        vec![
            MessageOut::UserInit,
            MessageOut::request_older_data(&xau, Timestamp::from_secs(NOW)),
            MessageOut::subscribe(&xau),
        ]
    );
    assert_eq!(feed.active_topic(), Some(&xau));
    assert_eq!(feed.session().payout, Some(0.85));
    assert_eq!(feed.status_line(), "Connected | XAUUSD | area");
    assert_eq!(
        feed.surface().calls[..2],
        [Call::Clear, Call::Kind(ChartType::Area)]
    );
}

#[test]
fn test_selection_before_connect_wins() {
    let mut feed = new_feed();
    let eur = topic("EURUSD", ChartType::Candle);

    feed.select(eur.clone());
    assert_eq!(feed.state(), &FeedState::Idle);
    assert!(sent(&feed).is_empty());

    feed.handle_event(WsEvent::Connected);
    assert_eq!(
        sent(&feed),
        vec![
            MessageOut::request_older_data(&eur, Timestamp::from_secs(NOW)),
            MessageOut::subscribe(&eur),
        ]
    );

    // The server's lastAsset does not override the user's choice.
    feed.handle_event(user_ready("XAUUSD", ChartType::Area));
    assert_eq!(sent(&feed).len(), 2);
    assert_eq!(feed.active_topic(), Some(&eur));
}

#[test]
fn test_user_ready_switches_topic() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    let before = sent(&feed).len();

    feed.handle_event(user_ready("BTCUSD", ChartType::Area));
    let btc = topic("BTCUSD", ChartType::Area);
    assert_eq!(
        sent_since(&feed, before),
        vec![
            MessageOut::unsubscribe(&topic("XAUUSD", ChartType::Area)),
            MessageOut::request_older_data(&btc, Timestamp::from_secs(NOW)),
            MessageOut::subscribe(&btc),
        ]
    );

    // Same payload again changes nothing.
    let before = sent(&feed).len();
    feed.handle_event(user_ready("BTCUSD", ChartType::Area));
    assert_eq!(sent(&feed).len(), before);
}

// ─── Topic changes ───────────────────────────────────────────────────────────

#[test]
fn test_topic_change_ordering() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(backfill(json!([{"time": T0, "value": 1.0}])));
    assert_eq!(feed.earliest(), Some(Timestamp::from_secs(T0)));

    let before = sent(&feed).len();
    let eur = topic("EURUSD", ChartType::Candle);
    feed.select(eur.clone());

    // Exactly unsubscribe, requestOlderData, subscribe. The anchor is "now",
    // not T0: the buffer was cleared before it was computed.
    assert_eq!(
        sent_since(&feed, before),
        vec![
            MessageOut::unsubscribe(&topic("XAUUSD", ChartType::Area)),
            MessageOut::request_older_data(&eur, Timestamp::from_secs(NOW)),
            MessageOut::subscribe(&eur),
        ]
    );
    assert_eq!(feed.state(), &FeedState::Subscribed(eur.clone()));
    assert!(matches!(feed.series(), ActiveSeries::Candle(buf) if buf.is_empty()));
    assert_eq!(feed.earliest(), None);
    assert_eq!(active_subscriptions(&feed), vec![SubscribeParams {
        symbol: Symbol::from("EURUSD"),
        chart_type: ChartType::Candle,
    }]);
    assert!(feed.surface().area.is_empty());
    assert_eq!(
        feed.surface().calls.last(),
        Some(&Call::Kind(ChartType::Candle))
    );
}

#[test]
fn test_rapid_topic_changes_keep_one_subscription() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    for (symbol, chart_type) in [
        ("EURUSD", ChartType::Area),
        ("EURUSD", ChartType::Candle),
        ("BTCUSD", ChartType::Candle),
        ("XAUUSD", ChartType::Area),
    ] {
        feed.select(topic(symbol, chart_type));
        assert_eq!(active_subscriptions(&feed).len(), 1);
    }
    assert_eq!(feed.active_topic(), Some(&topic("XAUUSD", ChartType::Area)));
}

#[test]
fn test_select_same_topic_is_noop() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    let before = sent(&feed).len();
    feed.select(topic("XAUUSD", ChartType::Area));
    assert_eq!(sent(&feed).len(), before);
}

// ─── Backfill ────────────────────────────────────────────────────────────────

#[test]
fn test_backfill_merge_and_idempotence() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    let page = json!([
        {"time": T0 + 60, "value": 2.0},
        {"time": T0, "value": 1.0},
        {"time": T0 + 60, "value": 3.0},
    ]);

    feed.handle_event(backfill(page.clone()));
    assert_eq!(area_points(&feed), vec![(T0, 1.0), (T0 + 60, 3.0)]);
    assert_eq!(feed.earliest(), Some(Timestamp::from_secs(T0)));
    assert_eq!(feed.surface().area.len(), 2);

    feed.handle_event(backfill(page));
    assert_eq!(area_points(&feed), vec![(T0, 1.0), (T0 + 60, 3.0)]);

    // Older page: existing entries win on collision.
    feed.handle_event(backfill(json!([
        {"time": (T0 - 60) * 1000, "value": 0.5},
        {"time": T0, "value": 99.0},
    ])));
    assert_eq!(area_points(&feed), vec![(T0 - 60, 0.5), (T0, 1.0), (T0 + 60, 3.0)]);
    assert_eq!(feed.earliest(), Some(Timestamp::from_secs(T0 - 60)));
}

#[test]
fn test_backfill_frames_viewport() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(backfill(json!([
        {"time": T0, "value": 1.0},
        {"time": T0 + 100, "value": 2.0},
    ])));

    let surface = feed.surface();
    assert_eq!(surface.range, Some(TimeRange::new(T0 - 30, T0 + 170)));
    assert!(surface.calls.contains(&Call::RightOffset(50)));
    assert!(surface.calls.contains(&Call::Format(TickFormat {
        granularity: Granularity::Seconds,
        step_secs: 15,
    })));
    assert_eq!(surface.calls.last(), Some(&Call::Scroll));
}

#[test]
fn test_backfill_drops_invalid_points() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(backfill(json!([
        {"time": "garbage", "value": 1.0},
        {"time": -5, "value": 1.0},
        {"value": 1.0},
        {"time": T0 * 1000, "value": 2.0},
    ])));

    assert_eq!(area_points(&feed), vec![(T0, 2.0)]);
    assert_eq!(feed.stats().dropped_points, 3);
}

#[test]
fn test_candle_backfill_with_iso_times() {
    let mut feed = subscribed("EURUSD", ChartType::Candle);
    feed.handle_event(backfill(json!([
        {"timestamp": "2023-11-14T22:13:20Z", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5},
        {"time": T0 + 60, "open": 1.5, "high": 1.0, "low": 0.5, "close": 1.2},
        {"time": T0 + 120, "open": 1.5, "high": 1.8, "low": 1.1, "close": 1.2},
    ])));

    let candles = feed.series().as_candle().expect("candle series");
    let times: Vec<u64> = candles.iter().map(|c| c.time.as_secs()).collect();
    assert_eq!(times, vec![T0, T0 + 120]);
    assert_eq!(feed.stats().dropped_points, 1);
    assert_eq!(feed.surface().candles.len(), 2);
}

#[test]
fn test_late_page_from_previous_symbol_dropped() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.select(topic("EURUSD", ChartType::Area));
    let calls_before = feed.surface().calls.len();

    feed.handle_event(backfill(json!([
        {"time": T0, "value": 2000.0, "symbol": "XAUUSD"},
        {"time": T0 + 1, "value": 2001.0, "symbol": "XAUUSD"},
    ])));
    assert!(feed.series().is_empty());
    assert_eq!(feed.earliest(), None);
    assert_eq!(feed.stats().stale_points, 2);
    assert_eq!(feed.surface().calls.len(), calls_before);

    // Points tagged with the active symbol, or untagged, still merge.
    feed.handle_event(backfill(json!([
        {"time": T0 + 2, "value": 1.08, "symbol": "EURUSD"},
        {"time": T0 + 3, "value": 2003.0, "symbol": "XAUUSD"},
        {"time": T0 + 4, "value": 1.09},
    ])));
    assert_eq!(area_points(&feed), vec![(T0 + 2, 1.08), (T0 + 4, 1.09)]);
    assert_eq!(feed.stats().stale_points, 3);
    assert_eq!(feed.stats().dropped_points, 0);
}

#[test]
fn test_non_array_backfill_is_ignored() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(backfill(json!({"time": T0, "value": 1.0})));
    assert!(feed.series().is_empty());
    assert_eq!(feed.stats().undecodable_payloads, 1);
}

// ─── Live ticks ──────────────────────────────────────────────────────────────

#[test]
fn test_live_tick_on_empty_buffer() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(tick(json!({"time": 100, "value": 1.0})));

    assert_eq!(area_points(&feed), vec![(100, 1.0)]);
    assert_eq!(feed.earliest(), Some(Timestamp::from_secs(100)));
    assert!(feed
        .surface()
        .calls
        .contains(&Call::UpdateArea(AreaPoint::new(100u64, 1.0))));
    assert_eq!(feed.surface().calls.last(), Some(&Call::Scroll));
}

#[test]
fn test_live_tick_replace_then_append() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(backfill(json!([{"time": T0, "value": 1.0}])));

    feed.handle_event(tick(json!({"time": T0, "value": 1.5})));
    assert_eq!(area_points(&feed), vec![(T0, 1.5)]);

    feed.handle_event(tick(json!({"time": (T0 + 1) * 1000, "value": 2.0})));
    assert_eq!(area_points(&feed), vec![(T0, 1.5), (T0 + 1, 2.0)]);
}

#[test]
fn test_out_of_order_tick_dropped() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(tick(json!({"time": T0 + 10, "value": 1.0})));
    let calls_before = feed.surface().calls.len();

    feed.handle_event(tick(json!({"time": T0, "value": 9.0})));
    assert_eq!(area_points(&feed), vec![(T0 + 10, 1.0)]);
    assert_eq!(feed.stats().out_of_order_ticks, 1);
    assert_eq!(feed.surface().calls.len(), calls_before);
}

#[test]
fn test_malformed_candle_tick_leaves_buffer() {
    let mut feed = subscribed("EURUSD", ChartType::Candle);
    feed.handle_event(tick(json!({
        "timestamp": "2023-11-14T22:13:20Z", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5
    })));
    let calls_before = feed.surface().calls.len();

    feed.handle_event(tick(json!({
        "timestamp": "2023-11-14T22:13:21Z", "high": 2.0, "low": 0.5, "close": 1.5
    })));

    assert_eq!(feed.series().len(), 1);
    assert_eq!(feed.stats().malformed_ticks, 1);
    assert_eq!(feed.surface().calls.len(), calls_before);
}

#[test]
fn test_candle_tick_without_time_is_malformed() {
    let mut feed = subscribed("EURUSD", ChartType::Candle);
    feed.handle_event(tick(json!({"open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5})));
    assert!(feed.series().is_empty());
    assert_eq!(feed.stats().malformed_ticks, 1);
}

#[test]
fn test_stale_symbol_tick_dropped() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(tick(json!({"time": T0, "value": 1.0, "symbol": "EURUSD"})));
    assert!(feed.series().is_empty());
    assert_eq!(feed.stats().stale_ticks, 1);

    feed.handle_event(tick(json!({"time": T0, "value": 1.0, "symbol": "XAUUSD"})));
    assert_eq!(feed.series().len(), 1);
}

#[test]
fn test_undecodable_tick() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(WsEvent::Message(Kind::UpdateStream(EncodedPayload::from_text(
        "not json",
    ))));
    assert!(feed.series().is_empty());
    assert_eq!(feed.stats().undecodable_payloads, 1);
}

#[test]
fn test_data_outside_subscription_ignored() {
    let mut feed = new_feed();
    feed.handle_event(WsEvent::Connected);
    feed.handle_event(backfill(json!([{"time": T0, "value": 1.0}])));
    feed.handle_event(tick(json!({"time": T0, "value": 1.0})));

    assert!(feed.series().is_empty());
    assert!(feed.surface().calls.is_empty());
}

#[test]
fn test_unknown_event_ignored() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(WsEvent::Message(Kind::Unknown {
        event: "server-notice".into(),
        payload: None,
    }));
    assert_eq!(feed.stats(), &FeedStats::default());
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[test]
fn test_disconnect_and_reconnect() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    let xau = topic("XAUUSD", ChartType::Area);
    feed.handle_event(backfill(json!([{"time": T0, "value": 1.0}])));

    let before = sent(&feed).len();
    feed.handle_event(WsEvent::Disconnected {
        code: Some(1006),
        reason: "gone".into(),
    });
    assert_eq!(sent_since(&feed, before), vec![MessageOut::unsubscribe(&xau)]);
    assert_eq!(feed.state(), &FeedState::Idle);
    assert!(feed.series().is_empty());
    assert_eq!(feed.earliest(), None);
    assert!(!feed.session().connected);
    assert_eq!(feed.status_line(), "Disconnected");

    // Ticks for the old connection are ignored while idle.
    feed.handle_event(tick(json!({"time": T0 + 1, "value": 2.0})));
    assert!(feed.series().is_empty());

    // Reconnect resumes the remembered topic without another userInit.
    let before = sent(&feed).len();
    feed.handle_event(WsEvent::Connected);
    assert_eq!(
        sent_since(&feed, before),
        vec![
            MessageOut::request_older_data(&xau, Timestamp::from_secs(NOW)),
            MessageOut::subscribe(&xau),
        ]
    );
    assert_eq!(active_subscriptions(&feed).len(), 1);
}

#[test]
fn test_disconnect_while_awaiting_ready() {
    let mut feed = new_feed();
    feed.handle_event(WsEvent::Connected);
    feed.handle_event(WsEvent::Disconnected {
        code: None,
        reason: "Stream ended".into(),
    });
    assert_eq!(feed.state(), &FeedState::Idle);

    // No topic known yet: ask again.
    feed.handle_event(WsEvent::Connected);
    assert_eq!(sent(&feed), vec![MessageOut::UserInit, MessageOut::UserInit]);
}

#[test]
fn test_user_ready_while_disconnected_waits_for_connect() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(WsEvent::Disconnected {
        code: Some(1006),
        reason: "gone".into(),
    });

    let before = sent(&feed).len();
    feed.handle_event(user_ready("BTCUSD", ChartType::Candle));
    assert_eq!(feed.state(), &FeedState::Idle);
    assert!(sent_since(&feed, before).is_empty());

    let btc = topic("BTCUSD", ChartType::Candle);
    feed.handle_event(WsEvent::Connected);
    assert_eq!(
        sent_since(&feed, before),
        vec![
            MessageOut::request_older_data(&btc, Timestamp::from_secs(NOW)),
            MessageOut::subscribe(&btc),
        ]
    );
    assert_eq!(feed.state(), &FeedState::Subscribed(btc));
    assert_eq!(active_subscriptions(&feed).len(), 1);
}

#[test]
fn test_teardown() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.handle_event(backfill(json!([{"time": T0, "value": 1.0}])));

    feed.teardown();
    assert_eq!(
        sent(&feed).last(),
        Some(&MessageOut::unsubscribe(&topic("XAUUSD", ChartType::Area)))
    );
    assert_eq!(feed.state(), &FeedState::Idle);
    assert!(feed.series().is_empty());
    assert!(feed.is_closed());
    assert!(active_subscriptions(&feed).is_empty());

    let before = sent(&feed).len();
    feed.handle_event(WsEvent::Connected);
    feed.handle_event(user_ready("XAUUSD", ChartType::Area));
    feed.select(topic("EURUSD", ChartType::Area));
    assert_eq!(sent(&feed).len(), before);
    assert_eq!(feed.state(), &FeedState::Idle);
}

#[test]
fn test_request_more_old() {
    let mut feed = new_feed();
    assert!(!feed.request_more_old());

    let mut feed = subscribed("XAUUSD", ChartType::Area);
    assert!(!feed.request_more_old());

    feed.handle_event(backfill(json!([
        {"time": T0, "value": 1.0},
        {"time": T0 + 60, "value": 2.0},
    ])));
    assert!(feed.request_more_old());
    assert_eq!(
        sent(&feed).last(),
        Some(&MessageOut::request_older_data(
            &topic("XAUUSD", ChartType::Area),
            Timestamp::from_secs(T0)
        ))
    );
}

#[test]
fn test_emit_failures_are_counted() {
    let mut feed = new_feed();
    feed.channel().failing.set(true);

    feed.handle_event(WsEvent::Connected);
    assert_eq!(feed.state(), &FeedState::AwaitingReady);
    assert_eq!(feed.stats().failed_emits, 1);

    feed.handle_event(user_ready("XAUUSD", ChartType::Area));
    assert_eq!(feed.stats().failed_emits, 3);
    assert!(!feed.request_more_old());
}

#[test]
fn test_resize_updates_right_offset() {
    let mut feed = subscribed("XAUUSD", ChartType::Area);
    feed.surface_mut().width = Some(1_200.0);
    feed.surface_mut().range = Some(TimeRange::new(T0, T0 + 3_600));

    feed.handle_resize();
    let calls = &feed.surface().calls;
    assert_eq!(
        calls[calls.len() - 2..],
        [
            Call::RightOffset(100),
            Call::Format(TickFormat {
                granularity: Granularity::Minutes,
                step_secs: 1_800,
            }),
        ]
    );
}
