//! Feed state: subscription lifecycle, the active buffer, counters.

use crate::domain::series::{AreaPoint, CandlePoint, SeriesBuffer};
use crate::shared::{ChartType, Timestamp, Topic};

/// Where the feed is in its subscription lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FeedState {
    /// Not connected, or torn down.
    #[default]
    Idle,
    /// `userInit` sent, waiting for the server's `user-ready`.
    AwaitingReady,
    /// Exactly one topic is live.
    Subscribed(Topic),
}

impl FeedState {
    pub fn topic(&self) -> Option<&Topic> {
        match self {
            FeedState::Subscribed(topic) => Some(topic),
            _ => None,
        }
    }
}

/// The series buffer for the active chart type.
#[derive(Debug, Clone)]
pub enum ActiveSeries {
    Area(SeriesBuffer<AreaPoint>),
    Candle(SeriesBuffer<CandlePoint>),
}

impl Default for ActiveSeries {
    fn default() -> Self {
        Self::empty(ChartType::default())
    }
}

impl ActiveSeries {
    pub fn empty(chart_type: ChartType) -> Self {
        match chart_type {
            ChartType::Area => ActiveSeries::Area(SeriesBuffer::new()),
            ChartType::Candle => ActiveSeries::Candle(SeriesBuffer::new()),
        }
    }

    pub fn chart_type(&self) -> ChartType {
        match self {
            ActiveSeries::Area(_) => ChartType::Area,
            ActiveSeries::Candle(_) => ChartType::Candle,
        }
    }

    pub fn earliest(&self) -> Option<Timestamp> {
        match self {
            ActiveSeries::Area(buf) => buf.earliest(),
            ActiveSeries::Candle(buf) => buf.earliest(),
        }
    }

    pub fn bounds(&self) -> Option<(Timestamp, Timestamp)> {
        match self {
            ActiveSeries::Area(buf) => buf.bounds(),
            ActiveSeries::Candle(buf) => buf.bounds(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ActiveSeries::Area(buf) => buf.len(),
            ActiveSeries::Candle(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_area(&self) -> Option<&[AreaPoint]> {
        match self {
            ActiveSeries::Area(buf) => Some(buf.points()),
            ActiveSeries::Candle(_) => None,
        }
    }

    pub fn as_candle(&self) -> Option<&[CandlePoint]> {
        match self {
            ActiveSeries::Candle(buf) => Some(buf.points()),
            ActiveSeries::Area(_) => None,
        }
    }
}

/// Counters for everything the feed skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Points dropped from backfill pages (bad time or shape).
    pub dropped_points: u64,
    pub malformed_ticks: u64,
    pub out_of_order_ticks: u64,
    /// Ticks tagged with a symbol other than the active one.
    pub stale_ticks: u64,
    /// Backfill points tagged with a symbol other than the active one.
    pub stale_points: u64,
    /// Payloads that were not JSON, or not the expected container.
    pub undecodable_payloads: u64,
    pub failed_emits: u64,
}
