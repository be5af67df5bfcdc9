//! Series domain: area and candle points, backfill batches, live ticks.

mod convert;
pub mod state;
pub mod wire;

use crate::shared::{ChartType, Symbol, Timestamp};
use serde::{Deserialize, Serialize};

pub use convert::{decode_batch, decode_tick};
pub use state::{dedupe, reconcile, LiveUpdate, SeriesBuffer};

/// Anything that can live in a [`SeriesBuffer`]: keyed and ordered by time.
pub trait SeriesPoint: Clone + std::fmt::Debug {
    fn time(&self) -> Timestamp;
}

/// A single point on an area chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaPoint {
    pub time: Timestamp,
    pub value: f64,
}

impl AreaPoint {
    pub fn new(time: impl Into<Timestamp>, value: f64) -> Self {
        Self {
            time: time.into(),
            value,
        }
    }
}

impl SeriesPoint for AreaPoint {
    fn time(&self) -> Timestamp {
        self.time
    }
}

/// A single OHLC bar.
///
/// Constructed through the wire conversions, which guarantee
/// `low <= min(open, close)` and `max(open, close) <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandlePoint {
    pub time: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl CandlePoint {
    /// Whether the OHLC values are finite and mutually consistent.
    pub fn is_consistent(&self) -> bool {
        let values = [self.open, self.high, self.low, self.close];
        values.iter().all(|v| v.is_finite())
            && self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
    }
}

impl SeriesPoint for CandlePoint {
    fn time(&self) -> Timestamp {
        self.time
    }
}

/// A decoded backfill page, tagged by chart type.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch {
    Area(Vec<AreaPoint>),
    Candle(Vec<CandlePoint>),
}

impl Batch {
    pub fn chart_type(&self) -> ChartType {
        match self {
            Batch::Area(_) => ChartType::Area,
            Batch::Candle(_) => ChartType::Candle,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Batch::Area(points) => points.len(),
            Batch::Candle(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of decoding a backfill page: the valid points plus what was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBatch {
    pub batch: Batch,
    /// Points with a bad time or shape.
    pub dropped: usize,
    /// Points tagged with another symbol.
    pub stale: usize,
}

/// A decoded live tick, tagged by chart type.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Symbol the server tagged the tick with, if any.
    pub symbol: Option<Symbol>,
    pub point: TickPoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickPoint {
    Area(AreaPoint),
    Candle(CandlePoint),
}

impl TickPoint {
    pub fn time(&self) -> Timestamp {
        match self {
            TickPoint::Area(p) => p.time,
            TickPoint::Candle(p) => p.time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> CandlePoint {
        CandlePoint {
            time: Timestamp::from_secs(1),
            open,
            high,
            low,
            close,
        }
    }

    #[test]
    fn test_candle_consistency() {
        assert!(candle(10.0, 12.0, 9.0, 11.0).is_consistent());
        assert!(candle(10.0, 10.0, 10.0, 10.0).is_consistent());
        assert!(!candle(10.0, 9.5, 9.0, 11.0).is_consistent());
        assert!(!candle(10.0, 12.0, 10.5, 11.0).is_consistent());
        assert!(!candle(f64::NAN, 12.0, 9.0, 11.0).is_consistent());
    }

    #[test]
    fn test_batch_chart_type() {
        assert_eq!(Batch::Area(vec![]).chart_type(), ChartType::Area);
        assert!(Batch::Candle(vec![]).is_empty());
    }
}
