//! Wire types for series points (backfill pages and live ticks).

use crate::shared::{RawTime, Symbol};
use serde::{Deserialize, Serialize};

/// An area point as sent by the server, in a backfill page or as a live tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaStream {
    pub time: RawTime,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
}

/// A candle as sent by the server.
///
/// Live candles carry an ISO `timestamp`; backfill candles may use a numeric
/// `time` instead. `timestamp` wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleStream {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<RawTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<RawTime>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
}

impl CandleStream {
    pub fn raw_time(&self) -> Option<&RawTime> {
        self.timestamp.as_ref().or(self.time.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_stream_minimal() {
        let p: AreaStream = serde_json::from_str(r#"{"time":1700000000,"value":1.5}"#).unwrap();
        assert_eq!(p.time, RawTime::Number(1_700_000_000.0));
        assert_eq!(p.value, 1.5);
        assert!(p.volume.is_none());
        assert!(p.symbol.is_none());
    }

    #[test]
    fn test_candle_stream_prefers_timestamp() {
        let c: CandleStream = serde_json::from_str(
            r#"{"timestamp":"2023-11-14T22:13:20Z","time":5,"open":1,"high":2,"low":0.5,"close":1.5}"#,
        )
        .unwrap();
        assert_eq!(
            c.raw_time(),
            Some(&RawTime::Text("2023-11-14T22:13:20Z".to_string()))
        );
    }

    #[test]
    fn test_candle_stream_requires_ohlc() {
        let missing_open = r#"{"timestamp":"2023-11-14T22:13:20Z","high":2,"low":0.5,"close":1.5}"#;
        assert!(serde_json::from_str::<CandleStream>(missing_open).is_err());

        let string_open = r#"{"time":5,"open":"1","high":2,"low":0.5,"close":1.5}"#;
        assert!(serde_json::from_str::<CandleStream>(string_open).is_err());
    }
}
