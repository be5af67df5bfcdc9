//! Subscription parameter types.

use crate::shared::{ChartType, Symbol, Timestamp, Topic};
use serde::{Deserialize, Serialize};

/// Parameters for `subscribe`.
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeParams {
    pub symbol: Symbol,
    pub chart_type: ChartType,
}

/// Parameters for `unsubscribe`. Same shape as [`SubscribeParams`].
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeParams {
    pub symbol: Symbol,
    pub chart_type: ChartType,
}

/// Parameters for `requestOlderData`: backfill strictly older than `first_time`.
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OlderDataParams {
    pub symbol: Symbol,
    pub chart_type: ChartType,
    pub first_time: Timestamp,
}

/// Anything that names a chart topic on the wire.
pub trait Subscription {
    fn to_subscribe_params(&self) -> SubscribeParams;
    fn to_unsubscribe_params(&self) -> UnsubscribeParams;
    fn to_older_data_params(&self, first_time: Timestamp) -> OlderDataParams;
}

impl Subscription for Topic {
    fn to_subscribe_params(&self) -> SubscribeParams {
        SubscribeParams {
            symbol: self.symbol.clone(),
            chart_type: self.chart_type,
        }
    }

    fn to_unsubscribe_params(&self) -> UnsubscribeParams {
        UnsubscribeParams {
            symbol: self.symbol.clone(),
            chart_type: self.chart_type,
        }
    }

    fn to_older_data_params(&self, first_time: Timestamp) -> OlderDataParams {
        OlderDataParams {
            symbol: self.symbol.clone(),
            chart_type: self.chart_type,
            first_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_params_serialization() {
        let params = Topic::new("XAUUSD", ChartType::Area).to_subscribe_params();
        let parsed = serde_json::to_value(&params).unwrap();

        assert_eq!(parsed["symbol"], "XAUUSD");
        assert_eq!(parsed["chartType"], "area");
        assert!(parsed.get("chart_type").is_none());
    }

    #[test]
    fn test_older_data_params_serialization() {
        let params = Topic::new("EURUSD", ChartType::Candle)
            .to_older_data_params(Timestamp::from_secs(1_700_000_000));
        let parsed = serde_json::to_value(&params).unwrap();

        assert_eq!(parsed["symbol"], "EURUSD");
        assert_eq!(parsed["chartType"], "candle");
        assert_eq!(parsed["firstTime"], 1_700_000_000u64);
    }
}
