//! Wire types for the session handshake.

use crate::shared::{ChartType, Symbol};
use serde::{Deserialize, Serialize};

/// `user-ready` payload, pushed once by the server after `userInit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReadyPayload {
    pub last_asset: Symbol,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub payout: f64,
    #[serde(default)]
    pub chart_type: ChartType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_ready_camel_case() {
        let p: UserReadyPayload = serde_json::from_str(
            r#"{"lastAsset":"EURUSD","time":60,"amount":10,"payout":0.9,"chartType":"candle"}"#,
        )
        .unwrap();
        assert_eq!(p.last_asset.as_str(), "EURUSD");
        assert_eq!(p.chart_type, ChartType::Candle);
        assert_eq!(p.time, 60.0);
    }

    #[test]
    fn test_user_ready_defaults_chart_type() {
        let p: UserReadyPayload = serde_json::from_str(r#"{"lastAsset":"XAUUSD"}"#).unwrap();
        assert_eq!(p.chart_type, ChartType::Area);
        assert_eq!(p.amount, 0.0);
    }
}
