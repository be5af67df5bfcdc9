//! Session domain: the server-pushed user configuration.

pub mod wire;

use crate::shared::{ChartType, Symbol, Topic};

pub use wire::UserReadyPayload;

/// Connection status plus the last `user-ready` configuration.
///
/// Read-only from the feed's point of view: it is replaced when the server
/// pushes a new payload and `connected` follows the channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub connected: bool,
    pub last_asset: Option<Symbol>,
    pub chart_type: Option<ChartType>,
    pub server_time: Option<f64>,
    pub amount: Option<f64>,
    pub payout: Option<f64>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_ready(&mut self, payload: &UserReadyPayload) {
        self.last_asset = Some(payload.last_asset.clone());
        self.chart_type = Some(payload.chart_type);
        self.server_time = Some(payload.time);
        self.amount = Some(payload.amount);
        self.payout = Some(payload.payout);
    }

    /// The topic the server asked us to display, once known.
    pub fn topic(&self) -> Option<Topic> {
        let symbol = self.last_asset.clone()?;
        Some(Topic::new(symbol, self.chart_type.unwrap_or_default()))
    }

    /// Status line shown next to the chart, e.g. `Connected | XAUUSD | area`.
    pub fn status_line(&self, topic: Option<&Topic>) -> String {
        let status = if self.connected { "Connected" } else { "Disconnected" };
        match topic {
            Some(t) => format!("{} | {} | {}", status, t.symbol, t.chart_type),
            None => status.to_string(),
        }
    }
}
