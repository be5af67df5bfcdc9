//! Tail a live chart feed and log what would be drawn.
//!
//! Reads `CHARTFEED_ENDPOINT` / `CHARTFEED_SECRET` from the environment (or a
//! `.env` file), subscribes to whatever the server reports as the last asset
//! and logs every redraw until Ctrl-C.
//!
//! ```bash
//! RUST_LOG=chartfeed=debug,feed_tail=info cargo run --example feed_tail
//! ```

use futures_util::StreamExt;
use tracing_subscriber::EnvFilter;

use chartfeed::prelude::*;

/// A surface that only logs.
#[derive(Default)]
struct LogSurface {
    range: Option<TimeRange>,
}

impl ChartSurface for LogSurface {
    fn set_area_data(&mut self, points: &[AreaPoint]) {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            tracing::info!("area: {} points, {} → {} (last {})", points.len(), first.time, last.time, last.value);
        }
    }

    fn set_candle_data(&mut self, points: &[CandlePoint]) {
        if let Some(last) = points.last() {
            tracing::info!("candles: {} bars, last close {} at {}", points.len(), last.close, last.time);
        }
    }

    fn update_area(&mut self, point: AreaPoint) {
        tracing::info!("tick {} = {}", point.time, point.value);
    }

    fn update_candle(&mut self, point: CandlePoint) {
        tracing::info!(
            "bar {} o={} h={} l={} c={}",
            point.time,
            point.open,
            point.high,
            point.low,
            point.close
        );
    }

    fn clear(&mut self) {
        tracing::info!("clear");
    }

    fn set_series_kind(&mut self, kind: ChartType) {
        tracing::info!("series kind: {}", kind);
    }

    fn visible_range(&self) -> Option<TimeRange> {
        self.range
    }

    fn set_visible_range(&mut self, range: TimeRange) {
        tracing::debug!("visible range {} → {}", range.from, range.to);
        self.range = Some(range);
    }

    fn width(&self) -> Option<f64> {
        None
    }

    fn bar_spacing(&self) -> Option<f64> {
        None
    }

    fn set_right_offset(&mut self, _bars: u32) {}

    fn scroll_to_realtime(&mut self) {}

    fn set_tick_format(&mut self, format: TickFormat) {
        tracing::debug!("tick format {:?}", format);
    }
}

#[tokio::main]
async fn main() -> Result<(), FeedError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = FeedConfig::from_env()?;
    tracing::info!("Connecting to {}", config.endpoint);

    let mut client = WsClient::new(config.ws_config());
    client.connect().await?;

    {
        let mut feed = ChartFeed::new(&client, LogSurface::default());
        let events = client.events();
        tokio::pin!(events);

        loop {
            tokio::select! {
                event = events.next() => {
                    let Some(event) = event else { break };
                    let gave_up = event == WsEvent::MaxReconnectReached;
                    feed.handle_event(event);
                    tracing::debug!("{}", feed.status_line());
                    if gave_up {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted");
                    break;
                }
            }
        }

        feed.teardown();
        tracing::info!("Stats: {:?}", feed.stats());
    }

    client.disconnect().await?;
    Ok(())
}
