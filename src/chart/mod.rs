//! Chart layer: the rendering surface seam and viewport policy.
//!
//! The surface itself (drawing candles and areas) lives outside this crate.
//! [`ChartSurface`] is the set of hooks the feed and the viewport controller
//! drive; anything that can accept ordered point arrays and report its
//! geometry can implement it.

pub mod viewport;

use crate::domain::series::{AreaPoint, CandlePoint};
use crate::shared::{ChartType, Timestamp};
use chrono::DateTime;

pub use viewport::{ViewportConfig, ViewportController};

/// A closed time window `[from, to]` on the horizontal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl TimeRange {
    pub fn new(from: impl Into<Timestamp>, to: impl Into<Timestamp>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Width of the window in seconds. Zero for inverted ranges.
    pub fn span_secs(&self) -> u64 {
        self.to.as_secs().saturating_sub(self.from.as_secs())
    }
}

/// Time-axis label granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// `HH:MM:SS`
    Seconds,
    /// `HH:MM`
    Minutes,
}

/// Which ticks on the time axis get a label, and how they read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickFormat {
    pub granularity: Granularity,
    /// Only times that are a multiple of this many seconds are labeled.
    pub step_secs: u64,
}

impl TickFormat {
    /// Label for a tick at `time`, or `None` when the tick is off-step.
    pub fn label(&self, time: Timestamp) -> Option<String> {
        if self.step_secs == 0 || time.as_secs() % self.step_secs != 0 {
            return None;
        }
        let secs = i64::try_from(time.as_secs()).ok()?;
        let dt = DateTime::from_timestamp(secs, 0)?;
        let pattern = match self.granularity {
            Granularity::Seconds => "%H:%M:%S",
            Granularity::Minutes => "%H:%M",
        };
        Some(dt.format(pattern).to_string())
    }
}

/// The rendering surface the feed draws into.
///
/// Setters replace or extend the displayed series; getters report geometry
/// and return `None` when the surface has not been laid out yet.
pub trait ChartSurface {
    /// Replace the area series with an ascending, time-unique array.
    fn set_area_data(&mut self, points: &[AreaPoint]);
    /// Replace the candle series with an ascending, time-unique array.
    fn set_candle_data(&mut self, points: &[CandlePoint]);
    /// Append or overwrite the last area point.
    fn update_area(&mut self, point: AreaPoint);
    /// Append or overwrite the last candle.
    fn update_candle(&mut self, point: CandlePoint);
    /// Remove all displayed data.
    fn clear(&mut self);
    /// Switch between the area and candlestick series.
    fn set_series_kind(&mut self, kind: ChartType);

    fn visible_range(&self) -> Option<TimeRange>;
    fn set_visible_range(&mut self, range: TimeRange);
    /// Container width in pixels.
    fn width(&self) -> Option<f64>;
    /// Pixels per bar.
    fn bar_spacing(&self) -> Option<f64>;
    /// Empty bars kept to the right of the latest point.
    fn set_right_offset(&mut self, bars: u32);
    fn scroll_to_realtime(&mut self);
    fn set_tick_format(&mut self, format: TickFormat);
}

impl<T: ChartSurface + ?Sized> ChartSurface for Box<T> {
    fn set_area_data(&mut self, points: &[AreaPoint]) {
        (**self).set_area_data(points)
    }
    fn set_candle_data(&mut self, points: &[CandlePoint]) {
        (**self).set_candle_data(points)
    }
    fn update_area(&mut self, point: AreaPoint) {
        (**self).update_area(point)
    }
    fn update_candle(&mut self, point: CandlePoint) {
        (**self).update_candle(point)
    }
    fn clear(&mut self) {
        (**self).clear()
    }
    fn set_series_kind(&mut self, kind: ChartType) {
        (**self).set_series_kind(kind)
    }
    fn visible_range(&self) -> Option<TimeRange> {
        (**self).visible_range()
    }
    fn set_visible_range(&mut self, range: TimeRange) {
        (**self).set_visible_range(range)
    }
    fn width(&self) -> Option<f64> {
        (**self).width()
    }
    fn bar_spacing(&self) -> Option<f64> {
        (**self).bar_spacing()
    }
    fn set_right_offset(&mut self, bars: u32) {
        (**self).set_right_offset(bars)
    }
    fn scroll_to_realtime(&mut self) {
        (**self).scroll_to_realtime()
    }
    fn set_tick_format(&mut self, format: TickFormat) {
        (**self).set_tick_format(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_span() {
        assert_eq!(TimeRange::new(100u64, 160u64).span_secs(), 60);
        assert_eq!(TimeRange::new(160u64, 100u64).span_secs(), 0);
    }

    #[test]
    fn test_tick_labels() {
        let fine = TickFormat {
            granularity: Granularity::Seconds,
            step_secs: 15,
        };
        // 1700000000 = 2023-11-14 22:13:20 UTC
        assert_eq!(fine.label(Timestamp::from_secs(1_700_000_010)), Some("22:13:30".into()));
        assert_eq!(fine.label(Timestamp::from_secs(1_700_000_011)), None);

        let coarse = TickFormat {
            granularity: Granularity::Minutes,
            step_secs: 1800,
        };
        assert_eq!(coarse.label(Timestamp::from_secs(1_699_999_200)), Some("22:00".into()));
        assert_eq!(coarse.label(Timestamp::from_secs(1_700_000_000)), None);
    }

    #[test]
    fn test_unrepresentable_time_has_no_label() {
        let fine = TickFormat {
            granularity: Granularity::Seconds,
            step_secs: 15,
        };
        // u64::MAX is a multiple of 15 but past any calendar date.
        assert_eq!(fine.label(Timestamp::from_secs(u64::MAX)), None);
    }
}
