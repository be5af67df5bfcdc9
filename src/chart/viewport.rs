//! Viewport controller: visible window, right offset and tick density.

use super::{ChartSurface, Granularity, TickFormat, TimeRange};
use crate::shared::Timestamp;

/// Thresholds for the viewport policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    /// Total padding as a multiple of the data span.
    pub padding_factor: f64,
    /// Share of the padding placed before the first point.
    pub past_share: f64,
    /// Share of the padding placed after the last point.
    pub future_share: f64,
    /// Lower bound on bars used to derive the right offset.
    pub min_bars: u32,
    /// Width assumed when the surface reports none.
    pub default_width: f64,
    /// Bar spacing assumed when the surface reports none.
    pub default_bar_spacing: f64,
    /// Visible spans at or below this many seconds get second-level labels.
    pub zoom_threshold_secs: u64,
    pub fine_step_secs: u64,
    pub coarse_step_secs: u64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            padding_factor: 1.0,
            past_share: 0.3,
            future_share: 0.7,
            min_bars: 10,
            default_width: 600.0,
            default_bar_spacing: 6.0,
            zoom_threshold_secs: 600,
            fine_step_secs: 15,
            coarse_step_secs: 1800,
        }
    }
}

/// Reacts to data and geometry changes by steering the surface.
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    config: ViewportConfig,
}

impl ViewportController {
    pub fn new(config: ViewportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Window covering `[first, last]` plus asymmetric padding, clamped at 0.
    pub fn padded_range(&self, first: Timestamp, last: Timestamp) -> TimeRange {
        let (lo, hi) = if first <= last { (first, last) } else { (last, first) };
        let span = (hi.as_secs() - lo.as_secs()).max(1) as f64;
        let pad = span * self.config.padding_factor;

        let from = (lo.as_secs() as f64 - self.config.past_share * pad).max(0.0).floor();
        let to = (hi.as_secs() as f64 + self.config.future_share * pad).ceil();
        TimeRange::new(from as u64, to as u64)
    }

    /// `max(min_bars, width / spacing) / 2`, with geometry fallbacks.
    pub fn right_offset(&self, width: Option<f64>, bar_spacing: Option<f64>) -> u32 {
        let width = width
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(self.config.default_width);
        let spacing = bar_spacing
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(self.config.default_bar_spacing);

        let bars = ((width / spacing).floor() as u32).max(self.config.min_bars);
        bars / 2
    }

    pub fn tick_format(&self, span_secs: u64) -> TickFormat {
        if span_secs <= self.config.zoom_threshold_secs {
            TickFormat {
                granularity: Granularity::Seconds,
                step_secs: self.config.fine_step_secs,
            }
        } else {
            TickFormat {
                granularity: Granularity::Minutes,
                step_secs: self.config.coarse_step_secs,
            }
        }
    }

    /// After a backfill merge: frame the whole series and follow realtime.
    pub fn on_bulk_load<S: ChartSurface + ?Sized>(&self, surface: &mut S, bounds: Option<(Timestamp, Timestamp)>) {
        let Some((first, last)) = bounds else {
            return;
        };
        let range = self.padded_range(first, last);
        tracing::debug!("Viewport: bulk load framed {}..{}", range.from, range.to);
        surface.set_visible_range(range);
        self.sync_right_offset(surface);
        self.refresh_tick_format(surface);
        surface.scroll_to_realtime();
    }

    /// After a live tick was applied.
    pub fn on_live_update<S: ChartSurface + ?Sized>(&self, surface: &mut S) {
        self.sync_right_offset(surface);
        surface.scroll_to_realtime();
    }

    /// The container was resized.
    pub fn on_resize<S: ChartSurface + ?Sized>(&self, surface: &mut S) {
        self.sync_right_offset(surface);
        self.refresh_tick_format(surface);
    }

    /// The user panned or zoomed.
    pub fn on_range_change<S: ChartSurface + ?Sized>(&self, surface: &mut S) {
        self.sync_right_offset(surface);
        self.refresh_tick_format(surface);
    }

    fn sync_right_offset<S: ChartSurface + ?Sized>(&self, surface: &mut S) {
        let offset = self.right_offset(surface.width(), surface.bar_spacing());
        surface.set_right_offset(offset);
    }

    fn refresh_tick_format<S: ChartSurface + ?Sized>(&self, surface: &mut S) {
        if let Some(range) = surface.visible_range() {
            surface.set_tick_format(self.tick_format(range.span_secs()));
        }
    }
}
