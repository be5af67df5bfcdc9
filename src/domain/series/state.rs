//! Series state containers: backfill reconciliation and live updates.

use super::SeriesPoint;
use crate::shared::Timestamp;
use std::collections::BTreeMap;

/// Collapse `items` to one point per timestamp, ascending by time.
///
/// On a timestamp collision the later entry in `items` wins.
pub fn dedupe<P: SeriesPoint>(items: impl IntoIterator<Item = P>) -> Vec<P> {
    let by_time: BTreeMap<Timestamp, P> = items.into_iter().map(|p| (p.time(), p)).collect();
    by_time.into_values().collect()
}

/// Merge a backfill batch into an existing buffer.
///
/// The batch is placed before the existing points, so existing entries win on
/// collision and a page that was already merged changes nothing. Returns the
/// merged points and the earliest timestamp among them.
pub fn reconcile<P: SeriesPoint>(existing: &[P], incoming: &[P]) -> (Vec<P>, Option<Timestamp>) {
    let merged = dedupe(incoming.iter().chain(existing.iter()).cloned());
    let earliest = merged.first().map(SeriesPoint::time);
    (merged, earliest)
}

/// Outcome of applying a live tick to a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveUpdate {
    /// The tick opened a new period and was appended.
    Appended,
    /// The tick updated the in-progress period (same timestamp as the last point).
    Replaced,
    /// The tick is older than the last point and was dropped.
    OutOfOrder { last: Timestamp },
}

impl LiveUpdate {
    pub fn is_applied(&self) -> bool {
        !matches!(self, LiveUpdate::OutOfOrder { .. })
    }
}

/// Ascending, unique-by-time buffer backing the active chart series.
///
/// The feed owns one instance per subscription; it is replaced wholesale
/// when the topic changes.
#[derive(Debug, Clone)]
pub struct SeriesBuffer<P> {
    points: Vec<P>,
}

impl<P> Default for SeriesBuffer<P> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<P: SeriesPoint> SeriesBuffer<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer from arbitrary points, deduplicating and sorting them.
    pub fn from_points(points: impl IntoIterator<Item = P>) -> Self {
        Self {
            points: dedupe(points),
        }
    }

    /// Merge a backfill page. Returns the earliest timestamp afterwards.
    pub fn merge_backfill(&mut self, batch: &[P]) -> Option<Timestamp> {
        let (merged, earliest) = reconcile(&self.points, batch);
        self.points = merged;
        earliest
    }

    /// Apply a live tick without re-sorting.
    pub fn apply_live(&mut self, point: P) -> LiveUpdate {
        let Some(last) = self.points.last_mut() else {
            self.points.push(point);
            return LiveUpdate::Appended;
        };

        let (last_time, time) = (last.time(), point.time());
        if time == last_time {
            *last = point;
            LiveUpdate::Replaced
        } else if time > last_time {
            self.points.push(point);
            LiveUpdate::Appended
        } else {
            LiveUpdate::OutOfOrder { last: last_time }
        }
    }

    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Minimum time present, used to anchor the next backfill request.
    pub fn earliest(&self) -> Option<Timestamp> {
        self.points.first().map(SeriesPoint::time)
    }

    pub fn latest(&self) -> Option<Timestamp> {
        self.points.last().map(SeriesPoint::time)
    }

    pub fn bounds(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.earliest()?, self.latest()?))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
