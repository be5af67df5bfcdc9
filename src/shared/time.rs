//! Canonical timestamps and the point normalizer.
//!
//! Every time value that reaches a series buffer goes through [`Timestamp`]:
//! seconds, milliseconds and ISO-8601 strings all collapse to whole seconds
//! since the Unix epoch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimestampError;

/// Numbers at or above this are epoch milliseconds, anything below is seconds.
///
/// `1e11` seconds is the year 5138 while `1e11` milliseconds is 1973, so the
/// two ranges never overlap for market data.
pub const MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

/// Latest accepted time, `9999-12-31T23:59:59Z`.
pub const MAX_SECS: u64 = 253_402_300_799;

/// Whole seconds since the Unix epoch. The sole ordering and dedup key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Wall-clock now, floored to the second.
    pub fn now() -> Self {
        Self(Utc::now().timestamp().max(0) as u64)
    }

    /// Normalize a numeric time that may be seconds or milliseconds.
    pub fn from_number(value: f64) -> Result<Self, TimestampError> {
        if !value.is_finite() {
            return Err(TimestampError::NotFinite(value));
        }
        if value < 0.0 {
            return Err(TimestampError::Negative(value));
        }

        let secs = if value >= MILLIS_THRESHOLD {
            (value / 1000.0).floor()
        } else {
            value.floor()
        };
        if secs > MAX_SECS as f64 {
            return Err(TimestampError::OutOfRange(value));
        }
        Ok(Self(secs as u64))
    }

    /// Parse an ISO-8601 date/time string into floored epoch seconds.
    ///
    /// Strings without an offset are read as UTC.
    pub fn parse_iso(s: &str) -> Result<Self, TimestampError> {
        let s = s.trim();
        let millis = if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            dt.timestamp_millis()
        } else if let Some(naive) = parse_naive(s) {
            naive.and_utc().timestamp_millis()
        } else {
            return Err(TimestampError::Unparseable(s.to_string()));
        };

        if millis < 0 {
            return Err(TimestampError::Negative(millis as f64 / 1000.0));
        }
        let secs = (millis / 1000) as u64;
        if secs > MAX_SECS {
            return Err(TimestampError::OutOfRange(secs as f64));
        }
        Ok(Self(secs))
    }
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

// ─── RawTime ─────────────────────────────────────────────────────────────────

/// A time value as it appears on the wire, before normalization.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawTime {
    Number(f64),
    Text(String),
}

impl RawTime {
    pub fn normalize(&self) -> Result<Timestamp, TimestampError> {
        match self {
            RawTime::Number(n) => Timestamp::from_number(*n),
            RawTime::Text(s) => Timestamp::parse_iso(s),
        }
    }
}

impl TryFrom<&RawTime> for Timestamp {
    type Error = TimestampError;

    fn try_from(raw: &RawTime) -> Result<Self, Self::Error> {
        raw.normalize()
    }
}
