//! Conversions from wire types to validated series points.
//!
//! This is the decode boundary: a payload either becomes a typed point for
//! the active chart type or is rejected here, before it reaches a buffer.

use super::wire::{AreaStream, CandleStream};
use super::{AreaPoint, Batch, CandlePoint, DecodedBatch, Tick, TickPoint};
use crate::error::DecodeError;
use crate::shared::{ChartType, Symbol, Topic};
use serde::Deserialize;
use serde_json::Value;

impl TryFrom<AreaStream> for AreaPoint {
    type Error = DecodeError;

    fn try_from(p: AreaStream) -> Result<Self, Self::Error> {
        if !p.value.is_finite() {
            return Err(DecodeError::Shape(format!("non-finite value {}", p.value)));
        }
        Ok(Self {
            time: p.time.normalize()?,
            value: p.value,
        })
    }
}

impl TryFrom<CandleStream> for CandlePoint {
    type Error = DecodeError;

    fn try_from(c: CandleStream) -> Result<Self, Self::Error> {
        let raw = c
            .raw_time()
            .ok_or_else(|| DecodeError::Shape("candle without time or timestamp".into()))?;
        let candle = Self {
            time: raw.normalize()?,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
        };

        if !candle.is_consistent() {
            return Err(DecodeError::InvalidCandle {
                time: candle.time.as_secs(),
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
            });
        }
        Ok(candle)
    }
}

/// Wire points that may name the symbol they belong to.
trait Tagged {
    fn symbol(&self) -> Option<&Symbol>;
}

impl Tagged for AreaStream {
    fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }
}

impl Tagged for CandleStream {
    fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }
}

/// Decode a backfill page for `topic`.
///
/// Fails only when the payload is not an array. Points that fail validation
/// are skipped and counted in [`DecodedBatch::dropped`]; points tagged with
/// a symbol other than `topic.symbol` are skipped and counted in
/// [`DecodedBatch::stale`].
pub fn decode_batch(topic: &Topic, value: &Value) -> Result<DecodedBatch, DecodeError> {
    let items = value.as_array().ok_or(DecodeError::NotABatch)?;

    let mut counts = Counts::default();
    let symbol = &topic.symbol;
    let batch = match topic.chart_type {
        ChartType::Area => {
            Batch::Area(collect_valid::<AreaStream, AreaPoint>(items, symbol, &mut counts))
        }
        ChartType::Candle => {
            Batch::Candle(collect_valid::<CandleStream, CandlePoint>(items, symbol, &mut counts))
        }
    };

    Ok(DecodedBatch {
        batch,
        dropped: counts.dropped,
        stale: counts.stale,
    })
}

#[derive(Default)]
struct Counts {
    dropped: usize,
    stale: usize,
}

fn collect_valid<'a, W, P>(items: &'a [Value], symbol: &Symbol, counts: &mut Counts) -> Vec<P>
where
    W: Deserialize<'a> + Tagged,
    P: TryFrom<W, Error = DecodeError>,
{
    let mut points = Vec::with_capacity(items.len());
    for item in items {
        let wire = match W::deserialize(item) {
            Ok(wire) => wire,
            Err(e) => {
                tracing::debug!("Dropping backfill point: {}", e);
                counts.dropped += 1;
                continue;
            }
        };
        if let Some(tagged) = wire.symbol().filter(|s| *s != symbol) {
            tracing::debug!("Dropping stale backfill point for {} (active {})", tagged, symbol);
            counts.stale += 1;
            continue;
        }
        match P::try_from(wire) {
            Ok(point) => points.push(point),
            Err(e) => {
                tracing::debug!("Dropping backfill point: {}", e);
                counts.dropped += 1;
            }
        }
    }
    points
}

/// Decode a single live tick for `chart_type`.
pub fn decode_tick(chart_type: ChartType, value: &Value) -> Result<Tick, DecodeError> {
    match chart_type {
        ChartType::Area => {
            let wire = AreaStream::deserialize(value)?;
            let symbol = wire.symbol.clone();
            Ok(Tick {
                symbol,
                point: TickPoint::Area(wire.try_into()?),
            })
        }
        ChartType::Candle => {
            let wire = CandleStream::deserialize(value)?;
            let symbol = wire.symbol.clone();
            Ok(Tick {
                symbol,
                point: TickPoint::Candle(wire.try_into()?),
            })
        }
    }
}
