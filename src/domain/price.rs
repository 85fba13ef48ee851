//! Price bar, series and batch representations.

use crate::domain::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// One OHLCV bar as returned by any exchange adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Split/dividend adjusted close. Only some vendors supply it.
    pub adj_close: Option<f64>,
    pub volume: f64,
    /// Spread in points. Only the trading terminal supplies it.
    pub spread: Option<i32>,
}

/// Ordered bars for one symbol over a requested range.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Builds a series, sorting bars by timestamp.
    pub fn new(symbol: &str, timeframe: Timeframe, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        Self {
            symbol: symbol.to_string(),
            timeframe,
            bars,
        }
    }

    pub fn empty(symbol: &str, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe,
            bars: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Timestamps of the first and last bar, if any.
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }
}

/// Symbol to series, in request order, one entry per distinct symbol.
pub type PriceSeriesBatch = IndexMap<String, PriceSeries>;
