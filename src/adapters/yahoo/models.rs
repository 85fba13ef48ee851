//! Yahoo Finance chart API response models.
//!
//! Only the fields needed to build OHLCV bars are modelled. Yahoo pads
//! missing values with `null`, so every column is a vector of options.

use crate::domain::error::ExchangeError;
use crate::domain::price::PriceBar;
use chrono::DateTime;
use serde::Deserialize;

/// Error code Yahoo reports for unknown or delisted symbols.
pub const NOT_FOUND: &str = "Not Found";

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    // Absent when the range holds no trading sessions.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseColumn>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteColumns {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct AdjCloseColumn {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

fn at(column: &[Option<f64>], idx: usize) -> Option<f64> {
    column.get(idx).copied().flatten()
}

impl ChartResponse {
    /// Flattens the column-oriented payload into bars.
    ///
    /// Rows with a null open, high, low or close are dropped. A "Not Found"
    /// error means the symbol has no data and yields no bars.
    pub fn into_bars(self) -> Result<Vec<PriceBar>, ExchangeError> {
        if let Some(err) = self.chart.error {
            if err.code == NOT_FOUND {
                return Ok(Vec::new());
            }
            let reason = match err.description {
                Some(desc) => format!("{}: {}", err.code, desc),
                None => err.code,
            };
            return Err(ExchangeError::vendor("yahoo", reason));
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };

        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
        let adjclose = result
            .indicators
            .adjclose
            .into_iter()
            .next()
            .map(|c| c.adjclose)
            .unwrap_or_default();

        let bars = result
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                Some(PriceBar {
                    timestamp: DateTime::from_timestamp(ts, 0)?,
                    open: at(&quote.open, i)?,
                    high: at(&quote.high, i)?,
                    low: at(&quote.low, i)?,
                    close: at(&quote.close, i)?,
                    adj_close: at(&adjclose, i),
                    volume: at(&quote.volume, i).unwrap_or(0.0),
                    spread: None,
                })
            })
            .collect();

        Ok(bars)
    }
}
