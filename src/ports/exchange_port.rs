//! Exchange access port trait.
//!
//! Every market-data provider is reached through [`Exchange`]. Callers
//! `connect`, fetch with [`Exchange::get_prices`] or
//! [`Exchange::get_several_asset_prices`], then `disconnect`.

use crate::domain::error::ExchangeError;
use crate::domain::price::{PriceSeries, PriceSeriesBatch};
use crate::domain::timeframe::Timeframe;
use chrono::{DateTime, Utc};

/// Connection lifecycle of an adapter. Both transitions are idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

pub trait Exchange {
    /// Short provider identifier used in logs and on the command line.
    fn name(&self) -> &'static str;

    /// True iff this adapter has a vendor mapping for `timeframe`.
    fn supports(&self, timeframe: Timeframe) -> bool;

    /// Establishes or verifies readiness. Failures are logged, not returned.
    fn connect(&mut self) -> bool;

    /// Releases the vendor client if one was acquired. No-op when disconnected.
    fn disconnect(&mut self);

    /// Fetches bars for one symbol.
    ///
    /// Fails with [`ExchangeError::InvalidTimeframe`] when `timeframe` is not
    /// supported here; vendor-side failures come back as an empty series.
    fn get_prices(
        &mut self,
        symbol: &str,
        timeframe: &str,
        time_from: DateTime<Utc>,
        time_to: DateTime<Utc>,
    ) -> Result<PriceSeries, ExchangeError>;

    fn is_valid_timeframe(&self, token: &str) -> bool {
        self.resolve_timeframe(token).is_ok()
    }

    /// Parses `token` and checks this adapter supports it.
    fn resolve_timeframe(&self, token: &str) -> Result<Timeframe, ExchangeError> {
        let timeframe: Timeframe = token.parse()?;
        if self.supports(timeframe) {
            Ok(timeframe)
        } else {
            Err(ExchangeError::invalid_timeframe(token))
        }
    }

    fn supported_timeframes(&self) -> Vec<Timeframe> {
        Timeframe::ALL
            .iter()
            .copied()
            .filter(|tf| self.supports(*tf))
            .collect()
    }

    /// Calls [`Exchange::get_prices`] once per distinct symbol, in order.
    ///
    /// The first error aborts the whole batch.
    fn get_several_asset_prices(
        &mut self,
        symbols: &[String],
        timeframe: &str,
        time_from: DateTime<Utc>,
        time_to: DateTime<Utc>,
    ) -> Result<PriceSeriesBatch, ExchangeError> {
        let mut batch = PriceSeriesBatch::with_capacity(symbols.len());
        for symbol in symbols {
            if batch.contains_key(symbol) {
                continue;
            }
            let series = self.get_prices(symbol, timeframe, time_from, time_to)?;
            batch.insert(symbol.clone(), series);
        }
        Ok(batch)
    }
}
