//! Yahoo Finance adapter.
//!
//! Yahoo is a stateless HTTP service, so there is nothing to attach to:
//! `connect` always succeeds and data calls go straight to the vendor.

pub mod http_client;
pub mod models;

use crate::domain::error::ExchangeError;
use crate::domain::price::{PriceBar, PriceSeries};
use crate::domain::timeframe::Timeframe;
use crate::ports::exchange_port::{ConnectionState, Exchange};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

pub use http_client::{YahooHttpClient, YahooSettings};

/// Canonical timeframe to Yahoo `interval` parameter.
///
/// Yahoo has no 3m, 4m, 2h, 4h, 8h or 12h bars; those stay unmapped.
const YAHOO_INTERVALS: [(Timeframe, &str); 9] = [
    (Timeframe::M1, "1m"),
    (Timeframe::M2, "2m"),
    (Timeframe::M5, "5m"),
    (Timeframe::M15, "15m"),
    (Timeframe::M30, "30m"),
    (Timeframe::H1, "60m"),
    (Timeframe::D1, "1d"),
    (Timeframe::W1, "1wk"),
    (Timeframe::MN1, "1mo"),
];

pub fn yahoo_interval(timeframe: Timeframe) -> Option<&'static str> {
    YAHOO_INTERVALS
        .iter()
        .find(|(tf, _)| *tf == timeframe)
        .map(|(_, interval)| *interval)
}

/// The chart download call surface.
pub trait ChartClient {
    /// Bars for `symbol` between `start` and `end`. An unknown symbol yields no bars.
    fn download(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, ExchangeError>;
}

pub struct YahooExchange<C: ChartClient = YahooHttpClient> {
    client: C,
    state: ConnectionState,
}

impl<C: ChartClient> YahooExchange<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }
}

impl<C: ChartClient> Exchange for YahooExchange<C> {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn supports(&self, timeframe: Timeframe) -> bool {
        yahoo_interval(timeframe).is_some()
    }

    fn connect(&mut self) -> bool {
        self.state = ConnectionState::Connected;
        true
    }

    fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    fn get_prices(
        &mut self,
        symbol: &str,
        timeframe: &str,
        time_from: DateTime<Utc>,
        time_to: DateTime<Utc>,
    ) -> Result<PriceSeries, ExchangeError> {
        let tf = self.resolve_timeframe(timeframe)?;
        let interval =
            yahoo_interval(tf).ok_or_else(|| ExchangeError::invalid_timeframe(timeframe))?;

        match self.client.download(symbol, interval, time_from, time_to) {
            Ok(bars) => {
                debug!(symbol, interval, bars = bars.len(), "yahoo chart received");
                Ok(PriceSeries::new(symbol, tf, bars))
            }
            Err(e) => {
                warn!(symbol, interval, error = %e, "yahoo download failed");
                Ok(PriceSeries::empty(symbol, tf))
            }
        }
    }
}
