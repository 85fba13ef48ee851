#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pricefeed::adapters::terminal::{
    TerminalClient, TerminalError, TerminalExchange, TerminalRate, TerminalTimeframe,
};
use pricefeed::adapters::yahoo::{ChartClient, YahooExchange};
use pricefeed::domain::error::ExchangeError;
pub use pricefeed::domain::price::PriceBar;
use std::collections::HashMap;

/// Terminal stand-in: serves canned rates per symbol, can refuse to initialise.
pub struct StubTerminal {
    pub reachable: bool,
    pub rates: HashMap<String, Vec<TerminalRate>>,
    pub initialized: bool,
}

impl StubTerminal {
    pub fn new() -> Self {
        Self {
            reachable: true,
            rates: HashMap::new(),
            initialized: false,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    pub fn with_rates(mut self, symbol: &str, rates: Vec<TerminalRate>) -> Self {
        self.rates.insert(symbol.to_string(), rates);
        self
    }
}

impl TerminalClient for StubTerminal {
    fn initialize(&mut self) -> Result<(), TerminalError> {
        if !self.reachable {
            return Err(TerminalError::new(
                TerminalError::INTERNAL_FAIL_INIT,
                "IPC initialize failed",
            ));
        }
        self.initialized = true;
        Ok(())
    }

    fn copy_rates_range(
        &self,
        symbol: &str,
        _timeframe: TerminalTimeframe,
        time_from: DateTime<Utc>,
        time_to: DateTime<Utc>,
    ) -> Result<Vec<TerminalRate>, TerminalError> {
        Ok(self
            .rates
            .get(symbol)
            .map(|rates| {
                rates
                    .iter()
                    .filter(|r| r.time >= time_from.timestamp() && r.time <= time_to.timestamp())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn shutdown(&mut self) {
        self.initialized = false;
    }
}

/// Yahoo stand-in: serves canned bars per symbol, errors for listed symbols.
pub struct StubChart {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl StubChart {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl ChartClient for StubChart {
    fn download(
        &self,
        symbol: &str,
        _interval: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, ExchangeError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ExchangeError::vendor("yahoo", reason.clone()));
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn make_bar(date: DateTime<Utc>, close: f64) -> PriceBar {
    PriceBar {
        timestamp: date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        adj_close: Some(close),
        volume: 1_000_000.0,
        spread: None,
    }
}

pub fn make_rate(date: DateTime<Utc>, close: f64) -> TerminalRate {
    TerminalRate {
        time: date.timestamp(),
        open: close,
        high: close + 0.001,
        low: close - 0.001,
        close,
        tick_volume: 500,
        spread: 3,
        real_volume: 0,
    }
}

pub fn terminal_exchange() -> TerminalExchange<StubTerminal> {
    TerminalExchange::new(
        StubTerminal::new().with_rates(
            "EURUSD",
            vec![make_rate(utc(2024, 1, 2), 1.094), make_rate(utc(2024, 1, 3), 1.092)],
        ),
    )
}

pub fn yahoo_exchange() -> YahooExchange<StubChart> {
    YahooExchange::new(StubChart::new().with_bars(
        "AAPL",
        vec![make_bar(utc(2021, 1, 4), 129.41), make_bar(utc(2021, 1, 5), 131.01)],
    ))
}

pub fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
