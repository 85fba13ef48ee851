//! Retail trading terminal adapter.
//!
//! The terminal keeps its own process-wide session; [`TerminalExchange`]
//! wraps it behind an owned [`TerminalClient`] handle and tracks whether it
//! has been initialised.

pub mod export_client;

use crate::domain::error::ExchangeError;
use crate::domain::price::{PriceBar, PriceSeries};
use crate::domain::timeframe::Timeframe;
use crate::ports::exchange_port::{ConnectionState, Exchange};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

pub use export_client::ExportDirClient;

/// Native timeframe constant understood by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerminalTimeframe(pub u32);

impl TerminalTimeframe {
    pub const M1: Self = Self(1);
    pub const M2: Self = Self(2);
    pub const M3: Self = Self(3);
    pub const M4: Self = Self(4);
    pub const M5: Self = Self(5);
    pub const M15: Self = Self(15);
    pub const M30: Self = Self(30);
    pub const H1: Self = Self(1 | 0x4000);
    pub const H2: Self = Self(2 | 0x4000);
    pub const H4: Self = Self(4 | 0x4000);
    pub const H8: Self = Self(8 | 0x4000);
    pub const H12: Self = Self(12 | 0x4000);
    pub const D1: Self = Self(24 | 0x4000);
    pub const W1: Self = Self(1 | 0x8000);
    pub const MN1: Self = Self(1 | 0xC000);

    /// Label the terminal uses in chart titles and export file names.
    pub fn label(self) -> Option<&'static str> {
        TERMINAL_TIMEFRAMES
            .iter()
            .find(|(_, native)| *native == self)
            .map(|(tf, _)| tf.as_str())
    }
}

const TERMINAL_TIMEFRAMES: [(Timeframe, TerminalTimeframe); 15] = [
    (Timeframe::M1, TerminalTimeframe::M1),
    (Timeframe::M2, TerminalTimeframe::M2),
    (Timeframe::M3, TerminalTimeframe::M3),
    (Timeframe::M4, TerminalTimeframe::M4),
    (Timeframe::M5, TerminalTimeframe::M5),
    (Timeframe::M15, TerminalTimeframe::M15),
    (Timeframe::M30, TerminalTimeframe::M30),
    (Timeframe::H1, TerminalTimeframe::H1),
    (Timeframe::H2, TerminalTimeframe::H2),
    (Timeframe::H4, TerminalTimeframe::H4),
    (Timeframe::H8, TerminalTimeframe::H8),
    (Timeframe::H12, TerminalTimeframe::H12),
    (Timeframe::D1, TerminalTimeframe::D1),
    (Timeframe::W1, TerminalTimeframe::W1),
    (Timeframe::MN1, TerminalTimeframe::MN1),
];

pub fn terminal_timeframe(timeframe: Timeframe) -> Option<TerminalTimeframe> {
    TERMINAL_TIMEFRAMES
        .iter()
        .find(|(tf, _)| *tf == timeframe)
        .map(|(_, native)| *native)
}

/// Result code and description reported by the terminal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("terminal error {code}: {description}")]
pub struct TerminalError {
    pub code: i32,
    pub description: String,
}

impl TerminalError {
    pub const FAIL: i32 = -1;
    pub const INVALID_PARAMS: i32 = -2;
    pub const NOT_FOUND: i32 = -4;
    pub const INTERNAL_FAIL_INIT: i32 = -10003;

    pub fn new(code: i32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }
}

/// One bar as the terminal hands it out. `time` is seconds since the epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalRate {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub tick_volume: u64,
    pub spread: i32,
    pub real_volume: u64,
}

impl TerminalRate {
    /// Exchange volume when the symbol reports it, tick count otherwise.
    pub fn volume(&self) -> u64 {
        if self.real_volume > 0 {
            self.real_volume
        } else {
            self.tick_volume
        }
    }
}

/// The terminal's call surface.
pub trait TerminalClient {
    /// Attaches to the terminal. Calling it while attached succeeds again.
    fn initialize(&mut self) -> Result<(), TerminalError>;

    /// Bars with `time_from <= time <= time_to`. An unknown symbol yields no rows.
    fn copy_rates_range(
        &self,
        symbol: &str,
        timeframe: TerminalTimeframe,
        time_from: DateTime<Utc>,
        time_to: DateTime<Utc>,
    ) -> Result<Vec<TerminalRate>, TerminalError>;

    fn shutdown(&mut self);
}

pub struct TerminalExchange<C: TerminalClient> {
    client: C,
    state: ConnectionState,
}

impl<C: TerminalClient> TerminalExchange<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn to_bar(rate: &TerminalRate) -> Option<PriceBar> {
        Some(PriceBar {
            timestamp: DateTime::from_timestamp(rate.time, 0)?,
            open: rate.open,
            high: rate.high,
            low: rate.low,
            close: rate.close,
            adj_close: None,
            volume: rate.volume() as f64,
            spread: Some(rate.spread),
        })
    }
}

impl<C: TerminalClient> Exchange for TerminalExchange<C> {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn supports(&self, timeframe: Timeframe) -> bool {
        terminal_timeframe(timeframe).is_some()
    }

    // A failed initialize is reported as `false` and logged with the
    // terminal's own error code.
    fn connect(&mut self) -> bool {
        if self.state == ConnectionState::Connected {
            return true;
        }
        match self.client.initialize() {
            Ok(()) => {
                info!("terminal initialized");
                self.state = ConnectionState::Connected;
                true
            }
            Err(e) => {
                error!(code = e.code, description = %e.description, "terminal initialize failed");
                false
            }
        }
    }

    fn disconnect(&mut self) {
        if self.state == ConnectionState::Connected {
            self.client.shutdown();
            self.state = ConnectionState::Disconnected;
            info!("terminal connection closed");
        }
    }

    fn get_prices(
        &mut self,
        symbol: &str,
        timeframe: &str,
        time_from: DateTime<Utc>,
        time_to: DateTime<Utc>,
    ) -> Result<PriceSeries, ExchangeError> {
        let tf = self.resolve_timeframe(timeframe)?;
        let native =
            terminal_timeframe(tf).ok_or_else(|| ExchangeError::invalid_timeframe(timeframe))?;

        if !self.connect() {
            warn!(symbol, "terminal unavailable, returning no bars");
            return Ok(PriceSeries::empty(symbol, tf));
        }

        let rates = match self.client.copy_rates_range(symbol, native, time_from, time_to) {
            Ok(rates) => rates,
            Err(e) => {
                warn!(symbol, timeframe = %tf, error = %e, "copy_rates_range failed");
                return Ok(PriceSeries::empty(symbol, tf));
            }
        };

        let bars: Vec<PriceBar> = rates.iter().filter_map(Self::to_bar).collect();
        debug!(symbol, timeframe = %tf, bars = bars.len(), "terminal rates received");
        Ok(PriceSeries::new(symbol, tf, bars))
    }
}
