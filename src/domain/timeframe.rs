//! Canonical timeframe catalog.
//!
//! The catalog is closed and shared by every exchange adapter. Adapters map a
//! subset of it onto their own vendor tokens; see
//! [`Exchange::supports`](crate::ports::exchange_port::Exchange::supports).

use crate::domain::error::ExchangeError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Bar granularity, named the way traders write it (`M1`, `H4`, `D1`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    M1,
    M2,
    M3,
    M4,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    H8,
    H12,
    D1,
    W1,
    MN1,
}

impl Timeframe {
    /// Every member of the catalog, finest granularity first.
    pub const ALL: [Timeframe; 15] = [
        Timeframe::M1,
        Timeframe::M2,
        Timeframe::M3,
        Timeframe::M4,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H2,
        Timeframe::H4,
        Timeframe::H8,
        Timeframe::H12,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::MN1,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M2 => "M2",
            Timeframe::M3 => "M3",
            Timeframe::M4 => "M4",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H2 => "H2",
            Timeframe::H4 => "H4",
            Timeframe::H8 => "H8",
            Timeframe::H12 => "H12",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
            Timeframe::MN1 => "MN1",
        }
    }

    /// Exact, case-sensitive membership test against the catalog names.
    pub fn is_valid(token: &str) -> bool {
        Self::ALL.iter().any(|tf| tf.as_str() == token)
    }

    /// Nominal length of one bar. A month counts as 30 days.
    pub fn duration(self) -> Duration {
        const MINUTE: u64 = 60;
        const HOUR: u64 = 60 * MINUTE;
        const DAY: u64 = 24 * HOUR;
        let secs = match self {
            Timeframe::M1 => MINUTE,
            Timeframe::M2 => 2 * MINUTE,
            Timeframe::M3 => 3 * MINUTE,
            Timeframe::M4 => 4 * MINUTE,
            Timeframe::M5 => 5 * MINUTE,
            Timeframe::M15 => 15 * MINUTE,
            Timeframe::M30 => 30 * MINUTE,
            Timeframe::H1 => HOUR,
            Timeframe::H2 => 2 * HOUR,
            Timeframe::H4 => 4 * HOUR,
            Timeframe::H8 => 8 * HOUR,
            Timeframe::H12 => 12 * HOUR,
            Timeframe::D1 => DAY,
            Timeframe::W1 => 7 * DAY,
            Timeframe::MN1 => 30 * DAY,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|tf| tf.as_str() == s)
            .ok_or_else(|| ExchangeError::invalid_timeframe(s))
    }
}
