//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod terminal;
pub mod yahoo;

use crate::domain::error::ExchangeError;
use crate::ports::config_port::ConfigPort;
use crate::ports::exchange_port::Exchange;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use terminal::{ExportDirClient, TerminalExchange};
use yahoo::{YahooExchange, YahooHttpClient, YahooSettings};

/// Market-data vendors pricefeed can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    Terminal,
    Yahoo,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Terminal, Provider::Yahoo];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Terminal => "terminal",
            Provider::Yahoo => "yahoo",
        }
    }

    /// `--provider` wins over `[exchange] provider`; yahoo when neither is set.
    pub fn resolve(
        explicit: Option<Provider>,
        config: &dyn ConfigPort,
    ) -> Result<Provider, ExchangeError> {
        if let Some(p) = explicit {
            return Ok(p);
        }
        match config.get_string("exchange", "provider") {
            Some(name) => name.parse(),
            None => Ok(Provider::Yahoo),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terminal" | "mt5" => Ok(Provider::Terminal),
            "yahoo" | "yfinance" => Ok(Provider::Yahoo),
            other => Err(ExchangeError::ConfigInvalid {
                section: "exchange".into(),
                key: "provider".into(),
                reason: format!("unknown provider '{other}' (expected terminal or yahoo)"),
            }),
        }
    }
}

/// Builds the adapter for `provider` from its config section.
pub fn build_exchange(
    provider: Provider,
    config: &dyn ConfigPort,
) -> Result<Box<dyn Exchange>, ExchangeError> {
    match provider {
        Provider::Terminal => {
            let export_dir = config.require_string("terminal", "export_dir")?;
            let client = ExportDirClient::new(PathBuf::from(export_dir));
            Ok(Box::new(TerminalExchange::new(client)))
        }
        Provider::Yahoo => {
            let settings = YahooSettings::from_config(config)?;
            let client = YahooHttpClient::new(settings)?;
            Ok(Box::new(YahooExchange::new(client)))
        }
    }
}
