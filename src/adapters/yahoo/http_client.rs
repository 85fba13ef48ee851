//! Blocking HTTP client for the Yahoo Finance chart endpoint.

use super::ChartClient;
use super::models::ChartResponse;
use crate::domain::error::ExchangeError;
use crate::domain::price::PriceBar;
use crate::ports::config_port::ConfigPort;
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
pub const DEFAULT_TIMEOUT_SECS: i64 = 30;

#[derive(Debug, Clone)]
pub struct YahooSettings {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for YahooSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS as u64),
        }
    }
}

impl YahooSettings {
    /// Reads the `[yahoo]` section; every key is optional.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ExchangeError> {
        let defaults = Self::default();
        let timeout_secs = config.get_int("yahoo", "timeout_secs", DEFAULT_TIMEOUT_SECS);
        if timeout_secs <= 0 {
            return Err(ExchangeError::ConfigInvalid {
                section: "yahoo".into(),
                key: "timeout_secs".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(Self {
            base_url: config
                .get_string("yahoo", "base_url")
                .unwrap_or(defaults.base_url),
            user_agent: config
                .get_string("yahoo", "user_agent")
                .unwrap_or(defaults.user_agent),
            timeout: Duration::from_secs(timeout_secs as u64),
        })
    }
}

pub struct YahooHttpClient {
    client: Client,
    base_url: Url,
}

impl YahooHttpClient {
    pub fn new(settings: YahooSettings) -> Result<Self, ExchangeError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| ExchangeError::ConfigInvalid {
            section: "yahoo".into(),
            key: "base_url".into(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .user_agent(settings.user_agent)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                ExchangeError::vendor("yahoo", format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client, base_url })
    }

    fn chart_url(&self, symbol: &str) -> Result<Url, ExchangeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ExchangeError::vendor("yahoo", "base URL cannot take a path"))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

impl ChartClient for YahooHttpClient {
    fn download(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, ExchangeError> {
        let url = self.chart_url(symbol)?;
        debug!(%url, interval, "requesting chart");

        let response = self
            .client
            .get(url)
            .query(&[
                ("period1", start.timestamp().to_string()),
                ("period2", end.timestamp().to_string()),
                ("interval", interval.to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .map_err(|e| ExchangeError::vendor("yahoo", format!("request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let body = response
            .text()
            .map_err(|e| ExchangeError::vendor("yahoo", format!("failed to read body: {e}")))?;

        // Error statuses still carry a chart.error payload worth reporting.
        match serde_json::from_str::<ChartResponse>(&body) {
            Ok(chart) => chart.into_bars(),
            Err(_) if !status.is_success() => {
                Err(ExchangeError::vendor("yahoo", format!("HTTP {status}")))
            }
            Err(e) => Err(ExchangeError::vendor(
                "yahoo",
                format!("invalid chart payload: {e}"),
            )),
        }
    }
}
