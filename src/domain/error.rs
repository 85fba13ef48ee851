//! Domain error types.

/// Top-level error type for pricefeed.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("invalid timeframe: {token}")]
    InvalidTimeframe { token: String },

    #[error("{provider} request failed: {reason}")]
    Vendor { provider: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExchangeError {
    pub fn invalid_timeframe(token: &str) -> Self {
        ExchangeError::InvalidTimeframe {
            token: token.to_string(),
        }
    }

    pub fn vendor(provider: &str, reason: impl Into<String>) -> Self {
        ExchangeError::Vendor {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&ExchangeError> for std::process::ExitCode {
    fn from(err: &ExchangeError) -> Self {
        let code: u8 = match err {
            ExchangeError::Io(_) => 1,
            ExchangeError::ConfigParse { .. }
            | ExchangeError::ConfigMissing { .. }
            | ExchangeError::ConfigInvalid { .. } => 2,
            ExchangeError::InvalidTimeframe { .. } => 3,
            ExchangeError::Vendor { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
