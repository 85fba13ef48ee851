//! Configuration access port trait.

use crate::domain::error::ExchangeError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;

    /// Like [`ConfigPort::get_string`], but a missing or blank value is an error.
    fn require_string(&self, section: &str, key: &str) -> Result<String, ExchangeError> {
        self.get_string(section, key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ExchangeError::ConfigMissing {
                section: section.into(),
                key: key.into(),
            })
    }
}
