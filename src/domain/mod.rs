//! Core domain types.

pub mod timeframe;
pub mod price;
pub mod error;
