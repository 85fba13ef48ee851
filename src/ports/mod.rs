//! Port traits implemented by the adapters.

pub mod exchange_port;
pub mod config_port;
