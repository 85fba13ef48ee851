//! pricefeed: uniform access to historical price bars.
//!
//! Hexagonal architecture: domain types in [`domain`], the exchange and
//! configuration port traits in [`ports`], vendor adapters in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
