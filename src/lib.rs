//! mtftrader: multi-timeframe trend signal and position decision engine.
//!
//! Daily bars are aggregated into weekly and monthly series as of each
//! simulation date, scored into a hysteretic trend state, and turned into
//! position decisions. Hexagonal architecture: domain logic in [`domain`],
//! port traits in [`ports`], concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
