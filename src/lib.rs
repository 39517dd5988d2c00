//! Aggregation, reporting and projection toolkit for laundry service
//! appointment data.
//!
//! The pipeline is a set of pure reductions over an in-memory array of
//! loosely-structured appointment records: normalize the inconsistent
//! revenue/date/city fields, group, reduce, derive. The projection module
//! turns monthly aggregates into weekly historical + forecast series from
//! injected per-city configuration.

pub mod artifacts;
pub mod config;
pub mod fetch;
pub mod fields;
pub mod loader;
pub mod logging;
pub mod output;
pub mod projection;
pub mod reports;
pub mod sample;
pub mod types;
pub mod util;
