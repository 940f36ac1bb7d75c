//! StockPulse - daily equity signal scoring
//!
//! Computes technical indicators, chart patterns, momentum scores, enriched
//! movers and sector ranks from daily bars, then cross-references them into
//! stock picks and plain-English market insights.

pub mod config;
pub mod error;
pub mod jobs;
pub mod services;
pub mod sources;
pub mod types;

pub use config::Config;
pub use error::{AppError, Result};
pub use jobs::{Job, Pipeline};
pub use types::*;
