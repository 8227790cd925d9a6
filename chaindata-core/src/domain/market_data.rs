//! Market-data vocabulary — resolutions, tick types, and the daily point
//! shapes the vendor returns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::symbol::Symbol;

/// Sampling granularity of time-series data.
///
/// The download job only supports `Daily`; the other granularities exist so
/// requests can state what they actually wanted and be rejected precisely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Tick,
    Second,
    Minute,
    Hour,
    Daily,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resolution::Tick => "tick",
            Resolution::Second => "second",
            Resolution::Minute => "minute",
            Resolution::Hour => "hour",
            Resolution::Daily => "daily",
        })
    }
}

/// Category of market observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickType {
    Trade,
    OpenInterest,
}

impl fmt::Display for TickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TickType::Trade => "trade",
            TickType::OpenInterest => "openinterest",
        })
    }
}

/// One daily trade bar for a single contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeBar {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// One daily open-interest observation for a single contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestPoint {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub open_interest: u64,
}

/// A vendor observation of either kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataPoint {
    Trade(TradeBar),
    OpenInterest(OpenInterestPoint),
}

impl DataPoint {
    pub fn symbol(&self) -> &Symbol {
        match self {
            DataPoint::Trade(bar) => &bar.symbol,
            DataPoint::OpenInterest(oi) => &oi.symbol,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            DataPoint::Trade(bar) => bar.date,
            DataPoint::OpenInterest(oi) => oi.date,
        }
    }

    pub fn tick_type(&self) -> TickType {
        match self {
            DataPoint::Trade(_) => TickType::Trade,
            DataPoint::OpenInterest(_) => TickType::OpenInterest,
        }
    }
}
