//! Domain types — symbols, resolutions, tick types, and daily data points.

pub mod market_data;
pub mod symbol;

pub use market_data::{DataPoint, OpenInterestPoint, Resolution, TickType, TradeBar};
pub use symbol::{OptionContract, OptionRight, SecurityType, Symbol};
