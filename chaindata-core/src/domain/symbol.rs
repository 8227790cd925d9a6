//! Symbols — canonical contract-family roots and concrete option contracts.
//!
//! A canonical symbol names a whole family of derivative contracts (the SPX
//! index-option root, say); a concrete symbol carries the expiry, strike, and
//! right of one listed contract inside that family. The download job only
//! accepts canonical index-option roots and lets the vendor expand them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Security classification of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityType {
    Equity,
    Index,
    Option,
    IndexOption,
    Future,
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityType::Equity => "equity",
            SecurityType::Index => "index",
            SecurityType::Option => "option",
            SecurityType::IndexOption => "index_option",
            SecurityType::Future => "future",
        };
        f.write_str(name)
    }
}

/// Call or put side of an option contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionRight {
    Call,
    Put,
}

impl fmt::Display for OptionRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptionRight::Call => "call",
            OptionRight::Put => "put",
        })
    }
}

/// Expiry, strike, and right of a single listed contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub expiry: NaiveDate,
    pub strike: f64,
    pub right: OptionRight,
}

/// A market symbol: either a canonical contract-family root or one concrete
/// contract within that family.
///
/// `ticker` is the family root (e.g. `SPXW`); `underlying_ticker` is the
/// index or equity the contracts derive from (e.g. `SPX`). For standard
/// roots the two coincide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    ticker: String,
    underlying_ticker: String,
    security_type: SecurityType,
    contract: Option<OptionContract>,
}

impl Symbol {
    /// Canonical index-option root whose underlying index shares the ticker
    /// (SPX options on the SPX index).
    pub fn canonical_index_option(root: impl Into<String>) -> Self {
        let ticker = root.into();
        let underlying_ticker = ticker.clone();
        Self {
            ticker,
            underlying_ticker,
            security_type: SecurityType::IndexOption,
            contract: None,
        }
    }

    /// Canonical index-option root with a distinct underlying ticker
    /// (weekly roots such as SPXW on SPX).
    pub fn canonical_index_option_on(root: impl Into<String>, underlying: impl Into<String>) -> Self {
        Self {
            ticker: root.into(),
            underlying_ticker: underlying.into(),
            security_type: SecurityType::IndexOption,
            contract: None,
        }
    }

    /// One concrete index-option contract within a root's family.
    pub fn index_option_contract(
        root: impl Into<String>,
        underlying: impl Into<String>,
        expiry: NaiveDate,
        strike: f64,
        right: OptionRight,
    ) -> Self {
        Self {
            ticker: root.into(),
            underlying_ticker: underlying.into(),
            security_type: SecurityType::IndexOption,
            contract: Some(OptionContract { expiry, strike, right }),
        }
    }

    /// An index symbol (the underlying side of index options).
    pub fn index(ticker: impl Into<String>) -> Self {
        let ticker = ticker.into();
        let underlying_ticker = ticker.clone();
        Self {
            ticker,
            underlying_ticker,
            security_type: SecurityType::Index,
            contract: None,
        }
    }

    /// An equity symbol.
    pub fn equity(ticker: impl Into<String>) -> Self {
        let ticker = ticker.into();
        let underlying_ticker = ticker.clone();
        Self {
            ticker,
            underlying_ticker,
            security_type: SecurityType::Equity,
            contract: None,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn underlying_ticker(&self) -> &str {
        &self.underlying_ticker
    }

    pub fn security_type(&self) -> SecurityType {
        self.security_type
    }

    pub fn contract(&self) -> Option<&OptionContract> {
        self.contract.as_ref()
    }

    /// A canonical symbol names a contract family rather than one listing.
    /// Only derivative kinds have canonical roots.
    pub fn is_canonical(&self) -> bool {
        self.contract.is_none()
            && matches!(
                self.security_type,
                SecurityType::Option | SecurityType::IndexOption | SecurityType::Future
            )
    }

    /// Filesystem-safe stem used by the store and the raw-data capture:
    /// `spx` for a root, `spxw_20240621_call_45000000` for a contract.
    /// Strikes are scaled by 10^4 so the stem never carries a decimal point.
    pub fn file_stem(&self) -> String {
        match &self.contract {
            None => self.ticker.to_lowercase(),
            Some(c) => format!(
                "{}_{}_{}_{}",
                self.ticker.to_lowercase(),
                c.expiry.format("%Y%m%d"),
                c.right,
                (c.strike * 10_000.0).round() as i64,
            ),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.contract {
            None => write!(f, "{}", self.ticker),
            Some(c) => write!(f, "{} {} {} {:.2}", self.ticker, c.expiry, c.right, c.strike),
        }
    }
}
