//! Vendor-client boundary and structured error types.
//!
//! `VendorClient` is the narrow capability surface the download job depends
//! on: history for one (symbol, resolution, range, kind) and option-chain
//! expansion for a canonical root. Concrete SDK clients implement it and
//! arrive already authenticated; transport and credential handling stay on
//! their side of the trait, which also keeps the job trivially mockable.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{DataPoint, Resolution, Symbol, TickType};

/// Structured errors surfaced by vendor clients.
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("rate limited by vendor (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("malformed vendor response: {0}")]
    MalformedResponse(String),

    #[error("vendor error: {0}")]
    Other(String),
}

/// Parameters of one history download.
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub resolution: Resolution,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tick_type: TickType,
}

/// Narrow capability surface of the market-data vendor.
///
/// `history` returns `Ok(None)` when the vendor has no data for the request.
/// That is a normal outcome, distinct from a transport failure, which is an
/// `Err`. Implementations must be safe for concurrent use: the job calls
/// `history` from parallel tasks over one shared client.
pub trait VendorClient: Send + Sync {
    /// Short vendor name used in logs and capture manifests.
    fn name(&self) -> &str;

    /// Download history for one (symbol, resolution, range, kind). A
    /// canonical symbol covers every contract derived from it.
    fn history(&self, request: &HistoryRequest) -> Result<Option<Vec<DataPoint>>, VendorError>;

    /// Expand a canonical root into the contracts listed over the range.
    fn option_chain(
        &self,
        symbol: &Symbol,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Symbol>, VendorError>;
}
