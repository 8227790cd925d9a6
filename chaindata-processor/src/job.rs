//! The download job — validation, parallel fetch-and-write, aggregation.
//!
//! One job covers one canonical index-option root over one date range. It
//! downloads both data kinds concurrently, each kind writing to its own
//! store partition, then joins before reporting: `Ok(true)` when anything
//! was written, `Ok(false)` when every kind came back empty, `Err` when a
//! vendor or store failure surfaced in either unit.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{error, trace, warn};

use chaindata_core::data::{
    HistoryRequest, RawDataRecorder, RecorderError, TimeSeriesWriter, VendorClient, VendorError,
    WriterError,
};
use chaindata_core::domain::{Resolution, SecurityType, Symbol, TickType};

/// The data kinds every job downloads, one parallel unit each.
const DATA_KINDS: [TickType; 2] = [TickType::Trade, TickType::OpenInterest];

#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid symbol {symbol}: only canonical index-option roots are supported")]
    InvalidSymbolKind { symbol: String },

    #[error("symbol {symbol} is not in the ticker whitelist")]
    SymbolNotWhitelisted { symbol: String },

    #[error("unsupported resolution {resolution}: only daily data is available")]
    UnsupportedResolution { resolution: Resolution },

    #[error(transparent)]
    Vendor(#[from] VendorError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),
}

/// Immutable description of one download job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub symbol: Symbol,
    pub resolution: Resolution,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub destination_folder: PathBuf,
    pub raw_data_folder: PathBuf,
    /// Underlying tickers the job may download. An empty whitelist rejects
    /// every symbol; callers must opt tickers in explicitly.
    pub ticker_whitelist: Vec<String>,
}

/// Orchestrates one download job over a vendor client.
pub struct DownloadJob<C: VendorClient> {
    request: JobRequest,
    downloader: RawDataRecorder<C>,
}

impl<C: VendorClient> DownloadJob<C> {
    /// Validate the request and acquire the recording downloader.
    ///
    /// Checks run in order and fail fast: the symbol must be a canonical
    /// index-option root, its underlying ticker must be whitelisted, and
    /// the resolution must be daily. Nothing is acquired on failure.
    pub fn new(client: C, request: JobRequest) -> Result<Self, JobError> {
        if request.symbol.security_type() != SecurityType::IndexOption
            || !request.symbol.is_canonical()
        {
            return Err(JobError::InvalidSymbolKind {
                symbol: request.symbol.to_string(),
            });
        }
        if !request
            .ticker_whitelist
            .iter()
            .any(|ticker| ticker == request.symbol.underlying_ticker())
        {
            return Err(JobError::SymbolNotWhitelisted {
                symbol: request.symbol.to_string(),
            });
        }
        if request.resolution != Resolution::Daily {
            return Err(JobError::UnsupportedResolution {
                resolution: request.resolution,
            });
        }

        let downloader = RawDataRecorder::new(client, &request.raw_data_folder)?;
        Ok(Self {
            request,
            downloader,
        })
    }

    pub fn request(&self) -> &JobRequest {
        &self.request
    }

    /// Run the job: fetch and persist both data kinds in parallel.
    ///
    /// The collect is a full barrier: both units settle before any outcome
    /// is read, and an error in one unit never hides the other's work in
    /// flight. The first error then propagates; otherwise the job reports
    /// `false` only when every kind came back empty.
    pub fn run(&self) -> Result<bool, JobError> {
        let started = Instant::now();
        trace!(
            symbol = %self.request.symbol,
            resolution = %self.request.resolution,
            "starting download job"
        );

        let outcomes: Vec<Result<bool, JobError>> = DATA_KINDS
            .par_iter()
            .map(|&tick_type| self.fetch_and_write(tick_type))
            .collect();

        let mut wrote_any = false;
        for outcome in outcomes {
            wrote_any |= outcome?;
        }

        trace!(
            symbol = %self.request.symbol,
            elapsed = ?started.elapsed(),
            "download job finished"
        );

        if !wrote_any {
            error!(
                symbol = %self.request.symbol,
                resolution = %self.request.resolution,
                "no data downloaded for any kind"
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// One unit of work: fetch one kind's history and persist it. Returns
    /// whether anything was written; "no data" is a normal false outcome.
    fn fetch_and_write(&self, tick_type: TickType) -> Result<bool, JobError> {
        let request = HistoryRequest {
            symbol: self.request.symbol.clone(),
            resolution: self.request.resolution,
            start: self.request.start,
            end: self.request.end,
            tick_type,
        };

        let points = match self.downloader.history(&request)? {
            Some(points) if !points.is_empty() => points,
            _ => {
                trace!(symbol = %self.request.symbol, kind = %tick_type, "no data found");
                return Ok(false);
            }
        };

        let writer = TimeSeriesWriter::new(
            self.request.resolution,
            self.request.symbol.clone(),
            &self.request.destination_folder,
            tick_type,
        );
        let summary = writer.write(&points)?;
        trace!(
            symbol = %self.request.symbol,
            kind = %tick_type,
            contracts = summary.contracts,
            rows = summary.rows,
            "wrote history"
        );
        Ok(true)
    }

    /// Expand the job's root into its listed contracts. Goes through the
    /// recording downloader, so the raw chain response is captured like any
    /// other vendor call.
    pub fn option_chain(&self) -> Result<Vec<Symbol>, JobError> {
        Ok(self
            .downloader
            .option_chain(&self.request.symbol, self.request.start, self.request.end)?)
    }

    /// Release the downloader: flush the capture manifest. Idempotent and
    /// safe to skip, since dropping the job closes it too.
    pub fn close(&self) {
        if let Err(e) = self.downloader.close() {
            warn!(error = %e, "failed to flush raw-data manifest");
        }
    }
}
