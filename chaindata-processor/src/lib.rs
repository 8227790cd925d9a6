//! ChainData Processor — the download-and-persist job over a vendor client.
//!
//! Validates a job request (canonical index-option root, whitelisted
//! underlying, daily resolution), then fans one download per data kind out
//! on the shared worker pool: trade and open-interest history for every
//! contract derived from the root, written to the local time-series store
//! with raw vendor responses captured on the side.

pub mod job;

pub use job::{DownloadJob, JobError, JobRequest};
