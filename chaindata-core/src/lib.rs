//! ChainData Core — domain types, the vendor-client boundary, raw-response
//! capture, and the time-series file store.
//!
//! This crate contains everything the processing job composes:
//! - Symbols (canonical roots vs. concrete contracts), resolutions, tick types
//! - Daily data-point shapes (trade bars, open-interest observations)
//! - The `VendorClient` capability trait with its structured errors
//! - `RawDataRecorder`, a pass-through decorator that captures raw responses
//! - `TimeSeriesWriter`, the per-contract CSV store with atomic writes

pub mod data;
pub mod domain;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything that crosses into the download tasks
    /// is Send + Sync.
    ///
    /// The job fans one download per tick type out on a shared worker pool,
    /// and both tasks share one downloader. If any of these types loses the
    /// bound, the build breaks here instead of deep inside the fan-out.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Symbol>();
        require_sync::<domain::Symbol>();
        require_send::<domain::Resolution>();
        require_sync::<domain::Resolution>();
        require_send::<domain::TickType>();
        require_sync::<domain::TickType>();
        require_send::<domain::DataPoint>();
        require_sync::<domain::DataPoint>();

        require_send::<data::HistoryRequest>();
        require_sync::<data::HistoryRequest>();
        require_send::<data::VendorError>();
        require_sync::<data::VendorError>();
        require_send::<data::TimeSeriesWriter>();
        require_sync::<data::TimeSeriesWriter>();
    }
}
