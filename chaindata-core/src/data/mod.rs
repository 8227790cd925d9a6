//! Vendor boundary, raw-response capture, and the time-series store.

pub mod provider;
pub mod recorder;
pub mod writer;

pub use provider::{HistoryRequest, VendorClient, VendorError};
pub use recorder::{RawDataRecorder, RecorderError};
pub use writer::{TimeSeriesWriter, WriteSummary, WriterError};
