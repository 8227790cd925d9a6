//! Raw-response capture — a pass-through decorator over `VendorClient`.
//!
//! Wraps any client, forwards every call unchanged, and stores each
//! non-empty response as JSON in a side folder as it is fetched. A manifest
//! (file name, request shape, row count, blake3 payload hash per capture) is
//! written once on `close()`; `Drop` also closes, so the folder is left
//! consistent on every exit path.
//!
//! Capture failures never fail the fetch: the forwarded result is returned
//! as-is and the miss is logged.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::provider::{HistoryRequest, VendorClient, VendorError};
use crate::domain::{DataPoint, Symbol};

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("failed to create raw data folder {}: {source}", path.display())]
    CreateFolder {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write capture manifest: {0}")]
    Manifest(String),
}

/// One capture noted in the manifest.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureEntry {
    pub file: String,
    pub capture_kind: String,
    pub symbol: String,
    pub rows: usize,
    pub payload_hash: String,
}

#[derive(Serialize)]
struct Manifest<'a> {
    vendor: String,
    written_at: chrono::NaiveDateTime,
    captures: &'a [CaptureEntry],
}

/// Decorator that records raw vendor responses while forwarding calls.
pub struct RawDataRecorder<C: VendorClient> {
    inner: C,
    folder: PathBuf,
    captures: Mutex<Vec<CaptureEntry>>,
    seq: AtomicU64,
    closed: AtomicBool,
}

impl<C: VendorClient> RawDataRecorder<C> {
    /// Wrap a client and create the raw-data folder.
    pub fn new(inner: C, folder: impl Into<PathBuf>) -> Result<Self, RecorderError> {
        let folder = folder.into();
        fs::create_dir_all(&folder).map_err(|source| RecorderError::CreateFolder {
            path: folder.clone(),
            source,
        })?;
        Ok(Self {
            inner,
            folder,
            captures: Mutex::new(Vec::new()),
            seq: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Root of the raw-data folder.
    pub fn folder(&self) -> &std::path::Path {
        &self.folder
    }

    /// Write the capture manifest and stop recording. Idempotent: only the
    /// first call writes; later calls (including the one from `Drop`) are
    /// no-ops.
    pub fn close(&self) -> Result<(), RecorderError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let captures = self.captures.lock().unwrap_or_else(|e| e.into_inner());
        let manifest = Manifest {
            vendor: self.inner.name().to_string(),
            written_at: Local::now().naive_local(),
            captures: &captures,
        };
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| RecorderError::Manifest(e.to_string()))?;
        fs::write(self.folder.join("manifest.json"), json)
            .map_err(|e| RecorderError::Manifest(e.to_string()))?;
        Ok(())
    }

    fn record(&self, file: String, capture_kind: &str, symbol: &Symbol, rows: usize, payload: &[u8]) {
        let path = self.folder.join(&file);
        if let Err(e) = fs::write(&path, payload) {
            warn!(path = %path.display(), error = %e, "failed to capture raw vendor response");
            return;
        }
        debug!(file = %file, rows, "captured raw vendor response");
        let entry = CaptureEntry {
            file,
            capture_kind: capture_kind.to_string(),
            symbol: symbol.to_string(),
            rows,
            payload_hash: blake3::hash(payload).to_hex().to_string(),
        };
        self.captures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }
}

impl<C: VendorClient> VendorClient for RawDataRecorder<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn history(&self, request: &HistoryRequest) -> Result<Option<Vec<DataPoint>>, VendorError> {
        let result = self.inner.history(request)?;
        if let Some(points) = result.as_deref() {
            if !points.is_empty() {
                match serde_json::to_vec_pretty(points) {
                    Ok(payload) => {
                        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
                        let file = format!(
                            "{}_{}_{}_{}_{seq}.json",
                            request.tick_type,
                            request.symbol.file_stem(),
                            request.start.format("%Y%m%d"),
                            request.end.format("%Y%m%d"),
                        );
                        self.record(file, "history", &request.symbol, points.len(), &payload);
                    }
                    Err(e) => warn!(error = %e, "failed to serialize raw vendor response"),
                }
            }
        }
        Ok(result)
    }

    fn option_chain(
        &self,
        symbol: &Symbol,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Symbol>, VendorError> {
        let contracts = self.inner.option_chain(symbol, start, end)?;
        if !contracts.is_empty() {
            match serde_json::to_vec_pretty(&contracts) {
                Ok(payload) => {
                    let seq = self.seq.fetch_add(1, Ordering::SeqCst);
                    let file = format!(
                        "chain_{}_{}_{}_{seq}.json",
                        symbol.file_stem(),
                        start.format("%Y%m%d"),
                        end.format("%Y%m%d"),
                    );
                    self.record(file, "chain", symbol, contracts.len(), &payload);
                }
                Err(e) => warn!(error = %e, "failed to serialize raw option chain"),
            }
        }
        Ok(contracts)
    }
}

impl<C: VendorClient> Drop for RawDataRecorder<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to write raw-data capture manifest");
        }
    }
}
