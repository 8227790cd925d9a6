//! Time-series file store writer.
//!
//! Layout: `{destination}/{security-type}/{resolution}/{underlying}/{contract-stem}_{tick}.csv`
//!
//! One CSV per concrete contract, whole-file overwrite. Writes are atomic
//! (write to .tmp, rename into place). Each write refreshes a per-kind
//! `meta_{tick}.json` sidecar in the underlying's directory with contract
//! and row counts, the covered date range, and a blake3 hash of the rows.
//! The two download kinds run concurrently, so the sidecars are kind-scoped
//! to keep every file target distinct.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DataPoint, OpenInterestPoint, Resolution, Symbol, TickType, TradeBar};

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("no data points to write")]
    EmptyBatch,

    #[error("data point kind {found} does not match writer kind {expected}")]
    KindMismatch { expected: TickType, found: TickType },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer flush failed: {0}")]
    CsvBuffer(String),

    #[error("metadata serialization failed: {0}")]
    Meta(#[from] serde_json::Error),
}

/// Summary of one write call.
#[derive(Debug, Clone, Copy)]
pub struct WriteSummary {
    pub contracts: usize,
    pub rows: usize,
}

/// Metadata sidecar for one (underlying, kind) partition of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub underlying: String,
    pub resolution: String,
    pub tick_type: String,
    pub contracts: usize,
    pub rows: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub data_hash: String,
    pub written_at: chrono::NaiveDateTime,
}

/// Writer scoped to one (resolution, canonical symbol, destination, kind).
pub struct TimeSeriesWriter {
    resolution: Resolution,
    symbol: Symbol,
    destination: PathBuf,
    tick_type: TickType,
}

impl TimeSeriesWriter {
    pub fn new(
        resolution: Resolution,
        symbol: Symbol,
        destination: impl Into<PathBuf>,
        tick_type: TickType,
    ) -> Self {
        Self {
            resolution,
            symbol,
            destination: destination.into(),
            tick_type,
        }
    }

    /// Directory all of this writer's files land in:
    /// `{destination}/{security-type}/{resolution}/{underlying}/`.
    pub fn data_dir(&self) -> PathBuf {
        self.destination
            .join(self.symbol.security_type().to_string())
            .join(self.resolution.to_string())
            .join(self.symbol.underlying_ticker().to_lowercase())
    }

    /// Persist a batch: group by contract, sort each group by date, drop
    /// exact date duplicates (first wins), overwrite one CSV per contract,
    /// refresh the sidecar.
    pub fn write(&self, points: &[DataPoint]) -> Result<WriteSummary, WriterError> {
        if points.is_empty() {
            return Err(WriterError::EmptyBatch);
        }
        for point in points {
            if point.tick_type() != self.tick_type {
                return Err(WriterError::KindMismatch {
                    expected: self.tick_type,
                    found: point.tick_type(),
                });
            }
        }

        let dir = self.data_dir();
        fs::create_dir_all(&dir).map_err(|source| WriterError::Io {
            path: dir.clone(),
            source,
        })?;

        // BTreeMap keeps contract output order deterministic.
        let mut by_contract: BTreeMap<String, Vec<&DataPoint>> = BTreeMap::new();
        for point in points {
            by_contract
                .entry(point.symbol().file_stem())
                .or_default()
                .push(point);
        }

        let mut rows_total = 0;
        let mut hasher = blake3::Hasher::new();
        for (stem, group) in by_contract.iter_mut() {
            group.sort_by_key(|p| p.date());
            group.dedup_by_key(|p| p.date());

            let bytes = self.encode_rows(group)?;
            hasher.update(&bytes);
            let path = dir.join(format!("{stem}_{}.csv", self.tick_type));
            write_atomic(&path, &bytes)?;
            rows_total += group.len();
        }

        let start_date = points.iter().map(|p| p.date()).min().unwrap();
        let end_date = points.iter().map(|p| p.date()).max().unwrap();
        let meta = StoreMeta {
            underlying: self.symbol.underlying_ticker().to_string(),
            resolution: self.resolution.to_string(),
            tick_type: self.tick_type.to_string(),
            contracts: by_contract.len(),
            rows: rows_total,
            start_date,
            end_date,
            data_hash: hasher.finalize().to_hex().to_string(),
            written_at: chrono::Local::now().naive_local(),
        };
        let meta_path = dir.join(format!("meta_{}.json", self.tick_type));
        let meta_json = serde_json::to_string_pretty(&meta)?;
        fs::write(&meta_path, meta_json).map_err(|source| WriterError::Io {
            path: meta_path,
            source,
        })?;

        Ok(WriteSummary {
            contracts: by_contract.len(),
            rows: rows_total,
        })
    }

    fn encode_rows(&self, group: &[&DataPoint]) -> Result<Vec<u8>, WriterError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        match self.tick_type {
            TickType::Trade => {
                wtr.write_record(["date", "open", "high", "low", "close", "volume"])?;
                let bars = group.iter().filter_map(|p| match p {
                    DataPoint::Trade(bar) => Some(bar),
                    _ => None,
                });
                for bar in bars {
                    let TradeBar {
                        date,
                        open,
                        high,
                        low,
                        close,
                        volume,
                        ..
                    } = bar;
                    wtr.write_record([
                        date.to_string(),
                        format!("{open:.4}"),
                        format!("{high:.4}"),
                        format!("{low:.4}"),
                        format!("{close:.4}"),
                        volume.to_string(),
                    ])?;
                }
            }
            TickType::OpenInterest => {
                wtr.write_record(["date", "open_interest"])?;
                let values = group.iter().filter_map(|p| match p {
                    DataPoint::OpenInterest(oi) => Some(oi),
                    _ => None,
                });
                for OpenInterestPoint {
                    date,
                    open_interest,
                    ..
                } in values
                {
                    wtr.write_record([date.to_string(), open_interest.to_string()])?;
                }
            }
        }
        wtr.into_inner()
            .map_err(|e| WriterError::CsvBuffer(e.to_string()))
    }
}

/// Write to a temp file then rename into place; clean up on rename failure.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), WriterError> {
    let tmp = path.with_extension("csv.tmp");
    fs::write(&tmp, bytes).map_err(|source| WriterError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        WriterError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OptionRight;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_store_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("chaindata_store_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn contract(strike: f64, right: OptionRight) -> Symbol {
        Symbol::index_option_contract(
            "SPX",
            "SPX",
            NaiveDate::from_ymd_opt(2024, 6, 21).unwrap(),
            strike,
            right,
        )
    }

    fn trade(symbol: &Symbol, day: u32, close: f64) -> DataPoint {
        DataPoint::Trade(TradeBar {
            symbol: symbol.clone(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 100,
        })
    }

    fn open_interest(symbol: &Symbol, day: u32, value: u64) -> DataPoint {
        DataPoint::OpenInterest(OpenInterestPoint {
            symbol: symbol.clone(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open_interest: value,
        })
    }

    #[test]
    fn writes_one_csv_per_contract() {
        let dir = temp_store_dir();
        let call = contract(4500.0, OptionRight::Call);
        let put = contract(4500.0, OptionRight::Put);
        let writer = TimeSeriesWriter::new(
            Resolution::Daily,
            Symbol::canonical_index_option("SPX"),
            &dir,
            TickType::Trade,
        );

        let summary = writer
            .write(&[
                trade(&call, 3, 22.0),
                trade(&call, 2, 21.0),
                trade(&put, 2, 35.0),
            ])
            .unwrap();
        assert_eq!(summary.contracts, 2);
        assert_eq!(summary.rows, 3);

        let call_csv = dir.join("index_option/daily/spx/spx_20240621_call_45000000_trade.csv");
        let content = fs::read_to_string(&call_csv).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "date,open,high,low,close,volume");
        // Sorted by date even though the batch arrived out of order.
        assert!(lines[1].starts_with("2024-01-02,"));
        assert!(lines[2].starts_with("2024-01-03,"));

        assert!(dir
            .join("index_option/daily/spx/spx_20240621_put_45000000_trade.csv")
            .exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn duplicate_dates_keep_first() {
        let dir = temp_store_dir();
        let call = contract(4500.0, OptionRight::Call);
        let writer = TimeSeriesWriter::new(
            Resolution::Daily,
            Symbol::canonical_index_option("SPX"),
            &dir,
            TickType::Trade,
        );

        let summary = writer
            .write(&[trade(&call, 2, 21.0), trade(&call, 2, 99.0)])
            .unwrap();
        assert_eq!(summary.rows, 1);

        let content = fs::read_to_string(
            dir.join("index_option/daily/spx/spx_20240621_call_45000000_trade.csv"),
        )
        .unwrap();
        assert!(content.contains("21.0000"));
        assert!(!content.contains("99.0000"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn open_interest_rows_use_their_own_schema() {
        let dir = temp_store_dir();
        let call = contract(4500.0, OptionRight::Call);
        let writer = TimeSeriesWriter::new(
            Resolution::Daily,
            Symbol::canonical_index_option("SPX"),
            &dir,
            TickType::OpenInterest,
        );

        writer
            .write(&[open_interest(&call, 2, 1200), open_interest(&call, 3, 1300)])
            .unwrap();

        let content = fs::read_to_string(
            dir.join("index_option/daily/spx/spx_20240621_call_45000000_openinterest.csv"),
        )
        .unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "date,open_interest");
        assert_eq!(lines[1], "2024-01-02,1200");
        assert_eq!(lines[2], "2024-01-03,1300");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let writer = TimeSeriesWriter::new(
            Resolution::Daily,
            Symbol::canonical_index_option("SPX"),
            temp_store_dir(),
            TickType::Trade,
        );
        assert!(matches!(writer.write(&[]), Err(WriterError::EmptyBatch)));
    }

    #[test]
    fn mismatched_kind_is_rejected() {
        let dir = temp_store_dir();
        let call = contract(4500.0, OptionRight::Call);
        let writer = TimeSeriesWriter::new(
            Resolution::Daily,
            Symbol::canonical_index_option("SPX"),
            &dir,
            TickType::Trade,
        );

        let result = writer.write(&[open_interest(&call, 2, 1200)]);
        assert!(matches!(result, Err(WriterError::KindMismatch { .. })));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn sidecar_reflects_the_write() {
        let dir = temp_store_dir();
        let call = contract(4500.0, OptionRight::Call);
        let writer = TimeSeriesWriter::new(
            Resolution::Daily,
            Symbol::canonical_index_option("SPX"),
            &dir,
            TickType::Trade,
        );

        writer
            .write(&[trade(&call, 2, 21.0), trade(&call, 5, 23.0)])
            .unwrap();

        let meta: StoreMeta = serde_json::from_str(
            &fs::read_to_string(dir.join("index_option/daily/spx/meta_trade.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(meta.underlying, "SPX");
        assert_eq!(meta.contracts, 1);
        assert_eq!(meta.rows, 2);
        assert_eq!(meta.start_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(meta.end_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = temp_store_dir();
        let call = contract(4500.0, OptionRight::Call);
        let writer = TimeSeriesWriter::new(
            Resolution::Daily,
            Symbol::canonical_index_option("SPX"),
            &dir,
            TickType::Trade,
        );
        writer.write(&[trade(&call, 2, 21.0)]).unwrap();

        let leftovers: Vec<_> = walk(&dir)
            .into_iter()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    fn walk(dir: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                out.extend(walk(&path));
            } else {
                out.push(path);
            }
        }
        out
    }
}
