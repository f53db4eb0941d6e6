//! CSV candle files.
//!
//! Columns: `timestamp,open,high,low,close,volume`. Timestamps may be RFC 3339,
//! a plain `YYYY-MM-DD` date (midnight UTC) or epoch milliseconds.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::domain::account::Pair;
use crate::domain::candle::Candle;
use crate::domain::error::TraderError;
use crate::ports::data_port::MarketDataSource;

enum Source {
    /// One `{BASE}-{QUOTE}.csv` per pair.
    Directory(PathBuf),
    /// A single file served for any pair.
    File(PathBuf),
}

pub struct CsvMarketData {
    source: Source,
}

#[derive(Deserialize)]
struct Row {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TraderError> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc());
        }
    }
    if let Ok(ms) = raw.parse::<i64>() {
        if let Some(t) = DateTime::from_timestamp_millis(ms) {
            return Ok(t);
        }
    }
    Err(TraderError::Data {
        reason: format!("invalid timestamp {raw:?}"),
    })
}

impl CsvMarketData {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            source: Source::Directory(base_path),
        }
    }

    pub fn from_file(path: PathBuf) -> Self {
        Self {
            source: Source::File(path),
        }
    }

    fn csv_path(&self, pair: &Pair) -> PathBuf {
        match &self.source {
            Source::Directory(base) => base.join(format!("{pair}.csv")),
            Source::File(path) => path.clone(),
        }
    }

    /// Every candle for `pair`, ascending.
    pub fn load(&self, pair: &Pair) -> Result<Vec<Candle>, TraderError> {
        let path = self.csv_path(pair);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TraderError::NoData {
                pair: pair.to_string(),
            },
            _ => TraderError::Data {
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })?;
        let mut candles = read_candles(&content, &path)?;
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }
}

fn read_candles(content: &str, path: &Path) -> Result<Vec<Candle>, TraderError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    rdr.deserialize::<Row>()
        .enumerate()
        .map(|(i, row)| {
            let row = row.map_err(|e| TraderError::Data {
                reason: format!("{} row {}: {}", path.display(), i + 1, e),
            })?;
            Ok(Candle {
                timestamp: parse_timestamp(&row.timestamp)?,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            })
        })
        .collect()
}

impl MarketDataSource for CsvMarketData {
    fn get_candles(&self, pair: &Pair, count: usize) -> Result<Vec<Candle>, TraderError> {
        let mut candles = self.load(pair)?;
        let skip = candles.len().saturating_sub(count);
        Ok(candles.split_off(skip))
    }
}
