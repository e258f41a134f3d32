//! CSV file data adapter.
//!
//! A data directory holds `markets.csv` (`id,label,end_time`) and one
//! `<id>.csv` per market (`timestamp,price[,volume]`). Rows must be in strictly
//! increasing time order; anything else is rejected, not reordered.

use crate::domain::error::ProbtraderError;
use crate::domain::series::{MarketInfo, MarketSeries, PricePoint};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

const MARKETS_FILE: &str = "markets.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, market_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", market_id))
    }

    fn read(&self, path: &Path) -> Result<String, ProbtraderError> {
        fs::read_to_string(path).map_err(|e| ProbtraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS` or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)
        })
}

fn column<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    file: &str,
) -> Result<&'r str, ProbtraderError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| ProbtraderError::DataSource {
            reason: format!("{file}: missing {name} column"),
        })
}

fn timestamp_column(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    file: &str,
) -> Result<NaiveDateTime, ProbtraderError> {
    let raw = column(record, index, name, file)?;
    parse_timestamp(raw).ok_or_else(|| ProbtraderError::DataSource {
        reason: format!("{file}: invalid {name} '{raw}'"),
    })
}

impl DataPort for CsvAdapter {
    fn list_markets(&self) -> Result<Vec<MarketInfo>, ProbtraderError> {
        let path = self.base_path.join(MARKETS_FILE);
        let content = self.read(&path)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut markets = Vec::new();

        for result in rdr.records() {
            let record = result?;
            let id = column(&record, 0, "id", MARKETS_FILE)?;
            if id.is_empty() {
                return Err(ProbtraderError::DataSource {
                    reason: format!("{MARKETS_FILE}: empty market id"),
                });
            }
            markets.push(MarketInfo {
                id: id.to_string(),
                label: column(&record, 1, "label", MARKETS_FILE)?.to_string(),
                end_time: timestamp_column(&record, 2, "end_time", MARKETS_FILE)?,
            });
        }

        Ok(markets)
    }

    fn fetch_series(&self, market: &MarketInfo) -> Result<MarketSeries, ProbtraderError> {
        let path = self.csv_path(&market.id);
        let content = self.read(&path)?;
        let file = format!("{}.csv", market.id);

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result?;
            let timestamp = timestamp_column(&record, 0, "timestamp", &file)?;

            let raw_price = column(&record, 1, "price", &file)?;
            let price: f64 = raw_price.parse().map_err(|e| ProbtraderError::DataSource {
                reason: format!("{file}: invalid price '{raw_price}': {e}"),
            })?;

            let volume = match record.get(2).map(str::trim).filter(|v| !v.is_empty()) {
                Some(raw) => Some(raw.parse::<f64>().map_err(|e| {
                    ProbtraderError::DataSource {
                        reason: format!("{file}: invalid volume '{raw}': {e}"),
                    }
                })?),
                None => None,
            };

            points.push(PricePoint {
                timestamp,
                price,
                volume,
            });
        }

        // rows must already be in strictly increasing time order
        MarketSeries::new(&market.id, &market.label, market.end_time, points)
    }
}
