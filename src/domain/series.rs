//! Probability-price series and the unified timeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::error::ProbtraderError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub volume: Option<f64>,
}

impl PricePoint {
    pub fn new(timestamp: NaiveDateTime, price: f64) -> Self {
        PricePoint {
            timestamp,
            price,
            volume: None,
        }
    }
}

/// Where a series came from. Results computed on synthetic data are stress
/// test output only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    #[default]
    Historical,
    Synthetic,
}

/// Catalogue entry for a market, before its prices are loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub id: String,
    pub label: String,
    pub end_time: NaiveDateTime,
}

/// One market's price history. Timestamps are strictly increasing and every
/// price lies in [0, 1]; both are checked on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSeries {
    pub id: String,
    pub label: String,
    pub end_time: NaiveDateTime,
    pub origin: DataOrigin,
    points: Vec<PricePoint>,
    timestamp_index: HashMap<NaiveDateTime, usize>,
}

impl MarketSeries {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        end_time: NaiveDateTime,
        points: Vec<PricePoint>,
    ) -> Result<Self, ProbtraderError> {
        let id = id.into();

        for (i, point) in points.iter().enumerate() {
            if !point.price.is_finite() || !(0.0..=1.0).contains(&point.price) {
                return Err(ProbtraderError::InvalidSeries {
                    market: id,
                    reason: format!("price {} at {} out of range", point.price, point.timestamp),
                });
            }
            if i > 0 && point.timestamp <= points[i - 1].timestamp {
                return Err(ProbtraderError::InvalidSeries {
                    market: id,
                    reason: format!("timestamp {} is not increasing", point.timestamp),
                });
            }
        }

        let timestamp_index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.timestamp, i))
            .collect();

        Ok(MarketSeries {
            id,
            label: label.into(),
            end_time,
            origin: DataOrigin::Historical,
            points,
            timestamp_index,
        })
    }

    pub fn with_origin(mut self, origin: DataOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.points.len().checked_sub(1)
    }

    pub fn index_of(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.timestamp_index.get(&timestamp).copied()
    }

    /// View of the samples up to and including `index`. `None` if `index` is
    /// past the end of the series.
    pub fn history(&self, index: usize) -> Option<PriceHistory<'_>> {
        if index >= self.points.len() {
            return None;
        }
        Some(PriceHistory {
            points: &self.points[..=index],
            total_len: self.points.len(),
        })
    }
}

/// Read-only prefix of a series. Evaluators only ever see this view, so they
/// cannot read samples after the current one.
#[derive(Debug, Clone, Copy)]
pub struct PriceHistory<'a> {
    points: &'a [PricePoint],
    total_len: usize,
}

impl<'a> PriceHistory<'a> {
    /// Index of the current sample within the full series.
    pub fn index(&self) -> usize {
        self.points.len() - 1
    }

    pub fn current(&self) -> &'a PricePoint {
        &self.points[self.points.len() - 1]
    }

    pub fn is_final(&self) -> bool {
        self.points.len() == self.total_len
    }

    /// The `n` samples before the current one (excluding it). Shorter if
    /// not enough history exists.
    pub fn preceding(&self, n: usize) -> &'a [PricePoint] {
        let end = self.points.len() - 1;
        &self.points[end.saturating_sub(n)..end]
    }

    /// Prices of the last `n` samples including the current one.
    pub fn trailing_prices(&self, n: usize) -> Vec<f64> {
        let start = self.points.len().saturating_sub(n);
        self.points[start..].iter().map(|p| p.price).collect()
    }

    /// Simple returns between consecutive samples over the last `n + 1`
    /// prices. Samples priced at zero yield a zero return.
    pub fn trailing_returns(&self, n: usize) -> Vec<f64> {
        self.trailing_prices(n + 1)
            .windows(2)
            .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
            .collect()
    }
}

/// Sorted union of every series' timestamps.
pub fn build_unified_timeline(series: &[MarketSeries]) -> Vec<NaiveDateTime> {
    let unique: BTreeSet<NaiveDateTime> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.timestamp))
        .collect();
    unique.into_iter().collect()
}
