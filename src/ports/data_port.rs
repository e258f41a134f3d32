//! Market data access port trait.

use crate::domain::error::ProbtraderError;
use crate::domain::series::{MarketInfo, MarketSeries};

pub trait DataPort {
    fn list_markets(&self) -> Result<Vec<MarketInfo>, ProbtraderError>;

    /// Load and validate the full price history of `market`.
    fn fetch_series(&self, market: &MarketInfo) -> Result<MarketSeries, ProbtraderError>;
}
