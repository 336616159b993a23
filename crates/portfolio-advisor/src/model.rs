//! Domain Models
//!
//! The portfolio request/response contract. Wire names are camelCase because
//! the same JSON is read by browser clients and produced by the model.
//! Numbers are exact decimals in memory and plain JSON numbers on the wire.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One holding submitted by the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRequestItem {
    /// Ticker symbol, already uppercased
    pub ticker: String,

    /// Share count (at least 1)
    #[serde(with = "rust_decimal::serde::float")]
    pub shares: Decimal,
}

/// A validated, non-empty list of holdings
///
/// Tickers are not de-duplicated; order is preserved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PortfolioRequest(Vec<StockRequestItem>);

impl PortfolioRequest {
    /// Only the validator builds requests; it guarantees `items` is non-empty
    pub(crate) const fn from_validated(items: Vec<StockRequestItem>) -> Self {
        Self(items)
    }

    pub fn items(&self) -> &[StockRequestItem] {
        &self.0
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.0.iter().map(|item| item.ticker.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Suggested weight for one ticker, as produced by the model
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAllocationItem {
    /// Ticker symbol
    pub stock: String,

    /// Suggested allocation percentage (intended 0–100, not enforced)
    #[serde(with = "rust_decimal::serde::float")]
    pub allocation: Decimal,

    /// Whether the model judged this holding higher-risk
    pub is_risky: bool,
}

/// A peer company used for comparison
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorStock {
    pub ticker: String,

    /// Company name
    pub name: String,

    /// Market capitalization in billions of USD
    #[serde(with = "rust_decimal::serde::float")]
    pub market_cap: Decimal,

    /// Price-to-earnings ratio
    #[serde(with = "rust_decimal::serde::float")]
    pub pe_ratio: Decimal,

    /// Dividend yield in percent
    #[serde(with = "rust_decimal::serde::float")]
    pub dividend_yield: Decimal,
}

/// Optional competitor block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    pub summary: String,
    pub competitors: Vec<CompetitorStock>,
}

/// Full answer returned to the client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAnalysisResult {
    pub portfolio: Vec<PortfolioAllocationItem>,

    /// Free-text analysis
    pub analysis: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_analysis: Option<CompetitorAnalysis>,
}

impl PortfolioAnalysisResult {
    /// Sum of all suggested allocations
    ///
    /// Informational only; nothing requires this to be 100.
    pub fn total_allocation(&self) -> Decimal {
        self.portfolio.iter().map(|item| item.allocation).sum()
    }

    /// Tickers the model flagged as risky
    pub fn risky_stocks(&self) -> Vec<&str> {
        self.portfolio
            .iter()
            .filter(|item| item.is_risky)
            .map(|item| item.stock.as_str())
            .collect()
    }
}
