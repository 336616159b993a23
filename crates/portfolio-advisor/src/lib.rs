//! # portfolio-advisor
//!
//! The portfolio request/response contract and the pipeline around it.
//!
//! ```text
//! form JSON ──▶ validation ──▶ PortfolioRequest ──▶ adapter ──▶ LlmProvider
//!                   │                                  │
//!                   ▼                                  ▼
//!            ValidationError               shape check (OutputSchema)
//!                                                      │
//!                                                      ▼
//!                                      PortfolioAnalysisResult ──▶ cache / transport
//! ```
//!
//! All analytical work (allocation, risk flags, competitor comparison) is
//! delegated to the model. This crate only decides what is a well-formed
//! question and what is a well-formed answer.

pub mod adapter;
pub mod cache;
pub mod error;
pub mod model;
pub mod transport;
pub mod validation;

pub use adapter::PortfolioAdapter;
pub use cache::{CacheConfig, ResultCache, ResultId};
pub use error::{AdvisorError, Result, TransportError};
pub use model::{
    CompetitorAnalysis, CompetitorStock, PortfolioAllocationItem, PortfolioAnalysisResult, PortfolioRequest,
    StockRequestItem,
};
pub use validation::{PortfolioForm, ValidationError, ValidationIssue};

/// System prompt for the portfolio analysis model
pub const PORTFOLIO_ADVISOR_PROMPT: &str = r"You are an expert financial advisor specializing in portfolio optimization and risk assessment.

Based on the list of stocks provided (with the number of shares held), analyze their potential risks and rewards within a portfolio context. Consider market trends, correlations, and other relevant factors to determine an optimal allocation for each stock.

- Adjust the weighting of securities as appropriate based on market trends and correlation.
- Identify any stocks that may pose a higher risk to the portfolio and flag them.
- Express every allocation as a percentage between 0 and 100.
- When asked for a competitor comparison, pick 3 to 5 well-known peer companies and report market cap in billions of USD, P/E ratio, and dividend yield in percent.

This is informational analysis, not financial advice. Answer with JSON only.";
