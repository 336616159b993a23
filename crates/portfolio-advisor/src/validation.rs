//! Schema Validator
//!
//! Turns raw form JSON into a [`PortfolioRequest`]. Two inbound shapes are
//! accepted and each keeps its own rules:
//!
//! - **List** (canonical): `{"stocks": [{"ticker": "aapl", "shares": 10}, ...]}`
//!   with at least one entry, ticker length 1–5, shares coercible to a number ≥ 1.
//! - **Flat** (legacy): `{"stock1": "..", ..., "stock5": ".."}`, all five
//!   required, ticker length 1–5. This shape never carried share counts, so
//!   every holding gets one share.
//!
//! Only JSON objects are forms; the shape is picked by which keys are present.
//! Callers only ever see one generic message per shape; the per-field issues
//! are kept on the error for logging.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::model::{PortfolioRequest, StockRequestItem};

pub const MAX_TICKER_LEN: usize = 5;

pub const LIST_FORM_MESSAGE: &str = "Invalid input. Please provide valid stock tickers and share counts.";
pub const FLAT_FORM_MESSAGE: &str = "Invalid input. Please provide 5 valid stock tickers.";

/// One field-level problem
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path, e.g. `stocks.2.ticker`
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Rejected form input
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Generic user-facing message
    pub message: &'static str,

    /// Field-level detail, never shown to the user
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Issues joined into one line for logs
    pub fn detail(&self) -> String {
        self.issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A single raw list entry; both fields arrive untyped from the form
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawStockEntry {
    #[serde(default)]
    pub ticker: Value,
    #[serde(default)]
    pub shares: Value,
}

/// Legacy five-field form
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FlatForm {
    pub stock1: Option<String>,
    pub stock2: Option<String>,
    pub stock3: Option<String>,
    pub stock4: Option<String>,
    pub stock5: Option<String>,
}

impl FlatForm {
    fn fields(&self) -> [(&'static str, Option<&str>); 5] {
        [
            ("stock1", self.stock1.as_deref()),
            ("stock2", self.stock2.as_deref()),
            ("stock3", self.stock3.as_deref()),
            ("stock4", self.stock4.as_deref()),
            ("stock5", self.stock5.as_deref()),
        ]
    }
}

/// Either inbound form shape
#[derive(Clone, Debug)]
pub enum PortfolioForm {
    List { stocks: Vec<RawStockEntry> },
    Flat(FlatForm),
}

const FLAT_FIELDS: [&str; 5] = ["stock1", "stock2", "stock3", "stock4", "stock5"];

fn body_error(message: &'static str, path: &str, detail: impl Into<String>) -> ValidationError {
    ValidationError {
        message,
        issues: vec![ValidationIssue::new(path, detail)],
    }
}

impl PortfolioForm {
    /// Decode a raw JSON body into one of the known shapes
    ///
    /// Only JSON objects are forms. The shape is picked by key: a `stocks` key
    /// means the list form, any of `stock1`..`stock5` means the flat form, and
    /// an object with neither is an empty list.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut body) = value else {
            return Err(body_error(LIST_FORM_MESSAGE, "body", "expected a JSON object"));
        };

        if let Some(stocks) = body.remove("stocks") {
            let Value::Array(entries) = stocks else {
                return Err(body_error(LIST_FORM_MESSAGE, "stocks", "expected a list of stocks"));
            };
            let stocks = entries
                .into_iter()
                .map(|entry| match entry {
                    Value::Object(_) => serde_json::from_value(entry).unwrap_or_default(),
                    _ => RawStockEntry::default(),
                })
                .collect();
            return Ok(Self::List { stocks });
        }

        if FLAT_FIELDS.iter().any(|field| body.contains_key(*field)) {
            return serde_json::from_value(Value::Object(body))
                .map(Self::Flat)
                .map_err(|e| body_error(FLAT_FORM_MESSAGE, "body", e.to_string()));
        }

        Ok(Self::List { stocks: Vec::new() })
    }

    /// Validate and normalize into a request
    pub fn validate(&self) -> Result<PortfolioRequest, ValidationError> {
        match self {
            Self::List { stocks } => validate_list(stocks),
            Self::Flat(flat) => validate_flat(flat),
        }
    }
}

/// Validate raw JSON form data in one step
pub fn validate(value: Value) -> Result<PortfolioRequest, ValidationError> {
    PortfolioForm::from_value(value)?.validate()
}

fn validate_list(stocks: &[RawStockEntry]) -> Result<PortfolioRequest, ValidationError> {
    let mut issues = Vec::new();

    if stocks.is_empty() {
        issues.push(ValidationIssue::new("stocks", "Please add at least one stock."));
    }

    let mut items = Vec::with_capacity(stocks.len());
    for (i, entry) in stocks.iter().enumerate() {
        let ticker = match &entry.ticker {
            Value::String(s) => check_ticker(s).map_err(|m| ValidationIssue::new(format!("stocks.{i}.ticker"), m)),
            _ => Err(ValidationIssue::new(format!("stocks.{i}.ticker"), "Ticker is required.")),
        };
        let shares = coerce_shares(&entry.shares)
            .ok_or_else(|| ValidationIssue::new(format!("stocks.{i}.shares"), "Must be at least 1 share."));

        match (ticker, shares) {
            (Ok(ticker), Ok(shares)) => items.push(StockRequestItem { ticker, shares }),
            (ticker, shares) => {
                issues.extend(ticker.err());
                issues.extend(shares.err());
            }
        }
    }

    if issues.is_empty() {
        Ok(PortfolioRequest::from_validated(items))
    } else {
        Err(ValidationError {
            message: LIST_FORM_MESSAGE,
            issues,
        })
    }
}

fn validate_flat(form: &FlatForm) -> Result<PortfolioRequest, ValidationError> {
    let mut issues = Vec::new();
    let mut items = Vec::with_capacity(5);

    for (name, value) in form.fields() {
        match value.map(check_ticker) {
            Some(Ok(ticker)) => items.push(StockRequestItem {
                ticker,
                shares: Decimal::ONE,
            }),
            Some(Err(message)) => issues.push(ValidationIssue::new(name, message)),
            None => issues.push(ValidationIssue::new(name, "Ticker is required.")),
        }
    }

    if issues.is_empty() {
        Ok(PortfolioRequest::from_validated(items))
    } else {
        Err(ValidationError {
            message: FLAT_FORM_MESSAGE,
            issues,
        })
    }
}

/// Length check in characters, then uppercase; no character-set rule
fn check_ticker(raw: &str) -> Result<String, &'static str> {
    match raw.chars().count() {
        0 => Err("Ticker is required."),
        n if n > MAX_TICKER_LEN => Err("Ticker is too long."),
        _ => Ok(raw.to_uppercase()),
    }
}

/// Accept a JSON number or a numeric string; anything else, or < 1, is rejected
fn coerce_shares(raw: &Value) -> Option<Decimal> {
    let shares = match raw {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok()?,
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok()?
        }
        _ => return None,
    };

    (shares >= Decimal::ONE).then_some(shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_list_form_uppercases_tickers() {
        let request = validate(json!({
            "stocks": [
                {"ticker": "googl", "shares": 10},
                {"ticker": "aApl", "shares": "15"},
                {"ticker": "brk.b", "shares": 1.5}
            ]
        }))
        .unwrap();

        assert_eq!(request.tickers(), vec!["GOOGL", "AAPL", "BRK.B"]);
        assert_eq!(request.items()[1].shares, dec!(15));
        assert_eq!(request.items()[2].shares, dec!(1.5));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let request = validate(json!({
            "stocks": [{"ticker": "MSFT", "shares": 1}, {"ticker": "msft", "shares": 2}]
        }))
        .unwrap();
        assert_eq!(request.len(), 2);
    }

    #[test]
    fn test_empty_list_is_rejected() {
        let err = validate(json!({"stocks": []})).unwrap_err();
        assert_eq!(err.message, LIST_FORM_MESSAGE);
        assert_eq!(err.issues[0].message, "Please add at least one stock.");
    }

    #[test]
    fn test_empty_body_is_rejected_as_list() {
        let err = validate(json!({})).unwrap_err();
        assert_eq!(err.message, LIST_FORM_MESSAGE);
    }

    #[test]
    fn test_ticker_rules() {
        let err = validate(json!({
            "stocks": [
                {"ticker": "", "shares": 1},
                {"ticker": "TOOLONG", "shares": 1},
                {"shares": 1}
            ]
        }))
        .unwrap_err();

        let paths: Vec<_> = err.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["stocks.0.ticker", "stocks.1.ticker", "stocks.2.ticker"]);
        assert_eq!(err.issues[1].message, "Ticker is too long.");
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_share_rules() {
        for bad in [json!(0), json!(0.5), json!(-3), json!(""), json!("abc"), json!(null), json!(true)] {
            let err = validate(json!({"stocks": [{"ticker": "AAPL", "shares": bad}]})).unwrap_err();
            assert_eq!(err.issues[0].path, "stocks.0.shares", "shares = {bad}");
        }
        assert!(validate(json!({"stocks": [{"ticker": "AAPL", "shares": " 1 "}]})).is_ok());
    }

    #[test]
    fn test_flat_form_accepts_five() {
        let request = validate(json!({
            "stock1": "googl", "stock2": "aapl", "stock3": "msft", "stock4": "amzn", "stock5": "tsla"
        }))
        .unwrap();
        assert_eq!(request.tickers(), vec!["GOOGL", "AAPL", "MSFT", "AMZN", "TSLA"]);
        assert!(request.items().iter().all(|i| i.shares == Decimal::ONE));
    }

    #[test]
    fn test_flat_form_rejects_fewer_than_five() {
        let err = validate(json!({"stock1": "GOOGL", "stock2": "AAPL", "stock3": "MSFT"})).unwrap_err();
        assert_eq!(err.message, FLAT_FORM_MESSAGE);
        assert_eq!(err.issues.len(), 2);
        assert_eq!(err.detail(), "stock4: Ticker is required.; stock5: Ticker is required.");
    }

    #[test]
    fn test_flat_form_ticker_length() {
        let err = validate(json!({
            "stock1": "GOOGLE", "stock2": "AAPL", "stock3": "MSFT", "stock4": "AMZN", "stock5": "TSLA"
        }))
        .unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::new("stock1", "Ticker is too long.")]);
    }

    #[test]
    fn test_non_object_body() {
        let err = validate(json!("AAPL")).unwrap_err();
        assert_eq!(err.message, LIST_FORM_MESSAGE);
        assert_eq!(err.issues[0].path, "body");
    }

    #[test]
    fn test_bare_array_is_not_a_flat_form() {
        let err = validate(json!(["a", "b", "c", "d", "e"])).unwrap_err();
        assert_eq!(err.message, LIST_FORM_MESSAGE);
        assert_eq!(err.issues[0].path, "body");
    }

    #[test]
    fn test_flat_form_wrong_field_type_keeps_flat_message() {
        let err = validate(json!({
            "stock1": "AAPL", "stock2": 5, "stock3": "MSFT", "stock4": "AMZN", "stock5": "TSLA"
        }))
        .unwrap_err();
        assert_eq!(err.message, FLAT_FORM_MESSAGE);
    }

    #[test]
    fn test_malformed_list_entries_are_reported_in_place() {
        let err = validate(json!({"stocks": [{"ticker": "AAPL", "shares": 1}, 5, ["MSFT", 2]]})).unwrap_err();
        assert_eq!(err.message, LIST_FORM_MESSAGE);
        let paths: Vec<_> = err.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["stocks.1.ticker", "stocks.1.shares", "stocks.2.ticker", "stocks.2.shares"]
        );
        assert!(err.issues.iter().all(|i| i.message != "Please add at least one stock."));

        let err = validate(json!({"stocks": "AAPL"})).unwrap_err();
        assert_eq!(err.issues[0].path, "stocks");
    }
}
