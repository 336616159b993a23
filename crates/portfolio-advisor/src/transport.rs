//! Result Transport
//!
//! JSON encoding of a finished analysis for the legacy `?result=` query
//! parameter. Decoding never panics: an absent parameter and a malformed one
//! map to distinct [`TransportError`]s.

use crate::error::TransportError;
use crate::model::PortfolioAnalysisResult;

/// Serialize a result for transport
pub fn encode_result(result: &PortfolioAnalysisResult) -> String {
    // Plain structs of strings, decimals and bools always serialize.
    serde_json::to_string(result).unwrap_or_default()
}

/// Parse a transported result
pub fn decode_result(param: Option<&str>) -> Result<PortfolioAnalysisResult, TransportError> {
    let raw = param
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(TransportError::Missing)?;

    serde_json::from_str(raw).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse transported analysis result");
        TransportError::Malformed(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompetitorAnalysis, CompetitorStock, PortfolioAllocationItem};
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_trip_minimal() {
        let raw = r#"{"analysis":"ok","portfolio":[{"stock":"AAPL","allocation":20,"isRisky":false}]}"#;
        let parsed = decode_result(Some(raw)).unwrap();
        assert_eq!(parsed.portfolio[0].allocation, dec!(20));

        let again = decode_result(Some(&encode_result(&parsed))).unwrap();
        assert_eq!(again, parsed);
    }

    #[test]
    fn test_round_trip_with_competitors() {
        let result = PortfolioAnalysisResult {
            portfolio: vec![PortfolioAllocationItem {
                stock: "KO".into(),
                allocation: dec!(33.33),
                is_risky: false,
            }],
            analysis: "Defensive.".into(),
            competitor_analysis: Some(CompetitorAnalysis {
                summary: "PEP is close.".into(),
                competitors: vec![CompetitorStock {
                    ticker: "PEP".into(),
                    name: "PepsiCo".into(),
                    market_cap: dec!(210.4),
                    pe_ratio: dec!(24.8),
                    dividend_yield: dec!(3.1),
                }],
            }),
        };

        assert_eq!(decode_result(Some(&encode_result(&result))).unwrap(), result);
    }

    #[test]
    fn test_missing_parameter() {
        assert_eq!(decode_result(None).unwrap_err(), TransportError::Missing);
        assert_eq!(decode_result(Some("  ")).unwrap_err(), TransportError::Missing);
    }

    #[test]
    fn test_malformed_parameter() {
        for bad in ["{not json", "[]", r#"{"analysis": 5}"#, "null"] {
            let err = decode_result(Some(bad)).unwrap_err();
            assert!(matches!(err, TransportError::Malformed(_)), "input: {bad}");
            assert_eq!(err.to_string(), "Failed to parse analysis results.");
        }
    }
}
