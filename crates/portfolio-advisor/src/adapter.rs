//! Prompt Adapter
//!
//! Turns a validated [`PortfolioRequest`] into a prompt plus a declared output
//! schema, makes exactly one model call, and shape-checks the answer. No retry,
//! batching or caching happens here.

use std::fmt::Write as _;
use std::sync::Arc;

use sage_core::{FieldSchema, FieldType, GenerationOptions, LlmProvider, Message, OutputSchema, ResponseFormat};
use serde_json::Value;

use crate::PORTFOLIO_ADVISOR_PROMPT;
use crate::error::Result;
use crate::model::{PortfolioAnalysisResult, PortfolioRequest};
use crate::validation;

/// Declared shape of the model's answer
pub fn output_schema(include_competitors: bool) -> OutputSchema {
    let allocation_item = FieldType::Object(vec![
        FieldSchema::required("stock", FieldType::String, "The stock ticker symbol."),
        FieldSchema::required(
            "allocation",
            FieldType::Number,
            "The suggested allocation percentage for the stock, between 0 and 100.",
        ),
        FieldSchema::required("isRisky", FieldType::Boolean, "Whether the stock is considered risky."),
    ]);

    let mut fields = vec![
        FieldSchema::required(
            "analysis",
            FieldType::String,
            "An analysis of the potential risks and rewards of the portfolio.",
        ),
        FieldSchema::required(
            "portfolio",
            FieldType::array_of(allocation_item),
            "The optimized portfolio with stock allocations and risk assessments.",
        ),
    ];

    if include_competitors {
        let competitor = FieldType::Object(vec![
            FieldSchema::required("ticker", FieldType::String, "Competitor ticker symbol."),
            FieldSchema::required("name", FieldType::String, "Competitor company name."),
            FieldSchema::required("marketCap", FieldType::Number, "Market capitalization in billions of USD."),
            FieldSchema::required("peRatio", FieldType::Number, "Price-to-earnings ratio."),
            FieldSchema::required("dividendYield", FieldType::Number, "Dividend yield in percent."),
        ]);

        fields.push(FieldSchema::optional(
            "competitorAnalysis",
            FieldType::Object(vec![
                FieldSchema::required(
                    "summary",
                    FieldType::String,
                    "How the portfolio's holdings compare with their peers.",
                ),
                FieldSchema::required(
                    "competitors",
                    FieldType::Array {
                        items: Box::new(competitor),
                        min_items: Some(3),
                        max_items: Some(5),
                    },
                    "Between 3 and 5 peer companies.",
                ),
            ]),
            "Comparison of the portfolio's stocks against peer companies.",
        ));
    }

    OutputSchema::new("PortfolioAnalysis", fields)
}

/// Adapter between portfolio requests and a language model
pub struct PortfolioAdapter {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    schema: OutputSchema,
}

impl PortfolioAdapter {
    /// Create an adapter; JSON output is always requested
    pub fn new(provider: Arc<dyn LlmProvider>, options: GenerationOptions) -> Self {
        Self {
            provider,
            options: GenerationOptions {
                response_format: ResponseFormat::Json,
                ..options
            },
            schema: output_schema(true),
        }
    }

    /// Drop the optional competitor block from the declared schema
    #[must_use]
    pub fn without_competitors(mut self) -> Self {
        self.schema = output_schema(false);
        self
    }

    pub const fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Build the system + user messages for a request
    pub fn build_messages(&self, request: &PortfolioRequest) -> Vec<Message> {
        let mut prompt = String::from("Stocks:\n");
        for item in request.items() {
            let _ = writeln!(prompt, "- {}: {} shares", item.ticker, item.shares.normalize());
        }
        prompt.push_str(
            "\nAnalyze these holdings, suggest an allocation percentage for each stock, \
             and flag any stock that poses a higher risk to the portfolio.",
        );
        if self.schema.fields.iter().any(|f| f.name == "competitorAnalysis") {
            prompt.push_str(
                " Then compare the holdings against 3 to 5 peer companies using market cap \
                 (billions USD), P/E ratio and dividend yield (percent).",
            );
        }
        prompt.push_str("\n\n");
        prompt.push_str(&self.schema.prompt_section());

        vec![Message::system(PORTFOLIO_ADVISOR_PROMPT), Message::user(prompt)]
    }

    /// Run one analysis against the model
    pub async fn analyze(&self, request: &PortfolioRequest) -> Result<PortfolioAnalysisResult> {
        let messages = self.build_messages(request);

        tracing::debug!(
            provider = self.provider.name(),
            model = %self.options.model,
            prompt_tokens = sage_core::message::estimate_tokens(&messages),
            "Requesting portfolio analysis"
        );

        let completion = self.provider.complete(&messages, &self.options).await?;

        if completion.truncated() {
            tracing::warn!(model = %completion.model, "Model output was truncated");
        }

        let result: PortfolioAnalysisResult = self.schema.parse(&completion.content)?;

        tracing::info!(
            tickers = request.len(),
            model = %completion.model,
            usage = ?completion.usage,
            risky = result.risky_stocks().len(),
            competitors = result.competitor_analysis.as_ref().map_or(0, |c| c.competitors.len()),
            "Portfolio analysis complete"
        );

        Ok(result)
    }

    /// Validate raw form data, then analyze it
    ///
    /// Invalid input never reaches the model.
    pub async fn submit(&self, form: Value) -> Result<PortfolioAnalysisResult> {
        let request = validation::validate(form).inspect_err(|e| {
            tracing::warn!(issues = %e.detail(), "Rejected portfolio form");
        })?;
        self.analyze(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvisorError;
    use rust_decimal_macros::dec;
    use sage_core::{CoreError, ScriptedProvider};
    use serde_json::json;

    const GOOD_REPLY: &str = r#"```json
{
  "analysis": "Tech heavy.",
  "portfolio": [
    {"stock": "AAPL", "allocation": 60, "isRisky": false},
    {"stock": "TSLA", "allocation": 40, "isRisky": true}
  ],
  "competitorAnalysis": {
    "summary": "Peers trade cheaper.",
    "competitors": [
      {"ticker": "MSFT", "name": "Microsoft", "marketCap": 3100, "peRatio": 35.1, "dividendYield": 0.7},
      {"ticker": "GM", "name": "General Motors", "marketCap": 55, "peRatio": 5.2, "dividendYield": 1.0},
      {"ticker": "F", "name": "Ford", "marketCap": 45, "peRatio": 7.9, "dividendYield": 5.6}
    ]
  }
}
```"#;

    fn adapter(provider: &Arc<ScriptedProvider>) -> PortfolioAdapter {
        PortfolioAdapter::new(provider.clone(), GenerationOptions::default())
    }

    fn form() -> Value {
        json!({"stocks": [{"ticker": "aapl", "shares": 15}, {"ticker": "tsla", "shares": "12"}]})
    }

    #[tokio::test]
    async fn test_submit_success() {
        let provider = Arc::new(ScriptedProvider::new().reply(GOOD_REPLY));
        let result = adapter(&provider).submit(form()).await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(result.portfolio.len(), 2);
        assert_eq!(result.portfolio[0].allocation, dec!(60));
        assert_eq!(result.risky_stocks(), vec!["TSLA"]);
        assert_eq!(result.competitor_analysis.unwrap().competitors.len(), 3);
    }

    #[tokio::test]
    async fn test_prompt_lists_uppercased_holdings() {
        let provider = Arc::new(ScriptedProvider::new().reply(GOOD_REPLY));
        adapter(&provider).submit(form()).await.unwrap();

        let request = provider.last_request().unwrap();
        assert_eq!(request.len(), 2);
        assert!(request[1].content.contains("- AAPL: 15 shares"));
        assert!(request[1].content.contains("- TSLA: 12 shares"));
        assert!(request[1].content.contains("\"isRisky\""));
    }

    #[tokio::test]
    async fn test_invalid_form_makes_no_call() {
        let provider = Arc::new(ScriptedProvider::new().reply(GOOD_REPLY));
        let adapter = adapter(&provider);

        for bad in [
            json!({"stocks": []}),
            json!({"stocks": [{"ticker": "", "shares": 1}]}),
            json!({"stocks": [{"ticker": "AAPL", "shares": 0}]}),
            json!({"stock1": "AAPL"}),
        ] {
            let err = adapter.submit(bad).await.unwrap_err();
            assert!(err.is_client_error());
            assert!(!err.user_message().is_empty());
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_error_is_surfaced() {
        let provider = Arc::new(ScriptedProvider::new().fail("model overloaded"));
        let err = adapter(&provider).submit(form()).await.unwrap_err();

        assert!(matches!(err, AdvisorError::Reasoning(CoreError::Provider(_))));
        assert!(err.user_message().ends_with("Details: Provider error: model overloaded"));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_an_error() {
        let provider = Arc::new(
            ScriptedProvider::new().reply(r#"{"analysis": "x", "portfolio": [{"stock": "AAPL", "allocation": "lots", "isRisky": false}]}"#),
        );
        let err = adapter(&provider).submit(form()).await.unwrap_err();
        assert!(matches!(err, AdvisorError::Reasoning(CoreError::SchemaMismatch(_))));
    }

    #[tokio::test]
    async fn test_competitor_block_is_optional() {
        let provider = Arc::new(
            ScriptedProvider::new().reply(r#"{"analysis": "ok", "portfolio": [{"stock": "AAPL", "allocation": 100, "isRisky": false}]}"#),
        );
        let result = adapter(&provider).without_competitors().submit(form()).await.unwrap();
        assert!(result.competitor_analysis.is_none());
        assert!(!provider.last_request().unwrap()[1].content.contains("competitorAnalysis"));
    }

    #[test]
    fn test_schema_declares_competitor_cardinality() {
        let schema = output_schema(true).to_json_schema();
        let competitors = &schema["properties"]["competitorAnalysis"]["properties"]["competitors"];
        assert_eq!(competitors["minItems"], 3);
        assert_eq!(competitors["maxItems"], 5);
        let required = schema["required"].as_array().unwrap();
        assert!(!required.contains(&json!("competitorAnalysis")));
    }
}
