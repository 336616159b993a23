//! Application State

use std::sync::Arc;

use portfolio_advisor::{PortfolioAdapter, ResultCache};
use sage_auth::SessionManager;
use sage_core::LlmProvider;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider (Ollama, OpenAI-compatible, ...)
    pub provider: Arc<dyn LlmProvider>,

    /// Prompt adapter over `provider`
    pub adapter: Arc<PortfolioAdapter>,

    /// Login gate
    pub sessions: Arc<SessionManager>,

    /// Finished analyses, fetched by id
    pub results: Arc<ResultCache>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        adapter: PortfolioAdapter,
        sessions: SessionManager,
        results: ResultCache,
    ) -> Self {
        Self {
            provider,
            adapter: Arc::new(adapter),
            sessions: Arc::new(sessions),
            results: Arc::new(results),
        }
    }
}
