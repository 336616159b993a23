//! HTTP Handlers

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use portfolio_advisor::{
    transport, AdvisorError, PortfolioAnalysisResult, ResultId, TransportError,
};
use sage_auth::{AuthError, IssuedToken, Session};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub id: ResultId,
    pub result: PortfolioAnalysisResult,
}

#[derive(Debug, Deserialize)]
pub struct DecodeQuery {
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn auth_error(err: &AuthError) -> ApiError {
    match err {
        AuthError::InvalidCredentials => {
            api_error(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", err.user_message())
        }
        e if e.is_unauthorized() => {
            tracing::debug!(error = %e, "Rejected session token");
            api_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.user_message())
        }
        e => {
            tracing::error!(error = %e, "Session gate failure");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", e.user_message())
        }
    }
}

fn advisor_error(err: &AdvisorError) -> ApiError {
    match err {
        AdvisorError::Validation(e) => {
            tracing::warn!(issues = %e.detail(), "Invalid portfolio form");
            api_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.user_message())
        }
        AdvisorError::Reasoning(e) => {
            tracing::error!(error = %e, transient = e.is_transient(), "Portfolio analysis failed");
            api_error(StatusCode::BAD_GATEWAY, "AI_ERROR", err.user_message())
        }
    }
}

fn transport_error(err: &TransportError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "PARSE_ERROR", err.to_string())
}

/// Resolve the `Authorization: Bearer <token>` header to a live session
fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| auth_error(&AuthError::MissingToken))?;
    state.sessions.authorize(token).map_err(|e| auth_error(&e))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider.name().to_string(),
        provider_connected,
    })
}

/// Exchange a username/password pair for a session token
///
/// Taken raw like `submit_analysis` so a malformed body still gets the JSON
/// error shape.
pub async fn login(State(state): State<AppState>, body: String) -> Result<Json<IssuedToken>, ApiError> {
    let payload: LoginRequest = serde_json::from_str(&body).map_err(|e| {
        tracing::debug!(error = %e, "Malformed login body");
        api_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Please provide a username and password.",
        )
    })?;

    let issued = state
        .sessions
        .login(&payload.username, &payload.password)
        .await
        .map_err(|e| auth_error(&e))?;

    Ok(Json(issued))
}

/// End the session and drop the results it owns
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or_else(|| auth_error(&AuthError::MissingToken))?;
    let session = state.sessions.logout(token).map_err(|e| auth_error(&e))?;

    let dropped = state.results.remove_owned_by(session.id.as_str());
    tracing::debug!(session_id = %session.id, dropped, "Dropped cached results on logout");

    Ok(StatusCode::NO_CONTENT)
}

/// Validate a portfolio form, run one analysis and cache the answer
///
/// The body is taken raw so that anything unparsable still gets the generic
/// validation message.
pub async fn submit_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let session = require_session(&state, &headers)?;

    let form = serde_json::from_str::<Value>(&body).unwrap_or(Value::Null);
    let result = state.adapter.submit(form).await.map_err(|e| advisor_error(&e))?;

    let id = state.results.insert(result.clone(), Some(session.id.as_str()));
    tracing::info!(result_id = %id, username = %session.username, "Stored analysis result");

    Ok(Json(AnalysisResponse { id, result }))
}

/// Fetch a cached result owned by the caller's session
pub async fn get_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<PortfolioAnalysisResult>, ApiError> {
    let session = require_session(&state, &headers)?;

    state
        .results
        .get(&ResultId::from_string(id), Some(session.id.as_str()))
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "NOT_FOUND", TransportError::Missing.to_string()))
}

/// Decode a result carried in the `result` query parameter
pub async fn decode_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DecodeQuery>,
) -> Result<Json<PortfolioAnalysisResult>, ApiError> {
    require_session(&state, &headers)?;

    transport::decode_result(query.result.as_deref())
        .map(Json)
        .map_err(|e| transport_error(&e))
}
