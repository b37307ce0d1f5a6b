use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::INVALID_TOKEN;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::middleware::token_from_headers;
use crate::inbound::http::router::AppState;

/// Exchange the header token for a fresh one.
///
/// Verifies the token itself rather than sitting behind the gate, so an
/// absent token reads `No token provided` and every other failure `Invalid token`.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiSuccess<RefreshResponseData>, ApiError> {
    let token = token_from_headers(&headers)
        .map_err(|_| ApiError::Unauthorized(INVALID_TOKEN.to_string()))?
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

    state
        .account_service
        .refresh(token)
        .await
        .map_err(ApiError::from)
        .map(|token| ApiSuccess::new(StatusCode::OK, RefreshResponseData { token }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshResponseData {
    pub token: String,
}
