use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

/// Acknowledge a logout. The client discards its token; the server keeps no
/// session to end, so the token stays valid until it expires.
pub async fn logout(State(state): State<AppState>) -> Result<ApiSuccess<MessageData>, ApiError> {
    state.account_service.logout().await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData {
            message: "Logout successful".to_string(),
        },
    ))
}
