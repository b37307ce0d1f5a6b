use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use http::HeaderName;

use super::handlers::ApiResponseBody;
use crate::account::models::Identity;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

/// Header carrying the session token.
pub const AUTH_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-auth-token");

/// Why the gate turned a request away.
///
/// Token verification failures of every kind collapse into `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Unauthenticated {
    #[error("No token, authorization denied")]
    Missing,

    #[error("Token is not valid")]
    Invalid,
}

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        // RFC 6750: a request without credentials carries no error code.
        let challenge = match self {
            Unauthenticated::Missing => r#"Bearer realm="api""#,
            Unauthenticated::Invalid => r#"Bearer realm="api", error="invalid_token""#,
        };
        let status = StatusCode::UNAUTHORIZED;

        (
            status,
            [(header::WWW_AUTHENTICATE, HeaderValue::from_static(challenge))],
            Json(ApiResponseBody::new_error(status, self.to_string())),
        )
            .into_response()
    }
}

/// Resolve the identity behind a presented token.
///
/// # Errors
/// * `Missing` - No token, or only whitespace
/// * `Invalid` - Token failed verification
pub fn authorize<S>(raw_token: Option<&str>, service: &S) -> Result<Identity, Unauthenticated>
where
    S: AccountServicePort + ?Sized,
{
    let token = raw_token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(Unauthenticated::Missing)?;

    service.verify_token(token).map_err(|e| {
        tracing::warn!(reason = %e, "Token rejected");
        Unauthenticated::Invalid
    })
}

/// Read the raw token from request headers.
///
/// A header that is present but not visible ASCII counts as an invalid token.
pub fn token_from_headers(headers: &HeaderMap) -> Result<Option<&str>, Unauthenticated> {
    headers
        .get(AUTH_TOKEN_HEADER)
        .map(|value| value.to_str().map_err(|_| Unauthenticated::Invalid))
        .transpose()
}

/// Middleware that validates the session token and adds the identity to request extensions
pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Unauthenticated> {
    let raw_token = token_from_headers(req.headers())?;
    let identity = authorize(raw_token, state.account_service.as_ref())?;

    tracing::debug!(account_id = %identity.account_id, "Request authenticated");
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
