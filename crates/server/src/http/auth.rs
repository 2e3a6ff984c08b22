use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::models::user::User;

use crate::{AppState, error::ApiError};

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn extract_request_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
}

fn reject(req: &Request, reason: &'static str) -> Response {
    tracing::warn!(
        path = %req.uri().path(),
        method = %req.method(),
        reason,
        "Unauthorized API request"
    );
    ApiError::Unauthorized.into_response()
}

/// Verifies the bearer token, resolves it to a user, and stores the user as
/// a request extension for the downstream handlers. Rejects with 401 before
/// any task logic runs.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = extract_request_token(&req) else {
        return reject(&req, "missing_token");
    };

    let claims = match utils_jwt::verify_token(state.config().jwt_secret.as_bytes(), token) {
        Ok(claims) => claims,
        Err(_) => return reject(&req, "invalid_token"),
    };

    match User::find_by_id(&state.db().pool, claims.sub).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(None) => reject(&req, "unknown_user"),
        Err(err) => ApiError::Database(err).into_response(),
    }
}
