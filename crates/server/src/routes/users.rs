use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::post,
};
use db::models::user::{CreateUser, User};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{AppState, error::ApiError, password};

#[derive(Debug, Deserialize, TS)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The payload the client stores and replays as its bearer credential.
#[derive(Debug, Serialize, TS)]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub token: String,
}

fn auth_response(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let token = utils_jwt::generate_token(
        state.config().jwt_secret.as_bytes(),
        user.id,
        state.token_ttl(),
    )
    .map_err(|err| ApiError::Internal(format!("Failed to issue token: {err}")))?;

    Ok(AuthResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        token,
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, ResponseJson<AuthResponse>), ApiError> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(ApiError::BadRequest("Please add all fields".to_string()));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let user = User::create(
        &state.db().pool,
        &CreateUser {
            name: payload.name.trim().to_string(),
            email: payload.email,
            password_hash,
        },
        Uuid::new_v4(),
    )
    .await?;

    tracing::info!(user_id = %user.id, "Registered user");
    let response = auth_response(&state, user)?;
    Ok((StatusCode::CREATED, ResponseJson(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<AuthResponse>, ApiError> {
    let Some((user, stored_hash)) =
        User::find_by_email_with_hash(&state.db().pool, &payload.email).await?
    else {
        return Err(ApiError::InvalidCredentials);
    };

    if !password::verify_password(&payload.password, &stored_hash) {
        tracing::warn!(user_id = %user.id, "Rejected login with bad password");
        return Err(ApiError::InvalidCredentials);
    }

    Ok(ResponseJson(auth_response(&state, user)?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
