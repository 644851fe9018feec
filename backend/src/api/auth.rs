use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::api::server::AppState;
use crate::auth::{Credentials, RegisterForm};
use crate::db::models::User;
use crate::error::AppError;

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = state.auth.register(&form).await?;
    let token = state.tokens.issue(&user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.auth.login(&credentials).await?;
    let token = state.tokens.issue(&user)?;
    Ok(Json(AuthResponse { token, user }))
}
