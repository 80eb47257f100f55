//! Registration and login

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, issue_token, verify_password};
use crate::db::{User, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::ValidJson;
use crate::http::server::AppState;
use crate::models::{Email, Password};

const BAD_CREDENTIALS: &str = "invalid email or password";

/// Register / login request
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
        }
    }
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: UserResponse,
    pub token: String,
}

/// POST /api/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = Email::new(&req.email)?;
    let password = Password::new(&req.password)?;

    let hash = hash_password(&password, state.auth.bcrypt_cost).await?;
    let user = UserRepo::new(&state.store).create(&email, &hash).await?;
    let token = issue_token(&state.auth, user.id)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "user registered",
            user: user.into(),
            token,
        }),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CredentialsRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = Email::new(&req.email)?;
    let password = Password::login(&req.password)?;

    let user = UserRepo::new(&state.store)
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::Unauthorized {
            reason: BAD_CREDENTIALS,
        })?;

    if !verify_password(&password, &user.password_hash).await? {
        tracing::debug!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::Unauthorized {
            reason: BAD_CREDENTIALS,
        });
    }

    let token = issue_token(&state.auth, user.id)?;
    Ok(Json(AuthResponse {
        message: "logged in",
        user: user.into(),
        token,
    }))
}

/// Auth routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}
