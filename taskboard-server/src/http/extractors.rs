//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use uuid::Uuid;

use super::error::ApiError;
use super::server::AppState;
use crate::auth::verify_token;
use crate::db::UserRepo;
use crate::models::ValidationError;

/// Extract and validate a UUID from path
pub struct ValidUuid(pub Uuid);

impl<S> FromRequestParts<S> for ValidUuid
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        let uuid = Uuid::parse_str(&id).map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "invalid UUID format",
            })
        })?;

        Ok(Self(uuid))
    }
}

/// JSON body whose rejections come back as 400 validation errors.
///
/// A wrong type such as `"newOrder": 1.5` or `"2"` would otherwise surface
/// as axum's plain-text 422.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected request body");
                Err(ApiError::Validation(ValidationError::InvalidFormat {
                    field: "body",
                    reason: rejection_reason(&rejection),
                }))
            }
        }
    }
}

fn rejection_reason(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "a field is missing or has the wrong type",
        JsonRejection::JsonSyntaxError(_) => "not valid JSON",
        JsonRejection::MissingJsonContentType(_) => "expected content-type application/json",
        _ => "could not read request body",
    }
}

/// The authenticated user, from an `Authorization: Bearer <token>` header.
///
/// The token must verify and its user must still exist.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized {
            reason: "missing bearer token",
        })?;

        let user_id = verify_token(&state.auth, token).map_err(|err| {
            tracing::debug!(error = %err, "rejected token");
            ApiError::Unauthorized {
                reason: "invalid or expired token",
            }
        })?;

        let user = UserRepo::new(&state.store)
            .get(user_id)
            .await?
            .ok_or(ApiError::Unauthorized {
                reason: "token user no longer exists",
            })?;

        Ok(Self {
            id: user.id,
            email: user.email,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
