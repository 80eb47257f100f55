//! List endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{List, ListPatch, ListRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, ValidJson, ValidUuid};
use crate::http::server::AppState;
use crate::models::{RequestedOrder, Title};

#[derive(Deserialize)]
pub struct CreateListRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct UpdateListRequest {
    pub title: Option<String>,
    pub order: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveListRequest {
    pub new_board_id: Uuid,
    pub new_order: i64,
}

/// List response. `order` is the 1-based position inside the board.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub id: Uuid,
    pub title: String,
    pub order: i32,
    pub board_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

impl From<List> for ListResponse {
    fn from(l: List) -> Self {
        Self {
            id: l.id,
            title: l.title,
            order: l.position,
            board_id: l.board_id,
            created_at: l.created_at.to_rfc3339(),
            updated_at: l.updated_at.to_rfc3339(),
        }
    }
}

/// POST /api/boards/{id}/lists - append a list
async fn create_list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidUuid(board_id): ValidUuid,
    ValidJson(req): ValidJson<CreateListRequest>,
) -> Result<(StatusCode, Json<ListResponse>), ApiError> {
    let title = Title::new(&req.title)?;
    let list = ListRepo::new(&state.store)
        .create(board_id, user.id, title)
        .await?;
    Ok((StatusCode::CREATED, Json(ListResponse::from(list))))
}

/// PUT /api/lists/{id} - rename and/or reorder within the board
async fn update_list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidUuid(list_id): ValidUuid,
    ValidJson(req): ValidJson<UpdateListRequest>,
) -> Result<Json<ListResponse>, ApiError> {
    let patch = ListPatch {
        title: req.title.as_deref().map(Title::new).transpose()?,
        order: req
            .order
            .map(|order| RequestedOrder::new("order", order))
            .transpose()?
            .map(RequestedOrder::position),
    };
    let list = ListRepo::new(&state.store)
        .update(list_id, user.id, patch)
        .await?;
    Ok(Json(ListResponse::from(list)))
}

/// PATCH /api/lists/{id}/move - move within or across boards
async fn move_list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidUuid(list_id): ValidUuid,
    ValidJson(req): ValidJson<MoveListRequest>,
) -> Result<Json<ListResponse>, ApiError> {
    let order = RequestedOrder::new("newOrder", req.new_order)?;
    let list = ListRepo::new(&state.store)
        .move_to(list_id, user.id, req.new_board_id, order.position())
        .await?;
    Ok(Json(ListResponse::from(list)))
}

/// DELETE /api/lists/{id} - delete with cards, re-pack siblings
async fn delete_list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidUuid(list_id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    ListRepo::new(&state.store).delete(list_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/boards/{id}/lists", post(create_list))
        .route("/api/lists/{id}", put(update_list).delete(delete_list))
        .route("/api/lists/{id}/move", patch(move_list))
}
