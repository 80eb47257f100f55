//! Board endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cards::CardResponse;
use super::lists::ListResponse;
use crate::db::{Board, BoardRepo, BoardTree, ListWithCards};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, ValidJson, ValidUuid};
use crate::http::server::AppState;
use crate::models::Title;

/// Create / rename board request
#[derive(Deserialize)]
pub struct BoardRequest {
    pub title: String,
}

/// Board response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub id: Uuid,
    pub title: String,
    pub user_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Board> for BoardResponse {
    fn from(b: Board) -> Self {
        Self {
            id: b.id,
            title: b.title,
            user_id: b.user_id,
            created_at: b.created_at.to_rfc3339(),
            updated_at: b.updated_at.to_rfc3339(),
        }
    }
}

/// A list with its cards, as nested in a board
#[derive(Serialize)]
pub struct ListTreeResponse {
    #[serde(flatten)]
    pub list: ListResponse,
    pub cards: Vec<CardResponse>,
}

impl From<ListWithCards> for ListTreeResponse {
    fn from(entry: ListWithCards) -> Self {
        Self {
            list: entry.list.into(),
            cards: entry.cards.into_iter().map(CardResponse::from).collect(),
        }
    }
}

/// Board with lists and cards in position order
#[derive(Serialize)]
pub struct BoardTreeResponse {
    #[serde(flatten)]
    pub board: BoardResponse,
    pub lists: Vec<ListTreeResponse>,
}

impl From<BoardTree> for BoardTreeResponse {
    fn from(tree: BoardTree) -> Self {
        Self {
            board: tree.board.into(),
            lists: tree.lists.into_iter().map(ListTreeResponse::from).collect(),
        }
    }
}

/// GET /api/boards - the user's boards, oldest first
async fn list_boards(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<BoardResponse>>, ApiError> {
    let boards = BoardRepo::new(&state.store).list_for_user(user.id).await?;
    Ok(Json(boards.into_iter().map(BoardResponse::from).collect()))
}

/// POST /api/boards - create a board
async fn create_board(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(req): ValidJson<BoardRequest>,
) -> Result<(StatusCode, Json<BoardResponse>), ApiError> {
    let title = Title::new(&req.title)?;
    let board = BoardRepo::new(&state.store).create(user.id, title).await?;
    tracing::info!(board_id = %board.id, user_id = %user.id, "board created");
    Ok((StatusCode::CREATED, Json(BoardResponse::from(board))))
}

/// GET /api/boards/{id} - board with lists and cards
async fn get_board(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidUuid(board_id): ValidUuid,
) -> Result<Json<BoardTreeResponse>, ApiError> {
    let tree = BoardRepo::new(&state.store).get_tree(board_id, user.id).await?;
    Ok(Json(BoardTreeResponse::from(tree)))
}

/// PUT /api/boards/{id} - rename
async fn rename_board(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidUuid(board_id): ValidUuid,
    ValidJson(req): ValidJson<BoardRequest>,
) -> Result<Json<BoardResponse>, ApiError> {
    let title = Title::new(&req.title)?;
    let board = BoardRepo::new(&state.store)
        .rename(board_id, user.id, title)
        .await?;
    Ok(Json(BoardResponse::from(board)))
}

/// DELETE /api/boards/{id} - delete with lists and cards
async fn delete_board(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidUuid(board_id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    BoardRepo::new(&state.store).delete(board_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Board routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/boards", get(list_boards).post(create_board))
        .route(
            "/api/boards/{id}",
            get(get_board).put(rename_board).delete(delete_board),
        )
}
