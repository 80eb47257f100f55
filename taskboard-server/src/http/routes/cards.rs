//! Card endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::double_option;
use crate::db::{Card, CardPatch, CardRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, ValidJson, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Description, RequestedOrder, Title};

#[derive(Deserialize)]
pub struct CreateCardRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    pub title: Option<String>,
    /// `null` clears the description, absence keeps it
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub order: Option<i64>,
    pub list_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCardRequest {
    pub new_list_id: Uuid,
    pub new_order: i64,
}

/// Card response. `order` is the 1-based position inside the list.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub order: i32,
    pub list_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Card> for CardResponse {
    fn from(c: Card) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            order: c.position,
            list_id: c.list_id,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

impl UpdateCardRequest {
    fn into_patch(self) -> Result<CardPatch, ApiError> {
        let description = match self.description {
            Some(Some(text)) => Some(Some(Description::new(&text)?)),
            Some(None) => Some(None),
            None => None,
        };
        Ok(CardPatch {
            title: self.title.as_deref().map(Title::new).transpose()?,
            description,
            list_id: self.list_id,
            order: self
                .order
                .map(|order| RequestedOrder::new("order", order))
                .transpose()?
                .map(RequestedOrder::position),
        })
    }
}

/// POST /api/lists/{id}/cards - append a card
async fn create_card(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidUuid(list_id): ValidUuid,
    ValidJson(req): ValidJson<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), ApiError> {
    let title = Title::new(&req.title)?;
    let description = Description::optional(req.description.as_deref())?;
    let card = CardRepo::new(&state.store)
        .create(list_id, user.id, title, description)
        .await?;
    Ok((StatusCode::CREATED, Json(CardResponse::from(card))))
}

/// PUT /api/cards/{id} - edit text, and/or reposition through the engine
async fn update_card(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidUuid(card_id): ValidUuid,
    ValidJson(req): ValidJson<UpdateCardRequest>,
) -> Result<Json<CardResponse>, ApiError> {
    let patch = req.into_patch()?;
    let card = CardRepo::new(&state.store)
        .update(card_id, user.id, patch)
        .await?;
    Ok(Json(CardResponse::from(card)))
}

/// PATCH /api/cards/{id}/move - move within or across lists
async fn move_card(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidUuid(card_id): ValidUuid,
    ValidJson(req): ValidJson<MoveCardRequest>,
) -> Result<Json<CardResponse>, ApiError> {
    let order = RequestedOrder::new("newOrder", req.new_order)?;
    let card = CardRepo::new(&state.store)
        .move_to(card_id, user.id, req.new_list_id, order.position())
        .await?;
    tracing::info!(
        %card_id,
        list_id = %card.list_id,
        order = card.position,
        "card moved"
    );
    Ok(Json(CardResponse::from(card)))
}

/// DELETE /api/cards/{id} - delete, re-pack siblings
async fn delete_card(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidUuid(card_id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    CardRepo::new(&state.store).delete(card_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Card routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/lists/{id}/cards", post(create_card))
        .route("/api/cards/{id}", put(update_card).delete(delete_card))
        .route("/api/cards/{id}/move", patch(move_card))
}
