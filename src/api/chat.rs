//! Per-plant chat endpoints.

use super::{
    AppState, CurrentUser,
    extract::{JsonBody, PathParam},
};
use crate::{
    core::chat::{self, ChatExchange},
    entities::ChatMessageModel,
    errors::Result,
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

/// Body of `POST /plants/:id/chat`.
#[derive(Debug, Deserialize)]
pub struct SendMessage {
    /// Message text
    pub content: String,
    /// Recording the text was transcribed from, if any
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// Body of `DELETE /plants/:id/chat`.
#[derive(Debug, Serialize)]
pub struct Cleared {
    /// Messages removed
    pub deleted: u64,
}

/// `GET /plants/:id/chat`
pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(plant_id): PathParam<i64>,
) -> Result<Json<Vec<ChatMessageModel>>> {
    Ok(Json(chat::chat_history(&state.db, plant_id, &user_id).await?))
}

/// `POST /plants/:id/chat`
pub async fn send(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(plant_id): PathParam<i64>,
    JsonBody(message): JsonBody<SendMessage>,
) -> Result<(StatusCode, Json<ChatExchange>)> {
    let exchange = chat::send_message(
        &state.db,
        state.gateway.as_ref(),
        plant_id,
        &user_id,
        &message.content,
        message.audio_url,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(exchange)))
}

/// `DELETE /plants/:id/chat`
pub async fn clear(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(plant_id): PathParam<i64>,
) -> Result<Json<Cleared>> {
    let deleted = chat::clear_history(&state.db, plant_id, &user_id).await?;
    Ok(Json(Cleared { deleted }))
}
