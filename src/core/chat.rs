//! Plant chat - Conversation log per (plant, user) and assistant replies.

use crate::{
    core::plant::get_plant,
    entities::{ChatMessage, ChatMessageColumn, ChatMessageModel, ChatRole, chat_message},
    errors::{Error, Result},
    gateway::{AiGateway, ChatTurn, prompts::plant_chat_instruction},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{info, warn};

/// The stored user message and the assistant's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatExchange {
    /// What the user sent
    pub user_message: ChatMessageModel,
    /// What the assistant answered
    pub assistant_message: ChatMessageModel,
}

async fn append(
    db: &DatabaseConnection,
    plant_id: i64,
    user_id: &str,
    role: ChatRole,
    content: String,
    audio_url: Option<String>,
) -> Result<ChatMessageModel> {
    let now = Utc::now();
    let message = chat_message::ActiveModel {
        plant_id: Set(plant_id),
        user_id: Set(user_id.to_string()),
        role: Set(role),
        content: Set(content),
        audio_url: Set(audio_url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(message.insert(db).await?)
}

async fn load_history(
    db: &DatabaseConnection,
    plant_id: i64,
    user_id: &str,
) -> Result<Vec<ChatMessageModel>> {
    ChatMessage::find()
        .filter(ChatMessageColumn::PlantId.eq(plant_id))
        .filter(ChatMessageColumn::UserId.eq(user_id))
        .order_by_asc(ChatMessageColumn::CreatedAt)
        .order_by_asc(ChatMessageColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sends a message about an owned plant and stores the reply.
///
/// The user message is stored before the model is called. If the call fails the
/// message stays in the log and the error is returned.
pub async fn send_message(
    db: &DatabaseConnection,
    gateway: &dyn AiGateway,
    plant_id: i64,
    user_id: &str,
    content: &str,
    audio_url: Option<String>,
) -> Result<ChatExchange> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::validation("Message cannot be empty"));
    }

    let plant = get_plant(db, plant_id, user_id).await?;
    let history: Vec<ChatTurn> = load_history(db, plant.id, user_id)
        .await?
        .into_iter()
        .map(|m| ChatTurn {
            role: m.role,
            content: m.content,
        })
        .collect();

    let user_message = append(
        db,
        plant.id,
        user_id,
        ChatRole::User,
        content.to_string(),
        audio_url,
    )
    .await?;

    let instruction = plant_chat_instruction(&plant);
    let reply = gateway
        .chat(Some(&instruction), &history, content)
        .await
        .inspect_err(|e| warn!(plant_id, user_id, error = %e, "Chat reply failed"))?;

    let assistant_message =
        append(db, plant.id, user_id, ChatRole::Assistant, reply, None).await?;

    info!(plant_id, user_id, turns = history.len() + 2, "Chat exchange stored");
    Ok(ChatExchange {
        user_message,
        assistant_message,
    })
}

/// Conversation about an owned plant, oldest first.
pub async fn chat_history(
    db: &DatabaseConnection,
    plant_id: i64,
    user_id: &str,
) -> Result<Vec<ChatMessageModel>> {
    let plant = get_plant(db, plant_id, user_id).await?;
    load_history(db, plant.id, user_id).await
}

/// Deletes the conversation about an owned plant. Returns how many messages were removed.
pub async fn clear_history(db: &DatabaseConnection, plant_id: i64, user_id: &str) -> Result<u64> {
    let plant = get_plant(db, plant_id, user_id).await?;
    let result = ChatMessage::delete_many()
        .filter(ChatMessageColumn::PlantId.eq(plant.id))
        .filter(ChatMessageColumn::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
