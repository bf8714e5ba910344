//! Chat message entity - Append-only conversation log per (plant, user).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Author of a chat message
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// Written by the plant owner
    #[sea_orm(string_value = "user")]
    User,
    /// Generated by the assistant
    #[sea_orm(string_value = "assistant")]
    Assistant,
}

/// Chat message database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chat_messages")]
pub struct Model {
    /// Unique identifier for the message
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Plant the conversation is about
    pub plant_id: i64,
    /// Owner of the conversation
    pub user_id: String,
    /// Who wrote the message
    pub role: ChatRole,
    /// Message text
    pub content: String,
    /// Optional voice recording the text was transcribed from
    pub audio_url: Option<String>,
    /// When the message was created
    pub created_at: DateTimeUtc,
    /// When the message was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `ChatMessage` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each message belongs to one plant
    #[sea_orm(
        belongs_to = "super::plant::Entity",
        from = "Column::PlantId",
        to = "super::plant::Column::Id",
        on_delete = "Cascade"
    )]
    Plant,
}

impl Related<super::plant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
