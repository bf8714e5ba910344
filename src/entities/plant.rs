//! Plant entity - A plant identified from an uploaded photo.
//!
//! Rows are created only after the AI gateway has confirmed the image shows a plant.
//! Each plant owns its care tasks, diagnostic scans and chat history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Health assessment reported by the classifier
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No visible problems
    #[sea_orm(string_value = "healthy")]
    Healthy,
    /// Disease or pests observed
    #[sea_orm(string_value = "diseased")]
    Diseased,
    /// Stressed but not diseased (light, water, nutrients)
    #[sea_orm(string_value = "needs_attention")]
    NeedsAttention,
    /// The model could not tell
    #[default]
    #[sea_orm(string_value = "unknown")]
    Unknown,
}

impl HealthStatus {
    /// Lowercase label used in prompts and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Diseased => "diseased",
            Self::NeedsAttention => "needs_attention",
            Self::Unknown => "unknown",
        }
    }
}

/// Plant database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plants")]
pub struct Model {
    /// Unique identifier for the plant
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the plant
    pub user_id: String,
    /// Public URL of the uploaded photo
    pub image_url: String,
    /// Species or common name, usually AI-generated
    pub name: String,
    /// Botanical description
    pub description: String,
    /// Care recommendations text
    pub recommendations: String,
    /// Health assessment at identification time
    pub health_status: HealthStatus,
    /// Classifier confidence, always within [0, 1]
    pub confidence_score: f64,
    /// Observed health issues, if any
    pub health_notes: Option<String>,
    /// When the plant was created
    pub created_at: DateTimeUtc,
    /// When the plant was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Plant and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One plant has many care tasks
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,
    /// One plant has many diagnostic scans
    #[sea_orm(has_many = "super::scan::Entity")]
    Scans,
    /// One plant has many chat messages
    #[sea_orm(has_many = "super::chat_message::Entity")]
    ChatMessages,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl Related<super::scan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scans.def()
    }
}

impl Related<super::chat_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChatMessages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
