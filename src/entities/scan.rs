//! Scan entity - A follow-up diagnostic photo of an existing plant.
//!
//! A scan row is inserted as `pending` as soon as its image is stored, then resolved
//! exactly once to `completed` or `failed` when the diagnosis call returns.

use super::task::TaskPriority;
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Resolution state of a scan
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Image stored, diagnosis not finished
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Diagnosis stored
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Diagnosis call failed
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// One recommended action from a diagnosis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecommendation {
    /// Free-form category (light, water, nutrients, pests, monitor, ...)
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// What to do
    pub action: String,
    /// How urgent it is
    #[serde(default)]
    pub priority: TaskPriority,
    /// When to do it (e.g. "today", "this_week", "ongoing")
    #[serde(default)]
    pub timing: String,
}

/// Ordered recommendation list stored as a JSON column
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ScanRecommendations(pub Vec<ScanRecommendation>);

/// Scan database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plant_scans")]
pub struct Model {
    /// Unique identifier for the scan
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Plant that was scanned
    pub plant_id: i64,
    /// Owner of the scan
    pub user_id: String,
    /// Public URL of the scan photo
    pub scan_image_url: Option<String>,
    /// Raw structured payload returned by the model
    pub ai_analysis: Option<Json>,
    /// Resolution state
    pub status: ScanStatus,
    /// Model confidence in the diagnosis
    pub confidence_score: Option<f64>,
    /// Category of the main issue found
    pub issue_type: Option<String>,
    /// Human-readable description of the issue
    pub issue_description: Option<String>,
    /// Ordered recommended actions, possibly empty
    #[sea_orm(column_type = "Json")]
    pub recommendations: ScanRecommendations,
    /// When the scan was created
    pub created_at: DateTimeUtc,
    /// When the scan was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Scan and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each scan belongs to one plant
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
