//! Task entity - A scheduled care action tied to one plant.
//!
//! Tasks are created in batch right after a plant is identified and are afterwards
//! only mutated through status transitions (see `core::scheduler`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of care action
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Water the plant
    #[sea_orm(string_value = "watering")]
    Watering,
    /// Feed the plant
    #[sea_orm(string_value = "fertilizing")]
    Fertilizing,
    /// Inspect leaves, soil and pests
    #[sea_orm(string_value = "health_check")]
    HealthCheck,
    /// Turn the pot towards the light
    #[sea_orm(string_value = "rotate")]
    Rotate,
    /// Move to a bigger pot
    #[sea_orm(string_value = "repot")]
    Repot,
}

/// Urgency of a task or recommendation
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Whenever convenient
    #[sea_orm(string_value = "low")]
    Low,
    /// Regular care
    #[default]
    #[serde(alias = "medium")]
    #[sea_orm(string_value = "normal")]
    Normal,
    /// Should be done soon
    #[sea_orm(string_value = "high")]
    High,
    /// Should be done today
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

/// Lifecycle state of a task
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for its date
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// Done; `completed_at` is set
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Date passed without completion
    #[sea_orm(string_value = "overdue")]
    Overdue,
    /// Dismissed by the user
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl TaskStatus {
    /// Lowercase label used in storage and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the task can still be completed or cancelled.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Scheduled | Self::Overdue)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    /// Unique identifier for the task
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Plant this task cares for
    pub plant_id: i64,
    /// Owner of the task (same as the plant's owner)
    pub user_id: String,
    /// Kind of care action
    pub task_type: TaskType,
    /// Short display title (e.g. "Water Monstera")
    pub title: String,
    /// Optional longer instructions
    pub description: Option<String>,
    /// Day the task is due
    pub scheduled_date: Date,
    /// Time of day; `None` means any time
    pub scheduled_time: Option<Time>,
    /// Urgency
    pub priority: TaskPriority,
    /// Lifecycle state
    pub status: TaskStatus,
    /// Set exactly when `status` is completed
    pub completed_at: Option<DateTimeUtc>,
    /// When the task was created
    pub created_at: DateTimeUtc,
    /// When the task was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Task and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each task belongs to one plant
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
