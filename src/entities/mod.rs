//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod chat_message;
pub mod plant;
pub mod scan;
pub mod task;

// Re-export specific types to avoid conflicts
pub use chat_message::{
    ChatRole, Column as ChatMessageColumn, Entity as ChatMessage, Model as ChatMessageModel,
};
pub use plant::{Column as PlantColumn, Entity as Plant, HealthStatus, Model as PlantModel};
pub use scan::{
    Column as ScanColumn, Entity as Scan, Model as ScanModel, ScanRecommendation,
    ScanRecommendations, ScanStatus,
};
pub use task::{
    Column as TaskColumn, Entity as Task, Model as TaskModel, TaskPriority, TaskStatus, TaskType,
};
