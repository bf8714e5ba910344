//! Plant business logic - Stores identified plants and enforces ownership.
//!
//! Every read or write takes the requesting user's id. A plant owned by someone else
//! is reported exactly like a missing one so callers cannot test for existence.

use crate::{
    core::{image::ImageUpload, page_size, scheduler::chronological},
    entities::{
        ChatMessage, ChatMessageColumn, Plant, PlantColumn, PlantModel, Scan, ScanColumn,
        ScanModel, Task, TaskColumn, TaskModel, plant,
    },
    errors::{Error, Result},
    gateway::{Classification, parse::clamp_confidence},
    storage::{ImageKind, ObjectStorage, object_path},
};
use chrono::Utc;
use rand::Rng;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Editable plant fields; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlantUpdate {
    /// New display name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New care recommendations
    pub recommendations: Option<String>,
}

/// A plant with its tasks and scans, for the per-plant view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantDetail {
    /// The plant itself
    pub plant: PlantModel,
    /// Care tasks, earliest first
    pub tasks: Vec<TaskModel>,
    /// Diagnostic scans, newest first
    pub scans: Vec<ScanModel>,
}

/// Fetches a plant owned by `user_id`.
///
/// # Errors
/// [`Error::NotFound`] when the plant is missing or belongs to another user.
pub async fn get_plant<C>(db: &C, plant_id: i64, user_id: &str) -> Result<PlantModel>
where
    C: ConnectionTrait,
{
    Plant::find_by_id(plant_id)
        .filter(PlantColumn::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("plant", plant_id))
}

/// Lists a user's plants, newest first, optionally capped at `limit`.
///
/// # Errors
/// [`Error::Validation`] when `limit` is above [`crate::core::MAX_PAGE_SIZE`].
pub async fn list_plants(
    db: &DatabaseConnection,
    user_id: &str,
    limit: Option<u64>,
) -> Result<Vec<PlantModel>> {
    let limit = limit.map(page_size).transpose()?;
    Plant::find()
        .filter(PlantColumn::UserId.eq(user_id))
        .order_by_desc(PlantColumn::CreatedAt)
        .order_by_desc(PlantColumn::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Stores the image, then inserts the plant row pointing at it.
///
/// If the insert fails the uploaded object is removed again so no orphan is left in
/// storage. The image is expected to have been validated by the caller.
pub async fn create_plant(
    db: &DatabaseConnection,
    storage: &dyn ObjectStorage,
    user_id: &str,
    image: &ImageUpload,
    classification: &Classification,
) -> Result<PlantModel> {
    let path = object_path(user_id, ImageKind::Plant, image)?;
    let image_url = storage.put(&path, &image.bytes, &image.content_type).await?;

    let now = Utc::now();
    let plant = plant::ActiveModel {
        user_id: Set(user_id.to_string()),
        image_url: Set(image_url),
        name: Set(classification.name.clone()),
        description: Set(classification.description.clone()),
        recommendations: Set(classification.recommendations.clone()),
        health_status: Set(classification.health_status),
        confidence_score: Set(clamp_confidence(classification.confidence_score, 0.5)),
        health_notes: Set(classification.health_notes.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match plant.insert(db).await {
        Ok(model) => {
            info!(plant_id = model.id, user_id, name = %model.name, "Created plant");
            Ok(model)
        }
        Err(e) => {
            if let Err(cleanup) = storage.delete(&path).await {
                warn!(path, error = %cleanup, "Failed to remove upload after insert failure");
            }
            Err(e.into())
        }
    }
}

/// Applies a partial update to an owned plant.
pub async fn update_plant(
    db: &DatabaseConnection,
    plant_id: i64,
    user_id: &str,
    update: PlantUpdate,
) -> Result<PlantModel> {
    let existing = get_plant(db, plant_id, user_id).await?;
    let mut active: plant::ActiveModel = existing.into();

    if let Some(name) = update.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Plant name cannot be empty"));
        }
        active.name = Set(name.to_string());
    }
    if let Some(description) = update.description {
        active.description = Set(description);
    }
    if let Some(recommendations) = update.recommendations {
        active.recommendations = Set(recommendations);
    }
    active.updated_at = Set(Utc::now());

    Ok(active.update(db).await?)
}

/// Deletes an owned plant together with its tasks, scans and chat history.
///
/// Stored images are removed on a best-effort basis: a storage failure is logged and
/// never prevents the rows from being deleted.
pub async fn delete_plant(
    db: &DatabaseConnection,
    storage: &dyn ObjectStorage,
    plant_id: i64,
    user_id: &str,
) -> Result<()> {
    let plant = get_plant(db, plant_id, user_id).await?;

    let scan_urls: Vec<String> = Scan::find()
        .filter(ScanColumn::PlantId.eq(plant.id))
        .all(db)
        .await?
        .into_iter()
        .filter_map(|scan| scan.scan_image_url)
        .collect();

    for url in std::iter::once(&plant.image_url).chain(scan_urls.iter()) {
        delete_object_quietly(storage, url).await;
    }

    let txn = db.begin().await?;
    Task::delete_many()
        .filter(TaskColumn::PlantId.eq(plant.id))
        .exec(&txn)
        .await?;
    Scan::delete_many()
        .filter(ScanColumn::PlantId.eq(plant.id))
        .exec(&txn)
        .await?;
    ChatMessage::delete_many()
        .filter(ChatMessageColumn::PlantId.eq(plant.id))
        .exec(&txn)
        .await?;
    Plant::delete_by_id(plant.id).exec(&txn).await?;
    txn.commit().await?;

    info!(plant_id, user_id, "Deleted plant");
    Ok(())
}

async fn delete_object_quietly(storage: &dyn ObjectStorage, url: &str) {
    let Some(path) = storage.path_for_url(url) else {
        warn!(url, "Stored image URL is not managed by this storage, skipping delete");
        return;
    };
    if let Err(e) = storage.delete(&path).await {
        warn!(path, error = %e, "Failed to delete stored image");
    }
}

/// Picks one of the user's plants uniformly at random, `None` when they own none.
pub async fn random_plant(db: &DatabaseConnection, user_id: &str) -> Result<Option<PlantModel>> {
    let count = Plant::find()
        .filter(PlantColumn::UserId.eq(user_id))
        .count(db)
        .await?;
    if count == 0 {
        return Ok(None);
    }

    let offset = rand::thread_rng().gen_range(0..count);
    Plant::find()
        .filter(PlantColumn::UserId.eq(user_id))
        .order_by_asc(PlantColumn::Id)
        .offset(offset)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads an owned plant with its tasks and scans.
pub async fn plant_detail(
    db: &DatabaseConnection,
    plant_id: i64,
    user_id: &str,
) -> Result<PlantDetail> {
    let plant = get_plant(db, plant_id, user_id).await?;

    let tasks = chronological(Task::find().filter(TaskColumn::PlantId.eq(plant.id)))
        .all(db)
        .await?;

    let scans = Scan::find()
        .filter(ScanColumn::PlantId.eq(plant.id))
        .order_by_desc(ScanColumn::CreatedAt)
        .order_by_desc(ScanColumn::Id)
        .all(db)
        .await?;

    Ok(PlantDetail {
        plant,
        tasks,
        scans,
    })
}
