//! Scan pipeline - Diagnoses follow-up photos of existing plants.
//!
//! A scan is recorded as `pending` as soon as its image is stored, before the model
//! is asked anything. The diagnosis then resolves it exactly once, to `completed`
//! with the analysis or to `failed`. A failed scan stays queryable.

use crate::{
    core::{image::ImageUpload, plant::get_plant},
    entities::{
        Plant, PlantModel, Scan, ScanColumn, ScanModel, ScanRecommendations, ScanStatus, scan,
    },
    errors::{Error, Result},
    gateway::AiGateway,
    storage::{ImageKind, ObjectStorage, object_path},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{info, warn};

/// A scan with its plant's display name, for the all-scans list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    /// The scan
    #[serde(flatten)]
    pub scan: ScanModel,
    /// Name of the scanned plant
    pub plant_name: String,
}

/// Stores a follow-up photo and diagnoses it.
///
/// Returns the resolved scan. A diagnosis failure is not an error here: the scan is
/// returned with `status = failed` so the caller can report it and offer a retry.
///
/// # Errors
/// * [`Error::Validation`] for a bad image, before anything is stored
/// * [`Error::NotFound`] if the plant is missing or owned by someone else
/// * [`Error::Storage`] if the upload fails
pub async fn submit_scan(
    db: &DatabaseConnection,
    gateway: &dyn AiGateway,
    storage: &dyn ObjectStorage,
    max_image_bytes: usize,
    plant_id: i64,
    user_id: &str,
    image: &ImageUpload,
) -> Result<ScanModel> {
    image.validate(max_image_bytes)?;
    let plant = get_plant(db, plant_id, user_id).await?;

    let path = object_path(user_id, ImageKind::Scan, image)?;
    let image_url = storage.put(&path, &image.bytes, &image.content_type).await?;

    let now = Utc::now();
    let pending = scan::ActiveModel {
        plant_id: Set(plant.id),
        user_id: Set(user_id.to_string()),
        scan_image_url: Set(Some(image_url)),
        ai_analysis: Set(None),
        status: Set(ScanStatus::Pending),
        confidence_score: Set(None),
        issue_type: Set(None),
        issue_description: Set(None),
        recommendations: Set(ScanRecommendations::default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let pending = match pending.insert(db).await {
        Ok(model) => model,
        Err(e) => {
            if let Err(cleanup) = storage.delete(&path).await {
                warn!(path, error = %cleanup, "Failed to remove scan upload after insert failure");
            }
            return Err(e.into());
        }
    };
    info!(scan_id = pending.id, plant_id, user_id, "Scan pending");

    let scan_id = pending.id;
    let mut active: scan::ActiveModel = pending.into();
    match gateway.diagnose(image).await {
        Ok(diagnosis) => {
            active.status = Set(ScanStatus::Completed);
            active.ai_analysis = Set(Some(diagnosis.raw));
            active.confidence_score = Set(diagnosis.confidence_score);
            active.issue_type = Set(diagnosis.issue_type);
            active.issue_description = Set(diagnosis.issue_description);
            active.recommendations = Set(ScanRecommendations(diagnosis.recommendations));
        }
        Err(e) => {
            warn!(scan_id, plant_id, error = %e, "Diagnosis failed");
            active.status = Set(ScanStatus::Failed);
        }
    }
    active.updated_at = Set(Utc::now());

    let resolved = active.update(db).await?;
    info!(scan_id, status = ?resolved.status, "Scan resolved");
    Ok(resolved)
}

/// Fetches an owned scan.
pub async fn get_scan(db: &DatabaseConnection, scan_id: i64, user_id: &str) -> Result<ScanModel> {
    Scan::find_by_id(scan_id)
        .filter(ScanColumn::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("scan", scan_id))
}

/// Lists the scans of an owned plant, newest first.
pub async fn list_scans_for_plant(
    db: &DatabaseConnection,
    plant_id: i64,
    user_id: &str,
) -> Result<Vec<ScanModel>> {
    let plant = get_plant(db, plant_id, user_id).await?;
    Scan::find()
        .filter(ScanColumn::PlantId.eq(plant.id))
        .order_by_desc(ScanColumn::CreatedAt)
        .order_by_desc(ScanColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists every scan of a user, newest first, with plant names.
pub async fn list_all_scans(db: &DatabaseConnection, user_id: &str) -> Result<Vec<ScanSummary>> {
    let rows: Vec<(ScanModel, Option<PlantModel>)> = Scan::find()
        .filter(ScanColumn::UserId.eq(user_id))
        .order_by_desc(ScanColumn::CreatedAt)
        .order_by_desc(ScanColumn::Id)
        .find_also_related(Plant)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(scan, plant)| ScanSummary {
            scan,
            plant_name: plant.map(|p| p.name).unwrap_or_default(),
        })
        .collect())
}
