//! Upload pipeline - Turns a photo into a stored plant with a care schedule.
//!
//! validate → classify → store image and row → seed tasks.
//!
//! A photo the model rejects as "not a plant" stops the pipeline before anything is
//! stored. Task seeding runs after the plant exists and never undoes it.

use crate::{
    config::settings::Settings,
    core::{image::ImageUpload, plant::create_plant, task_generator::seed_tasks_best_effort},
    entities::PlantModel,
    errors::{Error, Result},
    gateway::AiGateway,
    storage::ObjectStorage,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use tracing::info;

/// Result of processing one file from a multi-file upload.
#[derive(Debug)]
pub struct UploadOutcome {
    /// Name of the uploaded file
    pub file_name: String,
    /// The created plant, or why none was created
    pub result: Result<PlantModel>,
}

/// Identifies the plant in `image`, stores it and seeds its tasks.
///
/// # Errors
/// * [`Error::Validation`] for unsupported, empty or oversized images
/// * [`Error::NotAPlant`] when the model rejects the image; nothing is stored
/// * [`Error::Gateway`] when the model call fails
/// * [`Error::Storage`] when the upload fails
pub async fn identify_and_store(
    db: &DatabaseConnection,
    gateway: &dyn AiGateway,
    storage: &dyn ObjectStorage,
    settings: &Settings,
    user_id: &str,
    image: &ImageUpload,
    today: NaiveDate,
) -> Result<PlantModel> {
    image.validate(settings.storage.max_image_bytes)?;

    let classification = gateway.classify(image).await.inspect_err(|e| {
        if let Error::NotAPlant { reason } = e {
            info!(user_id, file = %image.file_name, reason, "Image rejected as not a plant");
        }
    })?;

    let plant = create_plant(db, storage, user_id, image, &classification).await?;
    seed_tasks_best_effort(
        db,
        &settings.care_schedule,
        plant.id,
        user_id,
        &plant.name,
        today,
    )
    .await;

    Ok(plant)
}

/// Processes several images independently; one failure does not affect the others.
pub async fn identify_and_store_all(
    db: &DatabaseConnection,
    gateway: &dyn AiGateway,
    storage: &dyn ObjectStorage,
    settings: &Settings,
    user_id: &str,
    images: &[ImageUpload],
    today: NaiveDate,
) -> Vec<UploadOutcome> {
    let mut outcomes = Vec::with_capacity(images.len());
    for image in images {
        outcomes.push(UploadOutcome {
            file_name: image.file_name.clone(),
            result: identify_and_store(db, gateway, storage, settings, user_id, image, today)
                .await,
        });
    }
    outcomes
}
