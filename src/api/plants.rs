//! Plant endpoints: upload, listing, detail, edit and delete.

use super::{
    AppState, CurrentUser, MAX_FILES_PER_REQUEST,
    extract::{JsonBody, PathParam, QueryParams},
};
use crate::{
    core::{
        image::ImageUpload,
        plant::{self, PlantDetail, PlantUpdate},
        upload::identify_and_store_all,
    },
    entities::PlantModel,
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Multipart field name carrying image files.
pub const FILE_FIELD: &str = "file";

/// Reads every `file` field of a multipart body into uploads.
///
/// Other fields are ignored. A body with no file is a validation error.
pub async fn read_images(mut multipart: Multipart) -> Result<Vec<ImageUpload>> {
    let mut images = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if images.len() == MAX_FILES_PER_REQUEST {
            return Err(Error::validation(format!(
                "At most {MAX_FILES_PER_REQUEST} images can be uploaded at once"
            )));
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::validation(format!("Could not read {file_name}: {e}")))?;
        images.push(ImageUpload::new(file_name, content_type, bytes.to_vec()));
    }

    if images.is_empty() {
        return Err(Error::validation("No image file provided"));
    }
    Ok(images)
}

/// A file from a multi-file upload that did not become a plant.
#[derive(Debug, Serialize)]
pub struct UploadFailure {
    /// Name of the file
    pub file_name: String,
    /// Why it failed
    pub error: String,
    /// Error code, as in error bodies
    pub code: &'static str,
}

/// Result of `POST /plants`.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Plants created, in upload order
    pub plants: Vec<PlantModel>,
    /// Files that failed
    pub errors: Vec<UploadFailure>,
}

/// `POST /plants`: identifies and stores each uploaded image.
///
/// Responds 201 when at least one plant was created. When every file failed the
/// first failure is returned as the error.
pub async fn upload(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let images = read_images(multipart?).await?;
    let outcomes = identify_and_store_all(
        &state.db,
        state.gateway.as_ref(),
        state.storage.as_ref(),
        &state.settings,
        &user_id,
        &images,
        state.today(),
    )
    .await;

    let mut plants = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(plant) => plants.push(plant),
            Err(e) => failures.push((outcome.file_name, e)),
        }
    }

    if plants.is_empty() {
        if let Some((_, first)) = failures.into_iter().next() {
            return Err(first);
        }
        return Err(Error::validation("No image file provided"));
    }

    info!(user_id = %user_id, created = plants.len(), failed = failures.len(), "Upload processed");
    let errors = failures
        .into_iter()
        .map(|(file_name, e)| UploadFailure {
            file_name,
            error: e.public_message(),
            code: e.code(),
        })
        .collect();
    Ok((StatusCode::CREATED, Json(UploadResponse { plants, errors })))
}

/// Query for `GET /plants`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Most plants to return
    pub limit: Option<u64>,
}

/// `GET /plants`
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Vec<PlantModel>>> {
    Ok(Json(plant::list_plants(&state.db, &user_id, query.limit).await?))
}

/// Body of `GET /plants/random`.
#[derive(Debug, Serialize)]
pub struct RandomPlant {
    /// The chosen plant, null when the user has none
    pub plant: Option<PlantModel>,
}

/// `GET /plants/random`
pub async fn random(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<RandomPlant>> {
    let plant = plant::random_plant(&state.db, &user_id).await?;
    Ok(Json(RandomPlant { plant }))
}

/// `GET /plants/:id`
pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(plant_id): PathParam<i64>,
) -> Result<Json<PlantDetail>> {
    Ok(Json(plant::plant_detail(&state.db, plant_id, &user_id).await?))
}

/// `PATCH /plants/:id`
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(plant_id): PathParam<i64>,
    JsonBody(update): JsonBody<PlantUpdate>,
) -> Result<Json<PlantModel>> {
    Ok(Json(
        plant::update_plant(&state.db, plant_id, &user_id, update).await?,
    ))
}

/// `DELETE /plants/:id`
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(plant_id): PathParam<i64>,
) -> Result<StatusCode> {
    plant::delete_plant(&state.db, state.storage.as_ref(), plant_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
