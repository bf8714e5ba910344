//! Scan endpoints.

use super::{AppState, CurrentUser, extract::PathParam, plants::read_images};
use crate::{
    core::scan::{self, ScanSummary},
    entities::{ScanModel, ScanRecommendation, ScanRecommendations, ScanStatus, TaskPriority},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Shown for a completed scan whose diagnosis listed no actions.
fn monitoring_recommendation() -> ScanRecommendation {
    ScanRecommendation {
        kind: Some("monitor".to_string()),
        action: "Continue monitoring your plant's health".to_string(),
        priority: TaskPriority::Low,
        timing: "ongoing".to_string(),
    }
}

/// Fills in the monitoring recommendation for completed scans without any.
#[must_use]
pub fn present(mut scan: ScanModel) -> ScanModel {
    if scan.status == ScanStatus::Completed && scan.recommendations.0.is_empty() {
        scan.recommendations = ScanRecommendations(vec![monitoring_recommendation()]);
    }
    scan
}

/// `POST /plants/:id/scans`: diagnoses the first uploaded image.
///
/// A scan whose diagnosis failed is still stored; the response is 502 and carries
/// its `scan_id` so the client can show it and offer a retry.
pub async fn submit(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(plant_id): PathParam<i64>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let image = read_images(multipart?)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::validation("No image file provided"))?;

    let scan = scan::submit_scan(
        &state.db,
        state.gateway.as_ref(),
        state.storage.as_ref(),
        state.settings.storage.max_image_bytes,
        plant_id,
        &user_id,
        &image,
    )
    .await?;

    if scan.status == ScanStatus::Failed {
        let body = json!({
            "error": "The plant analysis service is unavailable. Please try again.",
            "code": "gateway",
            "retryable": true,
            "scan_id": scan.id,
        });
        return Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response());
    }
    Ok((StatusCode::CREATED, Json(present(scan))).into_response())
}

/// `GET /plants/:id/scans`
pub async fn list_for_plant(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(plant_id): PathParam<i64>,
) -> Result<Json<Vec<ScanModel>>> {
    let scans = scan::list_scans_for_plant(&state.db, plant_id, &user_id).await?;
    Ok(Json(scans.into_iter().map(present).collect()))
}

/// `GET /scans`
pub async fn list_all(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<ScanSummary>>> {
    let scans = scan::list_all_scans(&state.db, &user_id).await?;
    Ok(Json(
        scans
            .into_iter()
            .map(|summary| ScanSummary {
                scan: present(summary.scan),
                plant_name: summary.plant_name,
            })
            .collect(),
    ))
}

/// `GET /scans/:id`
pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    PathParam(scan_id): PathParam<i64>,
) -> Result<Json<ScanModel>> {
    Ok(Json(present(
        scan::get_scan(&state.db, scan_id, &user_id).await?,
    )))
}
