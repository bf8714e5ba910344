//! Plant suggestions and semantic search.

use super::{
    AppState, CurrentUser,
    extract::{JsonBody, QueryParams},
};
use crate::{
    core::{
        search::{SearchHit, search_plants},
        suggestion::{ExperienceLevel, PlantPreferences, PlantSuggestion, suggest_plants},
    },
    errors::Result,
};
use axum::{
    Json,
    extract::State,
};
use serde::Deserialize;

/// Default number of search hits.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Body of `POST /suggestions`.
#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    /// Light conditions
    pub light: String,
    /// Available space
    pub space: String,
    /// beginner, some or expert
    pub experience: String,
    /// Air humidity
    pub humidity: String,
    /// Room temperature
    pub temperature: String,
}

impl TryFrom<SuggestionRequest> for PlantPreferences {
    type Error = crate::errors::Error;

    fn try_from(request: SuggestionRequest) -> Result<Self> {
        Ok(Self {
            light: request.light,
            space: request.space,
            experience: request.experience.parse::<ExperienceLevel>()?,
            humidity: request.humidity,
            temperature: request.temperature,
        })
    }
}

/// `POST /suggestions`
pub async fn suggestions(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
    JsonBody(request): JsonBody<SuggestionRequest>,
) -> Result<Json<Vec<PlantSuggestion>>> {
    let preferences = PlantPreferences::try_from(request)?;
    Ok(Json(
        suggest_plants(state.gateway.as_ref(), &preferences).await?,
    ))
}

/// Query for `GET /search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Free-text query
    pub q: String,
    /// Most hits to return
    pub limit: Option<usize>,
}

/// `GET /search?q=&limit=`
pub async fn search(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    QueryParams(query): QueryParams<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>> {
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    Ok(Json(
        search_plants(&state.db, state.gateway.as_ref(), &user_id, &query.q, limit).await?,
    ))
}
