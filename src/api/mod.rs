//! HTTP API - axum router over the core operations.
//!
//! Handlers stay thin: extract the user and inputs, call into `core`, and serialize
//! the result. Errors become JSON bodies through [`error`], including rejected
//! inputs via the wrappers in [`extract`].

pub mod chat;
pub mod discover;
pub mod error;
pub mod extract;
pub mod plants;
pub mod scans;
pub mod tasks;
pub mod user;

use crate::{config::settings::Settings, gateway::AiGateway, storage::ObjectStorage};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use chrono::{NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub use user::{CurrentUser, USER_HEADER};

/// Most image files accepted in one multipart request.
pub const MAX_FILES_PER_REQUEST: usize = 10;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Model backend
    pub gateway: Arc<dyn AiGateway>,
    /// Image storage backend
    pub storage: Arc<dyn ObjectStorage>,
    /// Loaded settings
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Today's date in UTC.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Builds the application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .settings
        .storage
        .max_image_bytes
        .saturating_mul(MAX_FILES_PER_REQUEST)
        .saturating_add(1024 * 1024);
    let uploads = ServeDir::new(&state.settings.storage.root);

    Router::new()
        .route("/health", get(health))
        .route("/plants", get(plants::list).post(plants::upload))
        .route("/plants/random", get(plants::random))
        .route(
            "/plants/:id",
            get(plants::detail)
                .patch(plants::update)
                .delete(plants::remove),
        )
        .route(
            "/plants/:id/scans",
            get(scans::list_for_plant).post(scans::submit),
        )
        .route(
            "/plants/:id/chat",
            get(chat::history).post(chat::send).delete(chat::clear),
        )
        .route("/plants/:id/tasks", get(tasks::for_plant))
        .route("/scans", get(scans::list_all))
        .route("/scans/:id", get(scans::detail))
        .route("/tasks", get(tasks::range))
        .route("/tasks/upcoming", get(tasks::upcoming))
        .route("/tasks/:id/status", put(tasks::set_status))
        .route("/calendar", get(tasks::calendar))
        .route("/stats", get(tasks::stats))
        .route("/suggestions", post(discover::suggestions))
        .route("/search", get(discover::search))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
