//! Shared test utilities for `PlantBuddy`.
//!
//! This module provides an in-memory database, scripted fakes for the AI gateway and
//! object storage, and builders that create test entities with sensible defaults.
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use crate::{
    api::{AppState, USER_HEADER, create_router},
    config::settings::Settings,
    core::image::ImageUpload,
    entities::{
        HealthStatus, PlantModel, ScanModel, ScanRecommendations, ScanStatus, TaskModel,
        TaskPriority, TaskStatus, TaskType, plant, scan, task,
    },
    errors::{Error, Result},
    gateway::{AiGateway, ChatTurn, Classification, Diagnosis},
    storage::ObjectStorage,
};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tower::ServiceExt;

/// URL prefix used by [`MemoryStorage`].
pub const MEMORY_BASE_URL: &str = "memory://uploads";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for building a date in tests.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Shorthand for building a time of day in tests.
pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// A small valid PNG upload.
pub fn test_image() -> ImageUpload {
    ImageUpload::new("leaf.png", "image/png", vec![0x89, b'P', b'N', b'G', 1, 2, 3])
}

/// A healthy classification with the given name.
pub fn test_classification(name: &str) -> Classification {
    Classification {
        name: name.to_string(),
        description: format!("A {name} in a pot"),
        recommendations: "Water when the top soil is dry".to_string(),
        health_status: HealthStatus::Healthy,
        confidence_score: 0.9,
        health_notes: None,
    }
}

/// Inserts a plant directly, without touching storage or the gateway.
///
/// # Defaults
/// * `image_url`: a [`MEMORY_BASE_URL`] URL under the user's folder
/// * `health_status`: healthy
/// * `confidence_score`: 0.9
pub async fn create_test_plant(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
) -> Result<PlantModel> {
    let now = Utc::now();
    let plant = plant::ActiveModel {
        user_id: Set(user_id.to_string()),
        image_url: Set(format!(
            "{MEMORY_BASE_URL}/{user_id}/{}.png",
            name.to_lowercase()
        )),
        name: Set(name.to_string()),
        description: Set(format!("A {name} in a pot")),
        recommendations: Set("Water when the top soil is dry".to_string()),
        health_status: Set(HealthStatus::Healthy),
        confidence_score: Set(0.9),
        health_notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(plant.insert(db).await?)
}

/// Inserts a watering task for `plant` on `scheduled_date`.
pub async fn create_test_task(
    db: &DatabaseConnection,
    plant: &PlantModel,
    scheduled_date: NaiveDate,
    scheduled_time: Option<NaiveTime>,
    status: TaskStatus,
) -> Result<TaskModel> {
    create_typed_task(db, plant, TaskType::Watering, scheduled_date, scheduled_time, status).await
}

/// Inserts a task of the given type.
pub async fn create_typed_task(
    db: &DatabaseConnection,
    plant: &PlantModel,
    task_type: TaskType,
    scheduled_date: NaiveDate,
    scheduled_time: Option<NaiveTime>,
    status: TaskStatus,
) -> Result<TaskModel> {
    let now = Utc::now();
    let task = task::ActiveModel {
        plant_id: Set(plant.id),
        user_id: Set(plant.user_id.clone()),
        task_type: Set(task_type),
        title: Set(format!("Care for {}", plant.name)),
        description: Set(None),
        scheduled_date: Set(scheduled_date),
        scheduled_time: Set(scheduled_time),
        priority: Set(TaskPriority::Normal),
        status: Set(status),
        completed_at: Set((status == TaskStatus::Completed).then_some(now)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(task.insert(db).await?)
}

/// Inserts a completed scan with no recommendations.
pub async fn create_test_scan(db: &DatabaseConnection, plant: &PlantModel) -> Result<ScanModel> {
    let now = Utc::now();
    let scan = scan::ActiveModel {
        plant_id: Set(plant.id),
        user_id: Set(plant.user_id.clone()),
        scan_image_url: Set(Some(format!(
            "{MEMORY_BASE_URL}/{}/scans/test.png",
            plant.user_id
        ))),
        ai_analysis: Set(None),
        status: Set(ScanStatus::Completed),
        confidence_score: Set(Some(0.8)),
        issue_type: Set(Some("none".to_string())),
        issue_description: Set(None),
        recommendations: Set(ScanRecommendations::default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(scan.insert(db).await?)
}

/// In-memory [`ObjectStorage`] with switchable failures.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_put: AtomicBool,
    fail_delete: AtomicBool,
}

impl MemoryStorage {
    /// Empty storage that accepts every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent uploads fail.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent deletes fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<String> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(Error::storage("upload rejected"));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(format!("{MEMORY_BASE_URL}/{path}"))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::storage("delete rejected"));
        }
        self.objects
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| Error::storage(format!("no object at {path}")))
    }

    fn path_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(MEMORY_BASE_URL)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(ToString::to_string)
    }
}

/// A chat call observed by [`FakeGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedChat {
    /// System instruction sent
    pub system: Option<String>,
    /// History replayed before the message
    pub history: Vec<ChatTurn>,
    /// The new user message
    pub message: String,
}

/// Scripted [`AiGateway`].
///
/// Each call pops the next queued result for its operation. When nothing is queued
/// it answers with a healthy "Test Plant", an empty diagnosis, a fixed chat reply,
/// or a bag-of-words embedding.
#[derive(Default)]
pub struct FakeGateway {
    classifications: Mutex<VecDeque<Result<Classification>>>,
    diagnoses: Mutex<VecDeque<Result<Diagnosis>>>,
    replies: Mutex<VecDeque<Result<String>>>,
    chats: Mutex<Vec<RecordedChat>>,
    classify_calls: AtomicUsize,
}

/// Reply used by [`FakeGateway::chat`] when none is queued.
pub const DEFAULT_REPLY: &str = "Water it when the top inch of soil is dry.";

impl FakeGateway {
    /// Gateway answering with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the result of the next `classify` call.
    pub fn push_classification(&self, result: Result<Classification>) {
        self.classifications.lock().unwrap().push_back(result);
    }

    /// Queues the result of the next `diagnose` call.
    pub fn push_diagnosis(&self, result: Result<Diagnosis>) {
        self.diagnoses.lock().unwrap().push_back(result);
    }

    /// Queues the result of the next `chat` call.
    pub fn push_reply(&self, result: Result<String>) {
        self.replies.lock().unwrap().push_back(result);
    }

    /// Chat calls seen so far.
    pub fn chat_calls(&self) -> Vec<RecordedChat> {
        self.chats.lock().unwrap().clone()
    }

    /// Number of `classify` calls seen so far.
    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }
}

/// Embeds text as word counts hashed into 64 buckets.
pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; 64];
    for word in text.split_whitespace() {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(2_166_136_261_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(16_777_619));
        vector[(hash % 64) as usize] += 1.0;
    }
    vector
}

#[async_trait]
impl AiGateway for FakeGateway {
    async fn classify(&self, _image: &ImageUpload) -> Result<Classification> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.classifications.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(test_classification("Test Plant")))
    }

    async fn diagnose(&self, _image: &ImageUpload) -> Result<Diagnosis> {
        let next = self.diagnoses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(Diagnosis {
                confidence_score: Some(0.9),
                issue_type: Some("none".to_string()),
                issue_description: None,
                recommendations: Vec::new(),
                raw: serde_json::json!({"issue_type": "none", "recommendations": []}),
            })
        })
    }

    async fn chat(
        &self,
        system: Option<&str>,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String> {
        self.chats.lock().unwrap().push(RecordedChat {
            system: system.map(ToString::to_string),
            history: history.to_vec(),
            message: message.to_string(),
        });
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(DEFAULT_REPLY.to_string()))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = crate::gateway::prepare_embedding_input(text)?;
        Ok(bag_of_words(&input))
    }
}

/// Router wired to an in-memory database, [`FakeGateway`] and [`MemoryStorage`].
pub struct TestApp {
    /// The application router
    pub router: Router,
    /// Database behind the router
    pub db: DatabaseConnection,
    /// Gateway behind the router, for scripting replies
    pub gateway: Arc<FakeGateway>,
    /// Storage behind the router
    pub storage: Arc<MemoryStorage>,
}

impl TestApp {
    /// Builds the router with default settings.
    pub async fn new() -> Result<Self> {
        let db = setup_test_db().await?;
        let gateway = Arc::new(FakeGateway::new());
        let storage = Arc::new(MemoryStorage::new());
        let state = AppState {
            db: db.clone(),
            gateway: Arc::clone(&gateway) as Arc<dyn AiGateway>,
            storage: Arc::clone(&storage) as Arc<dyn ObjectStorage>,
            settings: Arc::new(Settings::default()),
        };
        Ok(Self {
            router: create_router(state),
            db,
            gateway,
            storage,
        })
    }

    /// Sends one request and returns the status with the JSON body (`Null` when empty).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        if bytes.is_empty() {
            return (status, Value::Null);
        }
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

/// Request without a body, optionally sent as `user`.
pub fn empty_request(method: Method, uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    builder.body(Body::empty()).unwrap()
}

/// Request with a JSON body, sent as `user`.
pub fn json_request(method: Method, uri: &str, user: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_HEADER, user)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart POST with one part per `(field, file_name, content_type, content)`.
pub fn multipart_request(uri: &str, user: &str, parts: &[(&str, &str, &str, &str)]) -> Request<Body> {
    const BOUNDARY: &str = "plant-buddy-test-boundary";
    let mut body = String::new();
    for (field, file_name, content_type, content) in parts {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(USER_HEADER, user)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
