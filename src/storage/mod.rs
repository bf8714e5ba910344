//! Object storage for uploaded images.
//!
//! Objects are addressed by a relative path that always starts with the owning
//! user's id, so two users can never collide on a key. Implementations return the
//! public URL of each stored object.

pub mod local;

use crate::core::image::ImageUpload;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

pub use local::LocalObjectStorage;

/// Storage backend for image objects.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under `path` and returns the object's public URL.
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String>;

    /// Removes the object at `path`.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Maps a public URL produced by [`ObjectStorage::put`] back to its path.
    fn path_for_url(&self, url: &str) -> Option<String>;
}

/// Kind of image being stored, which decides its folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Photo used to identify a new plant
    Plant,
    /// Follow-up diagnostic photo
    Scan,
}

/// Builds a unique object path namespaced by user id.
///
/// Plant photos land in `{user}/{millis}-{uuid}.{ext}`, scans in
/// `{user}/scans/{millis}-{uuid}.{ext}`.
pub fn object_path(user_id: &str, kind: ImageKind, image: &ImageUpload) -> Result<String> {
    validate_segment(user_id)?;
    let file_name = format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        image.extension()
    );
    Ok(match kind {
        ImageKind::Plant => format!("{user_id}/{file_name}"),
        ImageKind::Scan => format!("{user_id}/scans/{file_name}"),
    })
}

/// Rejects path segments that could escape the user's namespace.
fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('/')
        || segment.contains('\\')
    {
        return Err(Error::validation(format!(
            "'{segment}' cannot be used as a storage namespace"
        )));
    }
    Ok(())
}
