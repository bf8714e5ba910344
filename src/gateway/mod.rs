//! AI gateway - uniform access to the generative model.
//!
//! The rest of the crate talks to the model only through [`AiGateway`]. Model output
//! is parsed and normalized in [`parse`] so every implementation hands back the same
//! typed results: confidence already clamped, optional display fields defaulted, and
//! non-plant images reported as [`Error::NotAPlant`](crate::errors::Error::NotAPlant).

pub mod gemini;
pub mod parse;
pub mod prompts;

use crate::core::image::ImageUpload;
use crate::entities::{ChatRole, HealthStatus, ScanRecommendation};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use gemini::GeminiGateway;

/// Longest text accepted for embedding, in characters.
pub const MAX_EMBEDDING_CHARS: usize = 100_000;

/// Result of identifying a plant photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Common and scientific name
    pub name: String,
    /// Botanical description
    pub description: String,
    /// Care instructions
    pub recommendations: String,
    /// Health assessment
    pub health_status: HealthStatus,
    /// Confidence within [0, 1]
    pub confidence_score: f64,
    /// Observed health issues
    pub health_notes: Option<String>,
}

/// Result of diagnosing a follow-up photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Confidence within [0, 1], when reported
    pub confidence_score: Option<f64>,
    /// Category of the main issue (light, water, nutrients, pests, ...)
    pub issue_type: Option<String>,
    /// Description of the main issue
    pub issue_description: Option<String>,
    /// Ordered recommended actions
    pub recommendations: Vec<ScanRecommendation>,
    /// Full payload as returned by the model
    pub raw: serde_json::Value,
}

/// One prior message replayed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author of the message
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

/// Generative AI capability used by the service layer.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Identifies the plant in an image.
    ///
    /// # Errors
    /// [`Error::NotAPlant`] when the model says the image shows no plant,
    /// [`Error::Gateway`] for transport failures or unparseable output.
    async fn classify(&self, image: &ImageUpload) -> Result<Classification>;

    /// Diagnoses health issues in a follow-up photo.
    async fn diagnose(&self, image: &ImageUpload) -> Result<Diagnosis>;

    /// Generates a reply. `system` is sent ahead of `history`, which is replayed in
    /// order before `message`.
    async fn chat(&self, system: Option<&str>, history: &[ChatTurn], message: &str)
    -> Result<String>;

    /// Embeds text into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Trims and truncates embedding input, rejecting empty text.
pub fn prepare_embedding_input(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Cannot embed empty text"));
    }
    Ok(trimmed.chars().take(MAX_EMBEDDING_CHARS).collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_prepare_embedding_input() {
        assert_eq!(prepare_embedding_input("  fern  ").unwrap(), "fern");
        assert!(matches!(
            prepare_embedding_input("   "),
            Err(Error::Validation { .. })
        ));

        let long = "a".repeat(MAX_EMBEDDING_CHARS + 50);
        assert_eq!(
            prepare_embedding_input(&long).unwrap().len(),
            MAX_EMBEDDING_CHARS
        );
    }
}
