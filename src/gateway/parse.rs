//! Model output parsing.
//!
//! The model is asked for JSON but may wrap it in markdown fences, use either
//! camelCase or snake_case keys, omit fields, or return numbers out of range.
//! Anything that is not JSON at all is a gateway error, never data.

use super::{Classification, Diagnosis};
use crate::entities::{HealthStatus, ScanRecommendation};
use crate::errors::{Error, Result};
use serde::Deserialize;

const DEFAULT_PLANT_NAME: &str = "Unknown plant";
const DEFAULT_DESCRIPTION: &str = "No description available";
const DEFAULT_RECOMMENDATIONS: &str = "General plant care recommended";
const DEFAULT_NOT_A_PLANT: &str = "Image does not contain flowers or plants";
const DEFAULT_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassificationPayload {
    #[serde(default, alias = "is_flower", alias = "isPlant", alias = "is_plant")]
    is_flower: bool,
    name: Option<String>,
    description: Option<String>,
    recommendations: Option<String>,
    #[serde(alias = "health_status")]
    health_status: Option<String>,
    #[serde(alias = "confidence_score")]
    confidence_score: Option<f64>,
    #[serde(alias = "health_notes")]
    health_notes: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
struct DiagnosisPayload {
    #[serde(alias = "confidenceScore")]
    confidence_score: Option<f64>,
    #[serde(alias = "issueType")]
    issue_type: Option<String>,
    #[serde(alias = "issueDescription")]
    issue_description: Option<String>,
    #[serde(default)]
    recommendations: Vec<ScanRecommendation>,
}

/// Clamps a confidence value into [0, 1]; non-finite values become `fallback`.
#[must_use]
pub fn clamp_confidence(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Removes a surrounding markdown code fence, if any.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Maps a free-form health label onto [`HealthStatus`].
#[must_use]
pub fn parse_health_status(label: &str) -> HealthStatus {
    match label.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
        "healthy" => HealthStatus::Healthy,
        "diseased" => HealthStatus::Diseased,
        "needs_attention" => HealthStatus::NeedsAttention,
        _ => HealthStatus::Unknown,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parses a classification response.
///
/// # Errors
/// [`Error::Gateway`] when the text is not the expected JSON object,
/// [`Error::NotAPlant`] when the model flagged the image as non-botanical.
pub fn parse_classification(text: &str) -> Result<Classification> {
    let payload: ClassificationPayload = serde_json::from_str(strip_code_fences(text))?;

    if !payload.is_flower {
        return Err(Error::NotAPlant {
            reason: non_empty(payload.error).unwrap_or_else(|| DEFAULT_NOT_A_PLANT.to_string()),
        });
    }

    Ok(Classification {
        name: non_empty(payload.name).unwrap_or_else(|| DEFAULT_PLANT_NAME.to_string()),
        description: non_empty(payload.description)
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        recommendations: non_empty(payload.recommendations)
            .unwrap_or_else(|| DEFAULT_RECOMMENDATIONS.to_string()),
        health_status: payload
            .health_status
            .as_deref()
            .map_or(HealthStatus::Unknown, parse_health_status),
        confidence_score: clamp_confidence(
            payload.confidence_score.unwrap_or(DEFAULT_CONFIDENCE),
            DEFAULT_CONFIDENCE,
        ),
        health_notes: non_empty(payload.health_notes),
    })
}

/// Parses a diagnosis response, keeping the raw payload alongside the typed fields.
///
/// # Errors
/// [`Error::Gateway`] when the text is not the expected JSON object.
pub fn parse_diagnosis(text: &str) -> Result<Diagnosis> {
    let raw: serde_json::Value = serde_json::from_str(strip_code_fences(text))?;
    if !raw.is_object() {
        return Err(Error::gateway("Diagnosis response is not a JSON object"));
    }
    let payload: DiagnosisPayload = serde_json::from_value(raw.clone())?;

    Ok(Diagnosis {
        confidence_score: payload
            .confidence_score
            .map(|c| clamp_confidence(c, DEFAULT_CONFIDENCE)),
        issue_type: non_empty(payload.issue_type),
        issue_description: non_empty(payload.issue_description),
        recommendations: payload
            .recommendations
            .into_iter()
            .filter(|r| !r.action.trim().is_empty())
            .collect(),
        raw,
    })
}
