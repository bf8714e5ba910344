//! Semantic plant search over embeddings.

use crate::{
    core::plant::list_plants,
    entities::PlantModel,
    errors::{Error, Result},
    gateway::AiGateway,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::cmp::Ordering;

/// A plant ranked against a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// The matching plant
    pub plant: PlantModel,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Cosine similarity of two vectors; zero when lengths differ or either is all zeros.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Ranks a user's plants by similarity of "name + description" to `query`.
pub async fn search_plants(
    db: &DatabaseConnection,
    gateway: &dyn AiGateway,
    user_id: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchHit>> {
    if query.trim().is_empty() {
        return Err(Error::validation("Search query cannot be empty"));
    }

    let query_vector = gateway.embed(query).await?;
    let mut hits = Vec::new();
    for plant in list_plants(db, user_id, None).await? {
        let vector = gateway
            .embed(&format!("{} {}", plant.name, plant.description))
            .await?;
        let score = cosine_similarity(&query_vector, &vector);
        hits.push(SearchHit { plant, score });
    }

    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    hits.truncate(limit);
    Ok(hits)
}
