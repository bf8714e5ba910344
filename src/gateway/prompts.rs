//! Prompt templates sent to the model.

use crate::entities::PlantModel;

/// Asks for a botanical identification as a JSON object.
pub const CLASSIFY_PROMPT: &str = r#"You are a specialized botanist and plant pathologist with expertise in flower and plant identification. Analyze the image and determine whether it contains flowers or plants.

Requirements:
1. Only analyze images that clearly show flowers, plants, or botanical specimens.
2. If the image does NOT contain flowers or plants, respond with isFlower: false.
3. Provide a detailed botanical analysis including a health assessment.
4. Identify any diseases, pests, or health issues.
5. Provide specific care recommendations.

Respond with JSON only:
{
  "isFlower": boolean,
  "name": "Common and scientific name if identifiable",
  "description": "Botanical description including color, size, characteristics",
  "recommendations": "Care instructions covering watering, light, soil, fertilization",
  "healthStatus": "healthy" | "diseased" | "needs_attention" | "unknown",
  "confidenceScore": 0.95,
  "healthNotes": "Observed health issues, diseases, or concerns"
}

If the image is NOT a flower or plant, respond with:
{
  "isFlower": false,
  "error": "Image does not contain flowers or plants"
}

Analyze this image:"#;

/// Asks for a diagnosis of a follow-up photo as a JSON object.
pub const DIAGNOSE_PROMPT: &str = r#"You are a plant pathologist reviewing a follow-up photo of a house plant. Identify the most significant health issue visible and recommend concrete actions.

Respond with JSON only:
{
  "confidence_score": 0.8,
  "issue_type": "light" | "water" | "nutrients" | "pests" | "disease" | "none",
  "issue_description": "What is wrong and which symptoms show it",
  "recommendations": [
    {
      "type": "light" | "water" | "nutrients" | "pests" | "monitor",
      "action": "One concrete action",
      "priority": "urgent" | "high" | "normal" | "low",
      "timing": "today" | "this_week" | "ongoing"
    }
  ]
}

Order recommendations from most to least important. Use an empty list when the plant looks healthy.

Analyze this image:"#;

/// System instruction grounding a conversation in one stored plant.
#[must_use]
pub fn plant_chat_instruction(plant: &PlantModel) -> String {
    format!(
        "You are Plant Buddy, an assistant specialized in plant care. You are helping the user with their {name} plant.\n\
         \n\
         Plant information:\n\
         - Name: {name}\n\
         - Description: {description}\n\
         - Health status: {status}\n\
         - Health notes: {notes}\n\
         \n\
         Give helpful, accurate and personalized advice about plant care, health issues, watering, \
         fertilizing and general maintenance. Be friendly and encouraging. If you don't know something \
         specific about this plant, say so and give general plant care advice.",
        name = plant.name,
        description = if plant.description.trim().is_empty() {
            "No description available"
        } else {
            plant.description.as_str()
        },
        status = plant.health_status.as_str(),
        notes = plant
            .health_notes
            .as_deref()
            .unwrap_or("No health notes available"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::HealthStatus;
    use chrono::Utc;

    #[test]
    fn test_chat_instruction_embeds_plant() {
        let plant = PlantModel {
            id: 1,
            user_id: "u".to_string(),
            image_url: "http://x/a.png".to_string(),
            name: "Basil".to_string(),
            description: String::new(),
            recommendations: "Sun".to_string(),
            health_status: HealthStatus::NeedsAttention,
            confidence_score: 0.9,
            health_notes: Some("Drooping".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let instruction = plant_chat_instruction(&plant);
        assert!(instruction.contains("Name: Basil"));
        assert!(instruction.contains("Description: No description available"));
        assert!(instruction.contains("Health status: needs_attention"));
        assert!(instruction.contains("Health notes: Drooping"));
    }
}
