//! Houseplant suggestions for onboarding.

use crate::{
    errors::{Error, Result},
    gateway::{AiGateway, parse::strip_code_fences},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Most suggestions returned.
pub const MAX_SUGGESTIONS: usize = 3;

/// How much plant care the user has done before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    /// Struggles to keep plants alive
    Beginner,
    /// Comfortable with the basics
    Some,
    /// Handles demanding plants
    Expert,
}

impl FromStr for ExperienceLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "some" | "intermediate" => Ok(Self::Some),
            "expert" => Ok(Self::Expert),
            other => Err(Error::validation(format!(
                "Unknown experience level '{other}'. Use beginner, some, or expert."
            ))),
        }
    }
}

/// Growing conditions and skill used to pick suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantPreferences {
    /// Light conditions (e.g. "bright", "low")
    pub light: String,
    /// Available space (e.g. "small")
    pub space: String,
    /// Gardening experience
    pub experience: ExperienceLevel,
    /// Air humidity (e.g. "dry", "humid")
    pub humidity: String,
    /// Room temperature (e.g. "cool", "warm")
    pub temperature: String,
}

/// One suggested plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantSuggestion {
    /// Common name
    pub name: String,
    /// Botanical name
    #[serde(default, alias = "latinName")]
    pub latin_name: String,
    /// Why it fits the user
    #[serde(default, alias = "keyReason")]
    pub key_reason: String,
    /// The most important care rule
    #[serde(default, alias = "careTip")]
    pub care_tip: String,
}

/// Built-in suggestions used when the model output cannot be read.
#[must_use]
pub fn default_suggestions() -> Vec<PlantSuggestion> {
    [
        (
            "Snake Plant",
            "Sansevieria trifasciata",
            "Extremely resilient and tolerates neglect and a wide range of light.",
            "Water only when the soil is completely dry.",
        ),
        (
            "Pothos",
            "Epipremnum aureum",
            "Fast growing and forgiving, and it shows clearly when it needs water.",
            "Water when the leaves start to droop slightly.",
        ),
        (
            "ZZ Plant",
            "Zamioculcas zamiifolia",
            "Thrives on neglect and handles low light well.",
            "Water every two to three weeks and let the soil dry out.",
        ),
    ]
    .into_iter()
    .map(|(name, latin_name, key_reason, care_tip)| PlantSuggestion {
        name: name.to_string(),
        latin_name: latin_name.to_string(),
        key_reason: key_reason.to_string(),
        care_tip: care_tip.to_string(),
    })
    .collect()
}

/// Reads suggestions from model output. Returns `None` when no usable entry is found.
#[must_use]
pub fn parse_suggestions(text: &str) -> Option<Vec<PlantSuggestion>> {
    let body = strip_code_fences(text);
    let start = body.find('[')?;
    let end = body.rfind(']')?;
    if end < start {
        return None;
    }

    let parsed: Vec<PlantSuggestion> = serde_json::from_str(&body[start..=end]).ok()?;
    let suggestions: Vec<PlantSuggestion> = parsed
        .into_iter()
        .filter(|s| !s.name.trim().is_empty())
        .map(|mut s| {
            if s.care_tip.trim().is_empty() {
                s.care_tip.clone_from(&s.key_reason);
            }
            s
        })
        .take(MAX_SUGGESTIONS)
        .collect();

    (!suggestions.is_empty()).then_some(suggestions)
}

/// Asks for three houseplant suggestions as a JSON array.
#[must_use]
pub fn suggestion_prompt(preferences: &PlantPreferences) -> String {
    let (persona, reason_label, focus_label) = match preferences.experience {
        ExperienceLevel::Beginner => (
            "The suggestions must be easy to care for and thrive in the environment below.\n\
             Skill level: absolute beginner who struggles to keep plants alive.\n\
             Maintenance need: very simple and forgiving plants.",
            "why it suits a beginner in these conditions",
            "the single most important care rule",
        ),
        ExperienceLevel::Some => (
            "The suggestions must suit an intermediate gardener ready to move beyond basic survival.\n\
             Skill level: has mastered consistent watering, still learning pruning and humidity control.\n\
             Maintenance need: consistent, non-daily attention.",
            "why it is a good next step in these conditions",
            "the care aspect they need to master",
        ),
        ExperienceLevel::Expert => (
            "The suggestions must be demanding plants for an expert gardener.\n\
             Skill level: mastery of precise watering, humidity and nutrient control.\n\
             Maintenance need: specific, high-maintenance care.",
            "why it rewards an expert in these conditions",
            "the difficult care requirement",
        ),
    };

    format!(
        "Generate three houseplant suggestions for the following user.\n\
         {persona}\n\
         Light conditions: {light}.\n\
         Temperature: {temperature}.\n\
         Space size: {space}.\n\
         Humidity: {humidity}.\n\
         \n\
         Return exactly 3 recommendations as a JSON array:\n\
         [\n  {{\n    \"name\": \"Plant name\",\n    \"latinName\": \"Latin name\",\n    \
         \"keyReason\": \"Short reason: {reason_label}\",\n    \"careTip\": \"Tip: {focus_label}\"\n  }}\n]\n\
         \n\
         Return valid JSON only, no additional text or markdown formatting.",
        light = preferences.light.to_lowercase(),
        temperature = preferences.temperature.to_lowercase(),
        space = preferences.space.to_lowercase(),
        humidity = preferences.humidity.to_lowercase(),
    )
}

/// Asks the model for three suggestions matching `preferences`.
///
/// Unreadable output falls back to [`default_suggestions`]; a failed model call is
/// returned as an error.
pub async fn suggest_plants(
    gateway: &dyn AiGateway,
    preferences: &PlantPreferences,
) -> Result<Vec<PlantSuggestion>> {
    let reply = gateway
        .chat(None, &[], &suggestion_prompt(preferences))
        .await?;

    Ok(parse_suggestions(&reply).unwrap_or_else(|| {
        warn!("Could not parse plant suggestions, using defaults");
        default_suggestions()
    }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::FakeGateway;

    fn preferences() -> PlantPreferences {
        PlantPreferences {
            light: "Bright".to_string(),
            space: "Small".to_string(),
            experience: ExperienceLevel::Beginner,
            humidity: "Dry".to_string(),
            temperature: "Warm".to_string(),
        }
    }

    #[test]
    fn test_experience_level() {
        assert_eq!("Beginner".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Beginner);
        assert_eq!(" some ".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Some);
        assert_eq!("EXPERT".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Expert);
        assert!(matches!(
            "guru".parse::<ExperienceLevel>(),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_suggestion_prompt_uses_preferences() {
        let prompt = suggestion_prompt(&PlantPreferences {
            light: "Bright".to_string(),
            space: "Small".to_string(),
            experience: ExperienceLevel::Expert,
            humidity: "High".to_string(),
            temperature: "Warm".to_string(),
        });
        assert!(prompt.contains("Light conditions: bright."));
        assert!(prompt.contains("expert gardener"));
        assert!(prompt.contains("\"latinName\""));
    }

    #[test]
    fn test_parse_suggestions() {
        let text = r#"```json
        [
          {"name": "Aloe", "latinName": "Aloe vera", "keyReason": "Loves sun", "careTip": "Water rarely"},
          {"name": "Jade", "latinName": "Crassula ovata", "keyReason": "Hardy"},
          {"name": "", "latinName": "Nothing"},
          {"name": "Haworthia", "latinName": "Haworthia", "keyReason": "Small", "careTip": "Bright light"},
          {"name": "Fourth", "latinName": "Extra", "keyReason": "Too many", "careTip": "-"}
        ]
        ```"#;

        let suggestions = parse_suggestions(text).unwrap();
        let names: Vec<_> = suggestions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Aloe", "Jade", "Haworthia"]);
        assert_eq!(suggestions[1].care_tip, "Hardy");
    }

    #[test]
    fn test_parse_suggestions_with_surrounding_text() {
        let text = r#"Here you go: [{"name": "Pothos"}] Enjoy!"#;
        assert_eq!(parse_suggestions(text).unwrap()[0].name, "Pothos");

        assert!(parse_suggestions("Snake Plant (Sansevieria):").is_none());
        assert!(parse_suggestions("[]").is_none());
    }

    #[tokio::test]
    async fn test_suggest_plants() -> Result<()> {
        let gateway = FakeGateway::new();
        gateway.push_reply(Ok(r#"[{"name": "Aloe", "latinName": "Aloe vera"}]"#.to_string()));

        let suggestions = suggest_plants(&gateway, &preferences()).await?;
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].latin_name, "Aloe vera");

        let calls = gateway.chat_calls();
        assert_eq!(calls[0].system, None);
        assert!(calls[0].message.contains("Light conditions: bright."));
        Ok(())
    }

    #[tokio::test]
    async fn test_suggest_plants_falls_back() -> Result<()> {
        let gateway = FakeGateway::new();
        gateway.push_reply(Ok("I recommend a snake plant.".to_string()));

        let suggestions = suggest_plants(&gateway, &preferences()).await?;
        assert_eq!(suggestions, default_suggestions());
        assert_eq!(suggestions.len(), 3);

        gateway.push_reply(Err(Error::gateway("down")));
        assert!(matches!(
            suggest_plants(&gateway, &preferences()).await,
            Err(Error::Gateway { .. })
        ));
        Ok(())
    }
}
