//! Gemini REST implementation of [`AiGateway`].

use super::parse::{parse_classification, parse_diagnosis};
use super::prompts::{CLASSIFY_PROMPT, DIAGNOSE_PROMPT};
use super::{AiGateway, ChatTurn, Classification, Diagnosis, prepare_embedding_input};
use crate::config::settings::GatewaySettings;
use crate::core::image::ImageUpload;
use crate::entities::ChatRole;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Calls the Gemini `generateContent` and `embedContent` endpoints.
pub struct GeminiGateway {
    client: reqwest::Client,
    settings: GatewaySettings,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Embedding,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn image(image: &ImageUpload) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.content_type.to_ascii_lowercase(),
                data: BASE64.encode(&image.bytes),
            }),
        }
    }
}

impl GenerateResponse {
    fn into_text(self) -> Result<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::gateway("Model returned an empty response"));
        }
        Ok(text)
    }
}

const fn wire_role(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Assistant => "model",
    }
}

impl GeminiGateway {
    /// Builds the HTTP client. Fails when no API key is configured.
    pub fn new(settings: GatewaySettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config {
                message: "No model API key configured. Set GOOGLE_API_KEY or gateway.api_key."
                    .to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            settings,
            api_key,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{model}:{method}",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    async fn post<B: Serialize + Sync, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(%status, "Model request failed");
            debug!(detail, "Model error body");
            return Err(Error::gateway(format!("Model request failed with status {status}")));
        }

        Ok(response.json().await?)
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let url = self.endpoint(&self.settings.model, "generateContent");
        let response: GenerateResponse = self.post(&url, &request).await?;
        response.into_text()
    }

    fn image_request(&self, prompt: &str, image: &ImageUpload) -> GenerateRequest {
        GenerateRequest {
            system_instruction: None,
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part::text(prompt), Part::image(image)],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.analysis_temperature,
                max_output_tokens: self.settings.analysis_max_tokens,
                response_mime_type: Some("application/json"),
            },
        }
    }
}

#[async_trait]
impl AiGateway for GeminiGateway {
    async fn classify(&self, image: &ImageUpload) -> Result<Classification> {
        let text = self
            .generate(self.image_request(CLASSIFY_PROMPT, image))
            .await?;
        parse_classification(&text)
    }

    async fn diagnose(&self, image: &ImageUpload) -> Result<Diagnosis> {
        let text = self
            .generate(self.image_request(DIAGNOSE_PROMPT, image))
            .await?;
        parse_diagnosis(&text)
    }

    async fn chat(
        &self,
        system: Option<&str>,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String> {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content {
                role: Some(wire_role(turn.role)),
                parts: vec![Part::text(turn.content.clone())],
            })
            .collect();
        contents.push(Content {
            role: Some("user"),
            parts: vec![Part::text(message)],
        });

        let request = GenerateRequest {
            system_instruction: system.map(|s| Content {
                role: None,
                parts: vec![Part::text(s)],
            }),
            contents,
            generation_config: GenerationConfig {
                temperature: self.settings.chat_temperature,
                max_output_tokens: self.settings.chat_max_tokens,
                response_mime_type: None,
            },
        };

        self.generate(request).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = prepare_embedding_input(text)?;
        let url = self.endpoint(&self.settings.embedding_model, "embedContent");
        let request = EmbedRequest {
            content: Content {
                role: None,
                parts: vec![Part::text(input)],
            },
        };

        let response: EmbedResponse = self.post(&url, &request).await?;
        Ok(response.embedding.values)
    }
}
