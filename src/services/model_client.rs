//! Multimodal generative model client

use crate::error::{AppError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// One piece of a model request
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    InlineImage { mime_type: String, data: Vec<u8> },
}

/// Trait for generative model backends
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Send the ordered parts and return the response text
    async fn generate(&self, parts: &[ContentPart]) -> Result<String>;

    /// Model name for logs
    fn model_name(&self) -> &str;
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    Inline { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini `generateContent` REST client
pub struct GeminiClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `api_key` - Provider key; `None` is sent as-is and rejected by the provider
    /// * `base_url` - REST base (e.g., "https://generativelanguage.googleapis.com/v1beta")
    /// * `model` - Model name (e.g., "gemini-2.5-flash")
    /// * `timeout` - Optional request timeout; none by default
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        model: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Each part becomes its own user turn, text first
fn build_request(parts: &[ContentPart]) -> GenerateRequest {
    let contents = parts
        .iter()
        .map(|part| {
            let part = match part {
                ContentPart::Text(text) => RequestPart::Text { text: text.clone() },
                ContentPart::InlineImage { mime_type, data } => RequestPart::Inline {
                    inline_data: InlineData {
                        mime_type: mime_type.clone(),
                        data: general_purpose::STANDARD.encode(data),
                    },
                },
            };
            RequestContent {
                role: "user",
                parts: vec![part],
            }
        })
        .collect();

    GenerateRequest { contents }
}

/// Concatenate the text parts of the first candidate
fn extract_text(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Model(format!("Unreadable model response: {}", e)))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(AppError::Model("Model returned no text".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    #[instrument(skip(self, parts), fields(model = %self.model, parts = parts.len()))]
    async fn generate(&self, parts: &[ContentPart]) -> Result<String> {
        let request = build_request(parts);

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-goog-api-key", key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AppError::Model(format!(
                "Model API returned error status {}: {}",
                status, body
            )));
        }

        debug!("Model response: {} bytes", body.len());
        extract_text(&body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
