//! Gemini text-generation client

use std::sync::Arc;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{TextGenerator, build_http_client, ensure_success};
use crate::cache::MemoCache;
use crate::config::TextGenerationConfig;
use crate::models::GeneratedText;
use crate::{CampfinderError, Result};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const MISSING_KEY_TEXT: &str =
    "AI Recommendation is unavailable because GEMINI_API_KEY is missing.";
pub const ERROR_TEXT: &str = "AI recommendation service encountered an error.";

pub struct GeminiClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_output_tokens: u32,
    cache: Arc<MemoCache<GeneratedText>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
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

impl GenerateContentResponse {
    /// Text of the first candidate, parts joined in order
    fn into_text(self) -> Result<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(CampfinderError::api("Gemini returned no candidate text"));
        }
        Ok(text.to_string())
    }
}

impl GeminiClient {
    /// Create a new client sharing the given memo cache
    pub fn new(config: &TextGenerationConfig, cache: Arc<MemoCache<GeneratedText>>) -> Result<Self> {
        Ok(Self {
            client: build_http_client(&config.service)?,
            api_key: config.service.api_key().map(str::to_string),
            base_url: config.service.base_url_or(DEFAULT_BASE_URL),
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
            cache,
        })
    }

    async fn request(&self, api_key: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(api_key)
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let response = ensure_success("Gemini", response).await?;
        let parsed: GenerateContentResponse = response.json().await?;
        parsed.into_text()
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(name = "generate_text", skip_all, fields(prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> GeneratedText {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("Gemini API key is not configured");
            return GeneratedText::fallback(MISSING_KEY_TEXT);
        };

        if let Some(cached) = self.cache.get(prompt) {
            return cached;
        }

        match self.request(api_key, prompt).await {
            Ok(text) => {
                info!("Generated {} characters with {}", text.len(), self.model);
                let generated = GeneratedText::generated(text);
                self.cache.put(prompt, generated.clone());
                generated
            }
            Err(e) => {
                warn!("Text generation failed: {}", e);
                GeneratedText::fallback(ERROR_TEXT)
            }
        }
    }
}
