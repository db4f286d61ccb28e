//! Google Generative Language client.

use serde::{Deserialize, Serialize};

use super::status_error;
use crate::client::{GenerationProvider, GenerationRequest, ProviderError};

pub(super) const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub(super) const MODEL_DEFAULT: &str = "gemini-1.5-flash";

/// Gemini `generateContent` client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client. `base_url` has no trailing slash.
    pub fn new(http: reqwest::Client, api_key: String, model: String, base_url: String) -> Self {
        debug_assert!(!api_key.is_empty(), "API key must not be empty");

        Self {
            http,
            api_key,
            model,
            base_url,
        }
    }

    /// Full `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn body(request: &GenerationRequest) -> RequestBody<'_> {
        RequestBody {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.sampling.temperature,
                top_k: request.sampling.top_k,
                top_p: request.sampling.top_p,
                max_output_tokens: request.sampling.max_output_tokens,
                candidate_count: request.sampling.candidate_count,
            },
            safety_settings: request
                .safety
                .settings
                .iter()
                .map(|s| WireSafetySetting {
                    category: s.category.as_str(),
                    threshold: s.threshold.as_str(),
                })
                .collect(),
        }
    }

    /// Extract the first candidate's text from a response body.
    pub fn parse_response(body: &str) -> Result<String, ProviderError> {
        let response: ResponseBody =
            serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .map(str::trim)
            .unwrap_or("");

        if !text.is_empty() {
            return Ok(text.to_string());
        }

        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .or_else(|| response.candidates.first().and_then(|c| c.finish_reason.clone()))
            .unwrap_or_else(|| "no candidate text".to_string());
        Err(ProviderError::Malformed(reason))
    }
}

impl GenerationProvider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::body(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        Self::parse_response(&body)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestBody<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<WireSafetySetting>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
    candidate_count: u32,
}

#[derive(Serialize)]
struct WireSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
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

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}
