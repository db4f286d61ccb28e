//! Anthropic Messages API client.

use serde::{Deserialize, Serialize};

use super::status_error;
use crate::client::{GenerationProvider, GenerationRequest, ProviderError};

pub(super) const BASE_URL: &str = "https://api.anthropic.com/v1";
pub(super) const MODEL_DEFAULT: &str = "claude-3-5-sonnet-20241022";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Hebrew needs more tokens per word than the Gemini budget allows.
const TOKENS_MAX: u32 = 150;

/// Claude Messages client. Safety settings are not sent.
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ClaudeClient {
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

    pub fn endpoint(&self) -> String {
        format!("{}/messages", self.base_url)
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> RequestBody<'a> {
        RequestBody {
            model: &self.model,
            max_tokens: TOKENS_MAX,
            temperature: request.sampling.temperature,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        }
    }

    /// Extract the first text block from a response body.
    pub fn parse_response(body: &str) -> Result<String, ProviderError> {
        let response: ResponseBody =
            serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

        response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::Malformed("no text block".to_string()))
    }
}

impl GenerationProvider for ClaudeClient {
    fn name(&self) -> &'static str {
        "claude"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.body(request))
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
struct RequestBody<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tod_core::DifficultyLevel;

    fn client() -> ClaudeClient {
        ClaudeClient::new(
            reqwest::Client::new(),
            "key".into(),
            MODEL_DEFAULT.into(),
            BASE_URL.into(),
        )
    }

    #[test]
    fn test_request_body_shape() {
        let client = client();
        let request = GenerationRequest::new("שלום".into(), 1, DifficultyLevel::Spicy);
        let value = serde_json::to_value(client.body(&request)).unwrap();

        assert_eq!(value["model"], "claude-3-5-sonnet-20241022");
        assert_eq!(value["max_tokens"], 150);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "שלום");
        assert!(value.get("safetySettings").is_none());
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(client().endpoint(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn test_parse_text_block() {
        let body = r#"{"content":[{"type":"text","text":"תן לי חיבוק"}],"stop_reason":"end_turn"}"#;
        assert_eq!(ClaudeClient::parse_response(body).unwrap(), "תן לי חיבוק");
    }

    #[test]
    fn test_parse_no_text() {
        assert!(matches!(
            ClaudeClient::parse_response(r#"{"content":[]}"#),
            Err(ProviderError::Malformed(_))
        ));
        assert!(matches!(
            ClaudeClient::parse_response(r#"{"error":{"type":"overloaded_error"}}"#),
            Err(ProviderError::Malformed(_))
        ));
    }
}
