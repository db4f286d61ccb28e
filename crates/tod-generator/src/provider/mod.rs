//! Concrete generation providers.
//!
//! | Provider | API | Auth |
//! |----------|-----|------|
//! | [`GeminiClient`] | Google Generative Language `generateContent` | `x-goog-api-key` |
//! | [`ClaudeClient`] | Anthropic Messages | `x-api-key` |
//! | [`SimProvider`] | Scripted, for deterministic tests | none |

mod claude;
mod gemini;
mod sim;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;
pub use sim::{SimProvider, SimReply};

use crate::client::{GenerationProvider, GenerationRequest, ProviderError};

/// Default per-request timeout.
pub const TIMEOUT_DEFAULT: Duration = Duration::from_secs(15);

/// Characters of an error body kept for logs.
const ERROR_BODY_CHARS_MAX: usize = 300;

/// Which remote provider to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    Claude,
}

impl ProviderKind {
    /// Parse a provider name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "gemini" => Some(ProviderKind::Gemini),
            "claude" | "anthropic" => Some(ProviderKind::Claude),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Claude => "claude",
        }
    }

    /// Display name.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Claude => "Claude",
        }
    }

    /// Environment variable holding the credential.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Claude => "CLAUDE_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => gemini::MODEL_DEFAULT,
            ProviderKind::Claude => claude::MODEL_DEFAULT,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => gemini::BASE_URL,
            ProviderKind::Claude => claude::BASE_URL,
        }
    }
}

/// Settings needed to build a [`Provider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Model name; the kind's default when `None`
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// API root; the kind's default when `None`
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl ProviderSettings {
    /// Settings with defaults and no credential.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            model: None,
            api_key: None,
            base_url: None,
            timeout: TIMEOUT_DEFAULT,
        }
    }

    /// Settings with the credential read from the kind's environment variable.
    pub fn from_env(kind: ProviderKind) -> Self {
        Self {
            api_key: std::env::var(kind.api_key_env()).ok(),
            ..Self::new(kind)
        }
    }

    /// Whether a non-blank credential is present.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    fn api_key(&self) -> Result<String, ProviderError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(ProviderError::MissingApiKey(self.kind.api_key_env())),
        }
    }

    fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.kind.default_model().to_string())
    }

    fn base_url(&self) -> String {
        let url = self.base_url.as_deref().unwrap_or(self.kind.default_base_url());
        url.trim_end_matches('/').to_string()
    }

    fn http_client(&self) -> Result<reqwest::Client, ProviderError> {
        debug_assert!(!self.timeout.is_zero(), "Timeout must be positive");

        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))
    }
}

/// A configured remote provider.
pub enum Provider {
    Gemini(GeminiClient),
    Claude(ClaudeClient),
}

impl Provider {
    /// Build the provider named by the settings.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let http = settings.http_client()?;
        let api_key = settings.api_key()?;

        Ok(match settings.kind {
            ProviderKind::Gemini => Provider::Gemini(GeminiClient::new(
                http,
                api_key,
                settings.model(),
                settings.base_url(),
            )),
            ProviderKind::Claude => Provider::Claude(ClaudeClient::new(
                http,
                api_key,
                settings.model(),
                settings.base_url(),
            )),
        })
    }
}

impl GenerationProvider for Provider {
    fn name(&self) -> &'static str {
        match self {
            Provider::Gemini(client) => client.name(),
            Provider::Claude(client) => client.name(),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        match self {
            Provider::Gemini(client) => client.generate(request).await,
            Provider::Claude(client) => client.generate(request).await,
        }
    }
}

/// Turn a non-success response into an error, keeping a bounded body excerpt.
fn status_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let excerpt: String = body.chars().take(ERROR_BODY_CHARS_MAX).collect();
    ProviderError::from_status(status.as_u16(), excerpt)
}
