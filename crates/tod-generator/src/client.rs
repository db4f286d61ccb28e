//! Provider-neutral generation client types.
//!
//! A [`GenerationRequest`] carries the prompt plus sampling and safety
//! settings. Each concrete provider maps it onto its own wire format.

use std::future::Future;

use tod_core::DifficultyLevel;

/// Sampling parameters for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub candidate_count: u32,
    pub max_output_tokens: u32,
}

impl SamplingConfig {
    /// Sampling for the given attempt: first attempt 0.7, later 0.9.
    #[must_use]
    pub fn for_attempt(attempt: u32) -> Self {
        debug_assert!(attempt >= 1, "Attempts are 1-indexed");

        Self {
            temperature: if attempt <= 1 { 0.7 } else { 0.9 },
            top_k: 40,
            top_p: 0.95,
            candidate_count: 1,
            max_output_tokens: 100,
        }
    }
}

/// Harm categories understood by the Gemini API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarmCategory {
    Harassment,
    HateSpeech,
    SexuallyExplicit,
    DangerousContent,
}

impl HarmCategory {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HarmCategory::Harassment => "HARM_CATEGORY_HARASSMENT",
            HarmCategory::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            HarmCategory::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            HarmCategory::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        }
    }
}

/// Blocking thresholds, strictest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlockThreshold {
    LowAndAbove,
    MediumAndAbove,
    OnlyHigh,
}

impl BlockThreshold {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockThreshold::LowAndAbove => "BLOCK_LOW_AND_ABOVE",
            BlockThreshold::MediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            BlockThreshold::OnlyHigh => "BLOCK_ONLY_HIGH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: BlockThreshold,
}

/// Safety thresholds for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyConfig {
    pub settings: Vec<SafetySetting>,
}

impl SafetyConfig {
    /// Thresholds for a difficulty level.
    ///
    /// Sexual content is filtered strictly for introductory cards and relaxed
    /// as the level rises. Other categories stay at medium.
    #[must_use]
    pub fn for_difficulty(level: DifficultyLevel) -> Self {
        let sexual = match level {
            DifficultyLevel::Introductory => BlockThreshold::LowAndAbove,
            DifficultyLevel::Spicy => BlockThreshold::MediumAndAbove,
            DifficultyLevel::BoldSexy => BlockThreshold::OnlyHigh,
        };

        let setting = |category, threshold| SafetySetting {
            category,
            threshold,
        };

        Self {
            settings: vec![
                setting(HarmCategory::SexuallyExplicit, sexual),
                setting(HarmCategory::Harassment, BlockThreshold::MediumAndAbove),
                setting(HarmCategory::HateSpeech, BlockThreshold::MediumAndAbove),
                setting(HarmCategory::DangerousContent, BlockThreshold::MediumAndAbove),
            ],
        }
    }

    /// Threshold for a category, if one is set.
    pub fn threshold(&self, category: HarmCategory) -> Option<BlockThreshold> {
        self.settings
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.threshold)
    }
}

/// One call to a generation provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub sampling: SamplingConfig,
    pub safety: SafetyConfig,
}

impl GenerationRequest {
    /// Create a request with the settings for `attempt` and `level`.
    pub fn new(prompt: String, attempt: u32, level: DifficultyLevel) -> Self {
        Self {
            prompt,
            sampling: SamplingConfig::for_attempt(attempt),
            safety: SafetyConfig::for_difficulty(level),
        }
    }
}

/// Provider errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),
}

impl ProviderError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Status { .. } | ProviderError::Malformed(_) | ProviderError::Transport(_)
        )
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 {
            ProviderError::RateLimited
        } else {
            ProviderError::Status { status, body }
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::from_status(status.as_u16(), err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// A remote (or simulated) text generator.
pub trait GenerationProvider: Send + Sync {
    /// Short provider name for logs and health checks.
    fn name(&self) -> &'static str;

    /// Generate raw text for one request.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_per_attempt() {
        let first = SamplingConfig::for_attempt(1);
        let second = SamplingConfig::for_attempt(2);

        assert_eq!(first.temperature, 0.7);
        assert_eq!(second.temperature, 0.9);
        assert_eq!(SamplingConfig::for_attempt(3).temperature, 0.9);
        assert_eq!(first.top_k, 40);
        assert_eq!(first.top_p, 0.95);
        assert_eq!(first.candidate_count, 1);
        assert_eq!(first.max_output_tokens, 100);
    }

    #[test]
    fn test_safety_relaxes_with_level() {
        let threshold = |level| {
            SafetyConfig::for_difficulty(level)
                .threshold(HarmCategory::SexuallyExplicit)
                .unwrap()
        };

        assert_eq!(threshold(DifficultyLevel::Introductory), BlockThreshold::LowAndAbove);
        assert_eq!(threshold(DifficultyLevel::Spicy), BlockThreshold::MediumAndAbove);
        assert_eq!(threshold(DifficultyLevel::BoldSexy), BlockThreshold::OnlyHigh);
        assert!(threshold(DifficultyLevel::Introductory) < threshold(DifficultyLevel::BoldSexy));
    }

    #[test]
    fn test_other_categories_stay_medium() {
        for level in DifficultyLevel::ALL {
            let safety = SafetyConfig::for_difficulty(level);
            for category in [
                HarmCategory::Harassment,
                HarmCategory::HateSpeech,
                HarmCategory::DangerousContent,
            ] {
                assert_eq!(safety.threshold(category), Some(BlockThreshold::MediumAndAbove));
            }
        }
    }

    #[test]
    fn test_retry_classification() {
        assert!(!ProviderError::RateLimited.is_retryable());
        assert!(!ProviderError::MissingApiKey("GEMINI_API_KEY").is_retryable());
        assert!(ProviderError::Malformed("no candidates".into()).is_retryable());
        assert!(ProviderError::Transport("refused".into()).is_retryable());
        assert!(ProviderError::from_status(503, String::new()).is_retryable());
        assert_eq!(ProviderError::from_status(429, String::new()), ProviderError::RateLimited);
    }
}
