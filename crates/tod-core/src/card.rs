//! Card requests and emitted cards.

use serde::{Deserialize, Serialize};

use crate::validation::ValidationResult;

/// Default upper bound on category length, in characters.
pub const CATEGORY_CHARS_MAX_DEFAULT: usize = 40;

/// Category used when the caller sends a blank one.
pub const CATEGORY_DEFAULT: &str = "general";

/// Whether the card is a question (truth) or a task (dare).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Truth: the partner answers a question.
    Question,
    /// Dare: the partner performs an action.
    Task,
}

impl ContentType {
    /// All content types, in catalog order.
    pub const ALL: [ContentType; 2] = [ContentType::Question, ContentType::Task];

    /// Parse a canonical or localized name.
    ///
    /// Accepts `question`/`truth`/`שאלה` and `task`/`dare`/`משימה`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "question" | "truth" | "שאלה" => Some(ContentType::Question),
            "task" | "dare" | "משימה" => Some(ContentType::Task),
            _ => None,
        }
    }

    /// Canonical wire name.
    pub fn name(&self) -> &'static str {
        match self {
            ContentType::Question => "question",
            ContentType::Task => "task",
        }
    }

    /// Hebrew noun used in prompts.
    pub fn hebrew_name(&self) -> &'static str {
        match self {
            ContentType::Question => "שאלה",
            ContentType::Task => "משימה",
        }
    }
}

/// Escalating intimacy tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    /// Light getting-to-know-you content.
    Introductory,
    /// Romantic and sensual.
    Spicy,
    /// Bold and adventurous.
    BoldSexy,
}

impl DifficultyLevel {
    /// All levels, mildest first.
    pub const ALL: [DifficultyLevel; 3] = [
        DifficultyLevel::Introductory,
        DifficultyLevel::Spicy,
        DifficultyLevel::BoldSexy,
    ];

    /// Parse a canonical or localized name.
    ///
    /// Accepts `introductory`/`הכרות`, `spicy`/`ספייסי` and `bold_sexy`/`סקסי`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "introductory" | "הכרות" => Some(DifficultyLevel::Introductory),
            "spicy" | "ספייסי" => Some(DifficultyLevel::Spicy),
            "bold_sexy" | "סקסי" => Some(DifficultyLevel::BoldSexy),
            _ => None,
        }
    }

    /// Canonical wire name.
    pub fn name(&self) -> &'static str {
        match self {
            DifficultyLevel::Introductory => "introductory",
            DifficultyLevel::Spicy => "spicy",
            DifficultyLevel::BoldSexy => "bold_sexy",
        }
    }
}

/// A normalized card request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRequest {
    pub content_type: ContentType,
    pub difficulty_level: DifficultyLevel,
    /// Trimmed, length-capped free text.
    pub category: String,
}

impl CardRequest {
    /// Create a request, trimming and truncating the category.
    pub fn new(
        content_type: ContentType,
        difficulty_level: DifficultyLevel,
        category: &str,
        category_chars_max: usize,
    ) -> Self {
        debug_assert!(category_chars_max > 0, "Category limit must be positive");

        let trimmed = category.trim();
        let category = if trimmed.is_empty() {
            CATEGORY_DEFAULT.to_string()
        } else {
            let truncated: String = trimmed.chars().take(category_chars_max).collect();
            truncated.trim_end().to_string()
        };

        Self {
            content_type,
            difficulty_level,
            category,
        }
    }

    /// Normalize raw caller values into a request.
    pub fn parse(
        content_type: &str,
        difficulty_level: &str,
        category: &str,
        category_chars_max: usize,
    ) -> Result<Self, RequestError> {
        let parsed_type = ContentType::parse(content_type)
            .ok_or_else(|| RequestError::UnknownContentType(content_type.to_string()))?;
        let parsed_level = DifficultyLevel::parse(difficulty_level)
            .ok_or_else(|| RequestError::UnknownDifficulty(difficulty_level.to_string()))?;

        Ok(Self::new(parsed_type, parsed_level, category, category_chars_max))
    }
}

/// Request normalization errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Unsupported contentType: {0}")]
    UnknownContentType(String),

    #[error("Unsupported difficultyLevel: {0}")]
    UnknownDifficulty(String),
}

/// Where an emitted card came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardSource {
    /// Produced by the generation provider and accepted by the validator.
    Generated,
    /// Taken from the static catalog after generation gave up.
    Fallback,
    /// Taken from the static catalog after the pipeline itself failed.
    FallbackError,
}

impl CardSource {
    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            CardSource::Generated => "generated",
            CardSource::Fallback => "fallback",
            CardSource::FallbackError => "fallback-error",
        }
    }
}

/// A card ready to be returned to the caller.
#[derive(Debug, Clone)]
pub struct GeneratedCard {
    pub text: String,
    pub source: CardSource,
    /// Generation attempts made before this card was produced.
    pub attempts_count: u32,
    /// Present only for generated cards; fallback text is trusted as-is.
    pub validation: Option<ValidationResult>,
}

impl GeneratedCard {
    /// A validated card from the provider.
    pub fn generated(text: String, attempts_count: u32, validation: ValidationResult) -> Self {
        debug_assert!(!text.is_empty(), "Generated card must not be empty");
        debug_assert!(validation.is_valid, "Generated card must be valid");

        Self {
            text,
            source: CardSource::Generated,
            attempts_count,
            validation: Some(validation),
        }
    }

    /// A catalog card after generation was exhausted or rate limited.
    pub fn fallback(text: String, attempts_count: u32) -> Self {
        debug_assert!(!text.is_empty(), "Fallback card must not be empty");

        Self {
            text,
            source: CardSource::Fallback,
            attempts_count,
            validation: None,
        }
    }

    /// A catalog card after an internal failure.
    pub fn fallback_error(text: String) -> Self {
        debug_assert!(!text.is_empty(), "Fallback card must not be empty");

        Self {
            text,
            source: CardSource::FallbackError,
            attempts_count: 0,
            validation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_vocabularies() {
        assert_eq!(ContentType::parse("question"), Some(ContentType::Question));
        assert_eq!(ContentType::parse("truth"), Some(ContentType::Question));
        assert_eq!(ContentType::parse("שאלה"), Some(ContentType::Question));
        assert_eq!(ContentType::parse("Dare"), Some(ContentType::Task));
        assert_eq!(ContentType::parse(" משימה "), Some(ContentType::Task));
        assert_eq!(ContentType::parse("banana"), None);
    }

    #[test]
    fn test_difficulty_vocabularies() {
        assert_eq!(DifficultyLevel::parse("הכרות"), Some(DifficultyLevel::Introductory));
        assert_eq!(DifficultyLevel::parse("ספייסי"), Some(DifficultyLevel::Spicy));
        assert_eq!(DifficultyLevel::parse("סקסי"), Some(DifficultyLevel::BoldSexy));
        assert_eq!(DifficultyLevel::parse("bold_sexy"), Some(DifficultyLevel::BoldSexy));
        assert_eq!(DifficultyLevel::parse("extreme"), None);
    }

    #[test]
    fn test_category_truncated_by_chars() {
        let long = "א".repeat(60);
        let request = CardRequest::new(ContentType::Task, DifficultyLevel::Spicy, &long, 40);
        assert_eq!(request.category.chars().count(), 40);
    }

    #[test]
    fn test_blank_category_defaults() {
        let request = CardRequest::new(ContentType::Task, DifficultyLevel::Spicy, "   ", 40);
        assert_eq!(request.category, CATEGORY_DEFAULT);
    }

    #[test]
    fn test_parse_reports_unknown_values() {
        let err = CardRequest::parse("truth", "wild", "general", 40).unwrap_err();
        assert_eq!(err, RequestError::UnknownDifficulty("wild".to_string()));

        let ok = CardRequest::parse("dare", "הכרות", "general", 40).unwrap();
        assert_eq!(ok.content_type, ContentType::Task);
        assert_eq!(ok.difficulty_level, DifficultyLevel::Introductory);
    }

    #[test]
    fn test_source_wire_names() {
        assert_eq!(CardSource::Generated.name(), "generated");
        assert_eq!(CardSource::Fallback.name(), "fallback");
        assert_eq!(CardSource::FallbackError.name(), "fallback-error");
    }
}
