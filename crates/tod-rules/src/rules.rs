//! Declarative rule set.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tod_core::ContentType;

/// Built-in rules, embedded at compile time.
const BUILTIN_RULES: &str = include_str!("../data/rules.toml");

/// Per-content-type rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRules {
    /// Inclusive lower word bound
    pub words_min: usize,
    /// Inclusive upper word bound
    pub words_max: usize,
    /// Closed set of allowed first words
    pub opening_words: Vec<String>,
}

/// The complete rule set used by the validator and the prompt builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Minimum characters after normalization
    #[serde(default = "default_chars_min")]
    pub chars_min: usize,
    /// Letters outside the Hebrew block tolerated after normalization
    #[serde(default)]
    pub foreign_chars_max: usize,
    /// Second-person tokens; at least one must appear
    pub address_tokens: Vec<String>,
    pub question: ContentRules,
    pub task: ContentRules,
}

fn default_chars_min() -> usize {
    5
}

impl RuleSet {
    /// The built-in rule set.
    pub fn builtin() -> Result<Self, RulesError> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    /// Parse and check a rule set from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, RulesError> {
        let rules: RuleSet = toml::from_str(content)?;
        rules.check()?;
        Ok(rules)
    }

    /// Load a rule set from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RulesError> {
        let content = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Rules for one content type.
    pub fn for_content(&self, content_type: ContentType) -> &ContentRules {
        match content_type {
            ContentType::Question => &self.question,
            ContentType::Task => &self.task,
        }
    }

    fn check(&self) -> Result<(), RulesError> {
        if self.address_tokens.iter().all(|t| t.trim().is_empty()) {
            return Err(RulesError::Invalid("address_tokens must not be empty".into()));
        }

        for content_type in ContentType::ALL {
            let rules = self.for_content(content_type);
            if rules.words_min == 0 || rules.words_min > rules.words_max {
                return Err(RulesError::Invalid(format!(
                    "{}: word range {}-{} is invalid",
                    content_type.name(),
                    rules.words_min,
                    rules.words_max
                )));
            }
            if rules.opening_words.iter().all(|w| w.trim().is_empty()) {
                return Err(RulesError::Invalid(format!(
                    "{}: opening_words must not be empty",
                    content_type.name()
                )));
            }
        }

        Ok(())
    }
}

/// Rule loading errors.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("Failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse rules: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid rules: {0}")]
    Invalid(String),
}
