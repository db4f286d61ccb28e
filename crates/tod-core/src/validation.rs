//! Validation results.
//!
//! A text is accepted only when no rule is violated. The score is kept for
//! diagnostics and never drives acceptance.

use serde::{Deserialize, Serialize};

/// A formatting rule a card text must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Nothing left after normalization
    Empty,
    /// Fewer characters than the minimum
    TooShort,
    /// Word count outside the inclusive range
    WordCount,
    /// First word not in the opening set for the content type
    OpeningWord,
    /// No second-person address token
    Address,
    /// Too many letters outside the Hebrew block
    ForeignCharacters,
    /// Already emitted before
    Duplicate,
}

impl Rule {
    /// Stable identifier reported to callers.
    pub fn id(&self) -> &'static str {
        match self {
            Rule::Empty => "empty",
            Rule::TooShort => "too_short",
            Rule::WordCount => "word_count",
            Rule::OpeningWord => "opening_word",
            Rule::Address => "address",
            Rule::ForeignCharacters => "foreign_characters",
            Rule::Duplicate => "duplicate",
        }
    }
}

/// A single violated rule with a human-readable message.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub rule: Rule,
    pub message: String,
}

impl Violation {
    /// Create a new violation.
    pub fn new(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }

    /// Format for display.
    pub fn format(&self) -> String {
        format!("[{}] {}", self.rule.id(), self.message)
    }
}

/// Outcome of validating one text.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Violations in rule-check order.
    pub violations: Vec<Violation>,
    /// Fraction of checked rules that passed, in `[0, 1]`.
    pub score: Option<f64>,
}

impl ValidationResult {
    /// Build from the violations found after checking `rules_checked_count` rules.
    pub fn from_violations(violations: Vec<Violation>, rules_checked_count: u32) -> Self {
        debug_assert!(
            violations.len() as u32 <= rules_checked_count.max(1),
            "More violations than rules checked"
        );

        let score = if rules_checked_count == 0 {
            None
        } else {
            let passed = rules_checked_count.saturating_sub(violations.len() as u32);
            Some(f64::from(passed) / f64::from(rules_checked_count))
        };

        Self {
            is_valid: violations.is_empty(),
            violations,
            score,
        }
    }

    /// Whether the given rule was violated.
    pub fn violates(&self, rule: Rule) -> bool {
        self.violations.iter().any(|v| v.rule == rule)
    }

    /// Rule identifiers, in order.
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.rule.id()).collect()
    }

    /// Format as report.
    pub fn format_report(&self) -> String {
        if self.is_valid {
            return "valid".to_string();
        }

        self.violations
            .iter()
            .map(Violation::format)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
