//! Content validator.
//!
//! Runs every rule in order and collects all violations. Only the empty-text
//! case short-circuits, because nothing else can be measured on it.

use tod_core::{ContentType, DedupStore, Rule, ValidationResult, Violation};

use crate::normalize::{foreign_letters_count, matches_token, normalize, trim_word, words};
use crate::rules::{RuleSet, RulesError};

/// A normalized text together with its verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    /// Normalized text; this is what gets emitted when valid.
    pub text: String,
    pub result: ValidationResult,
}

/// Validates generated card text against a [`RuleSet`].
#[derive(Debug, Clone)]
pub struct ContentValidator {
    rules: RuleSet,
}

impl ContentValidator {
    /// Create a validator for the given rules.
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Create a validator with the built-in rules.
    pub fn builtin() -> Result<Self, RulesError> {
        Ok(Self::new(RuleSet::builtin()?))
    }

    /// The active rules.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Normalize raw provider output and validate it.
    pub fn validate(
        &self,
        raw: &str,
        content_type: ContentType,
        dedup: Option<&dyn DedupStore>,
    ) -> Validated {
        let text = normalize(raw);
        let result = self.check(&text, content_type, dedup);
        Validated { text, result }
    }

    /// Validate an already-normalized text.
    pub fn check(
        &self,
        text: &str,
        content_type: ContentType,
        dedup: Option<&dyn DedupStore>,
    ) -> ValidationResult {
        let mut violations = Vec::new();
        let mut rules_checked_count: u32 = 1;

        if text.is_empty() {
            violations.push(Violation::new(Rule::Empty, "No text after normalization"));
            return ValidationResult::from_violations(violations, rules_checked_count);
        }

        let chars_count = text.chars().count();
        if chars_count < self.rules.chars_min {
            violations.push(Violation::new(
                Rule::TooShort,
                format!("{} characters, need at least {}", chars_count, self.rules.chars_min),
            ));
        }

        let content_rules = self.rules.for_content(content_type);
        let text_words = words(text);

        rules_checked_count += 1;
        let words_count = text_words.len();
        if words_count < content_rules.words_min || words_count > content_rules.words_max {
            violations.push(Violation::new(
                Rule::WordCount,
                format!(
                    "{} words, expected {}-{}",
                    words_count, content_rules.words_min, content_rules.words_max
                ),
            ));
        }

        rules_checked_count += 1;
        let first_word = text_words.first().map(|w| trim_word(w)).unwrap_or("");
        if !content_rules.opening_words.iter().any(|w| w == first_word) {
            violations.push(Violation::new(
                Rule::OpeningWord,
                format!(
                    "{} must open with one of: {}",
                    content_type.name(),
                    content_rules.opening_words.join(", ")
                ),
            ));
        }

        rules_checked_count += 1;
        let addressed = text_words.iter().any(|word| {
            self.rules
                .address_tokens
                .iter()
                .any(|token| matches_token(word, token))
        });
        if !addressed {
            violations.push(Violation::new(
                Rule::Address,
                format!(
                    "Missing second-person address: {}",
                    self.rules.address_tokens.join("/")
                ),
            ));
        }

        rules_checked_count += 1;
        let foreign_count = foreign_letters_count(text);
        if foreign_count > self.rules.foreign_chars_max {
            violations.push(Violation::new(
                Rule::ForeignCharacters,
                format!(
                    "{} foreign letters, at most {} allowed",
                    foreign_count, self.rules.foreign_chars_max
                ),
            ));
        }

        if let Some(store) = dedup {
            rules_checked_count += 1;
            if store.contains(text) {
                violations.push(Violation::new(Rule::Duplicate, "Already emitted"));
            }
        }

        ValidationResult::from_violations(violations, rules_checked_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tod_core::MemoryDedupStore;

    const GOOD_QUESTION: &str = "מה הדבר הכי מפתיע שאתה אוהב לעשות יחד איתי בסוף השבוע?";
    const GOOD_TASK: &str = "תן לבן הזוג שלך חיבוק ארוך ואמור לו מה אתה הכי אוהב";

    fn validator() -> ContentValidator {
        ContentValidator::builtin().unwrap()
    }

    #[test]
    fn test_accepts_good_question() {
        let validated = validator().validate(GOOD_QUESTION, ContentType::Question, None);
        assert!(validated.result.is_valid, "{}", validated.result.format_report());
        assert_eq!(validated.text, GOOD_QUESTION);
        assert_eq!(validated.result.score, Some(1.0));
    }

    #[test]
    fn test_accepts_good_task_with_wrapping() {
        let raw = format!("1. \"{}\" 💋", GOOD_TASK);
        let validated = validator().validate(&raw, ContentType::Task, None);
        assert!(validated.result.is_valid, "{}", validated.result.format_report());
        assert_eq!(validated.text, GOOD_TASK);
    }

    #[test]
    fn test_twenty_words_violates_word_count() {
        let raw = format!("מה אתה {}", "מילה ".repeat(18));
        let validated = validator().validate(&raw, ContentType::Question, None);

        assert!(!validated.result.is_valid);
        assert!(validated.result.violates(Rule::WordCount));
        assert!(!validated.result.violates(Rule::OpeningWord));
        assert!(!validated.result.violates(Rule::Address));
    }

    #[test]
    fn test_wrong_opening_class() {
        // A valid question is not a valid task.
        let validated = validator().validate(GOOD_QUESTION, ContentType::Task, None);
        assert_eq!(validated.result.rule_ids(), vec!["opening_word"]);
    }

    #[test]
    fn test_missing_address() {
        let text = "מה הדבר הכי מפתיע שקרה בחופשה הראשונה של הזוג הזה?";
        let validated = validator().validate(text, ContentType::Question, None);
        assert!(validated.result.violates(Rule::Address));
    }

    #[test]
    fn test_foreign_letters_rejected() {
        let text = "מה אתה הכי אוהב ב-weekend שלנו יחד בבית בערב?";
        let validated = validator().validate(text, ContentType::Question, None);
        assert!(validated.result.violates(Rule::ForeignCharacters));
    }

    #[test]
    fn test_foreign_tolerance_is_configurable() {
        let mut rules = RuleSet::builtin().unwrap();
        rules.foreign_chars_max = 10;
        let text = "מה אתה הכי אוהב ב-weekend שלנו יחד בבית בערב?";
        let validated = ContentValidator::new(rules).validate(text, ContentType::Question, None);
        assert!(!validated.result.violates(Rule::ForeignCharacters));
    }

    #[test]
    fn test_empty_short_circuits() {
        let validated = validator().validate("  \"🔥\"  ", ContentType::Task, None);
        assert_eq!(validated.text, "");
        assert_eq!(validated.result.rule_ids(), vec!["empty"]);
    }

    #[test]
    fn test_too_short_collects_other_violations() {
        let validated = validator().validate("תן", ContentType::Task, None);
        let ids = validated.result.rule_ids();
        assert_eq!(ids[0], "too_short");
        assert!(ids.contains(&"word_count"));
        assert!(ids.contains(&"address"));
    }

    #[test]
    fn test_duplicate_detected() {
        let store = MemoryDedupStore::from_entries(vec![GOOD_TASK.to_string()]);
        let validated = validator().validate(GOOD_TASK, ContentType::Task, Some(&store));
        assert_eq!(validated.result.rule_ids(), vec!["duplicate"]);

        let fresh = MemoryDedupStore::new();
        let validated = validator().validate(GOOD_TASK, ContentType::Task, Some(&fresh));
        assert!(validated.result.is_valid);
    }

    #[test]
    fn test_accepted_texts_satisfy_rules() {
        let v = validator();
        let candidates = [
            (GOOD_QUESTION, ContentType::Question),
            (GOOD_TASK, ContentType::Task),
            ("איזה זיכרון משותף גורם לך לחייך כל פעם מחדש?", ContentType::Question),
            ("ספר לבן הזוג סוד קטן עליך שעדיין הוא לא יודע, לך", ContentType::Task),
            ("הראה", ContentType::Task),
            ("למה?", ContentType::Question),
        ];

        for (raw, content_type) in candidates {
            let validated = v.validate(raw, content_type, None);
            if !validated.result.is_valid {
                continue;
            }
            let rules = v.rules().for_content(content_type);
            let text_words = words(&validated.text);
            assert!(text_words.len() >= rules.words_min && text_words.len() <= rules.words_max);
            assert!(rules.opening_words.iter().any(|w| w == trim_word(text_words[0])));
            assert!(text_words
                .iter()
                .any(|w| v.rules().address_tokens.iter().any(|t| matches_token(w, t))));
        }
    }

    #[test]
    fn test_verdict_is_idempotent() {
        let v = validator();
        let inputs = [
            "מה אתה חושב על the best moment שלנו ביחד עד היום?",
            "Tell me something about you",
            GOOD_QUESTION,
        ];

        for raw in inputs {
            let first = v.validate(raw, ContentType::Question, None);
            let second = v.validate(raw, ContentType::Question, None);
            assert_eq!(first, second);

            let renormalized = v.validate(&first.text, ContentType::Question, None);
            assert_eq!(first.result, renormalized.result);
        }
    }
}
