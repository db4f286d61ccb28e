//! Prompt generation for card requests.
//!
//! The prompt states the card's type, tone and category together with the
//! same rules the validator enforces. Word range, opening words and address
//! tokens are read from the active [`RuleSet`], so the two never drift apart.

use tod_core::{CardRequest, ContentType, DifficultyLevel};
use tod_rules::RuleSet;

/// Builds provider prompts. Stateless.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the instruction for one attempt.
    ///
    /// `attempt` is 1-indexed. Later attempts ask for more originality.
    pub fn build_card_prompt(request: &CardRequest, attempt: u32, rules: &RuleSet) -> String {
        debug_assert!(attempt >= 1, "Attempts are 1-indexed");

        let kind = request.content_type.hebrew_name();
        let content_rules = rules.for_content(request.content_type);

        let mut prompt = format!(
            r#"אתה מומחה ביצירת תוכן לזוגות ישראלים.

🎯 צור {kind} אחת חדשה ומקורית בעברית למשחק "אמת או חובה" לזוגות.

📋 פרטי המשימה:
- סוג: {kind}
- רמה: {tone}
- קטגוריה: {category}

✅ כללים חשובים:
1. התוכן חייב להיות בעברית בלבד, ללא מילים באנגלית.
2. {opening}
3. אורך: בדיוק בין {words_min} ל-{words_max} מילים.
4. פנייה ישירה לבן/בת הזוג באמצעות "{address}".
5. תוכן מתאים, מכבד וחיובי בלבד.
6. היה יצירתי ומקורי, בלי ביטויים שחוקים.

💡 הוראה: כתוב רק את הטקסט של ה{kind}, ללא הסברים או תוספות.
"#,
            kind = kind,
            tone = Self::tone(request.difficulty_level),
            category = request.category,
            opening = Self::opening_rule(request.content_type, &content_rules.opening_words),
            words_min = content_rules.words_min,
            words_max = content_rules.words_max,
            address = rules.address_tokens.join("/"),
        );

        if attempt > 1 {
            prompt.push_str(&format!(
                "🔄 זה ניסיון מספר {}, היה עוד יותר יצירתי ומקורי!\n",
                attempt
            ));
        }

        prompt.push_str(&format!("\nה{} שלך:", kind));
        prompt
    }

    /// Tone descriptor for a difficulty level.
    pub fn tone(level: DifficultyLevel) -> &'static str {
        match level {
            DifficultyLevel::Introductory => "הכרות קלילה",
            DifficultyLevel::Spicy => "רומנטי וחושני",
            DifficultyLevel::BoldSexy => "נועז והרפתקני",
        }
    }

    fn opening_rule(content_type: ContentType, opening_words: &[String]) -> String {
        let words = opening_words.join("/");
        match content_type {
            ContentType::Question => format!("השאלה חייבת להתחיל במילת שאלה ({}).", words),
            ContentType::Task => format!("המשימה חייבת להתחיל בפועל פעולה ({}).", words),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content_type: ContentType, level: DifficultyLevel) -> CardRequest {
        CardRequest::new(content_type, level, "בישול", 40)
    }

    #[test]
    fn test_prompt_carries_request_fields() {
        let rules = RuleSet::builtin().unwrap();
        let prompt = PromptBuilder::build_card_prompt(
            &request(ContentType::Question, DifficultyLevel::Spicy),
            1,
            &rules,
        );

        assert!(prompt.contains("שאלה"));
        assert!(prompt.contains("רומנטי וחושני"));
        assert!(prompt.contains("קטגוריה: בישול"));
        assert!(prompt.ends_with("השאלה שלך:"));
    }

    #[test]
    fn test_prompt_follows_rule_set() {
        let mut rules = RuleSet::builtin().unwrap();
        rules.task.words_min = 4;
        rules.task.words_max = 9;
        rules.task.opening_words = vec!["רקוד".to_string()];

        let prompt = PromptBuilder::build_card_prompt(
            &request(ContentType::Task, DifficultyLevel::Introductory),
            1,
            &rules,
        );

        assert!(prompt.contains("בין 4 ל-9 מילים"));
        assert!(prompt.contains("(רקוד)"));
        assert!(prompt.contains("אתה/את/לך/שלך"));
        // Question openings belong to the other class
        assert!(!prompt.contains("איפה"));
    }

    #[test]
    fn test_retry_asks_for_originality() {
        let rules = RuleSet::builtin().unwrap();
        let req = request(ContentType::Task, DifficultyLevel::BoldSexy);

        let first = PromptBuilder::build_card_prompt(&req, 1, &rules);
        let third = PromptBuilder::build_card_prompt(&req, 3, &rules);

        assert!(!first.contains("ניסיון מספר"));
        assert!(third.contains("ניסיון מספר 3"));
        assert!(third.contains("נועז והרפתקני"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let rules = RuleSet::builtin().unwrap();
        let req = request(ContentType::Question, DifficultyLevel::Introductory);
        assert_eq!(
            PromptBuilder::build_card_prompt(&req, 2, &rules),
            PromptBuilder::build_card_prompt(&req, 2, &rules)
        );
    }
}
