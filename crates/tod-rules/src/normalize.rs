//! Text normalization.
//!
//! Model output arrives wrapped in quotes, prefixed with bullets or numbers,
//! and sprinkled with emoji. Normalization removes all of that but keeps
//! letters of any alphabet, so the purity check can still see them.

use std::sync::OnceLock;

use regex::Regex;

/// Hebrew Unicode block.
const HEBREW_BLOCK: std::ops::RangeInclusive<char> = '\u{0590}'..='\u{05FF}';

/// Single-letter prefixes Hebrew attaches to a following word.
const HEBREW_PREFIXES: &str = "ושהבכלמ";

/// Prefix letters allowed before an address token.
const ADDRESS_PREFIX_CHARS_MAX: usize = 1;

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[^\x{0590}-\x{05FF}\p{L}0-9\s!?.,\-]").expect("static regex")
    })
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

fn leading_marks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^(?:[\-:"'״׳]+|\d+[.)])\s*"#).expect("static regex"))
}

fn trailing_marks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\s\-:"'״׳]+$"#).expect("static regex"))
}

/// Normalize raw model output.
///
/// Removes characters outside the allow-list (Hebrew block, other letters,
/// digits, whitespace, `! ? . , -`), collapses whitespace, and strips
/// leading and trailing quotes, bullets, numbering and colons.
pub fn normalize(raw: &str) -> String {
    let kept = disallowed_chars().replace_all(raw, "");
    let collapsed = whitespace_runs().replace_all(&kept, " ");
    let mut text = collapsed.trim().to_string();

    // "1. "text"" needs more than one pass.
    loop {
        let stripped = leading_marks().replace(&text, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }

    trailing_marks().replace(&text, "").trim().to_string()
}

/// Whether a character is in the Hebrew block.
pub fn is_hebrew(c: char) -> bool {
    HEBREW_BLOCK.contains(&c)
}

/// Letters outside the Hebrew block.
pub fn foreign_letters_count(text: &str) -> usize {
    text.chars()
        .filter(|c| c.is_alphabetic() && !is_hebrew(*c))
        .count()
}

/// Words that carry at least one letter or digit.
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .collect()
}

/// Strip surrounding punctuation from a word.
pub fn trim_word(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Whether a word is the token, optionally preceded by one Hebrew prefix letter.
///
/// `שאתה` and `ולך` match `אתה` and `לך`; `הולך` does not match `לך`.
pub fn matches_token(word: &str, token: &str) -> bool {
    let word = trim_word(word);
    if word == token {
        return true;
    }

    match word.strip_suffix(token) {
        Some(prefix) if !prefix.is_empty() => {
            prefix.chars().count() <= ADDRESS_PREFIX_CHARS_MAX
                && prefix.chars().all(|c| HEBREW_PREFIXES.contains(c))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_quotes_and_bullets() {
        assert_eq!(normalize("\"מה אתה אוהב?\""), "מה אתה אוהב?");
        assert_eq!(normalize("- תן לי חיבוק"), "תן לי חיבוק");
        assert_eq!(normalize("• תן לי חיבוק"), "תן לי חיבוק");
        assert_eq!(normalize("״מה שלומך?״"), "מה שלומך?");
    }

    #[test]
    fn test_strips_numbering() {
        assert_eq!(normalize("1. מה אתה אוהב?"), "מה אתה אוהב?");
        assert_eq!(normalize("2) \"מה אתה אוהב?\""), "מה אתה אוהב?");
    }

    #[test]
    fn test_removes_emoji_and_collapses_whitespace() {
        assert_eq!(normalize("🔥 מה   אתה\n\nאוהב? 😍"), "מה אתה אוהב?");
    }

    #[test]
    fn test_strips_trailing_colon() {
        assert_eq!(normalize("השאלה שלך:"), "השאלה שלך");
    }

    #[test]
    fn test_keeps_foreign_letters_for_purity_check() {
        let text = normalize("מה אתה חושב על sushi?");
        assert!(text.contains("sushi"));
        assert_eq!(foreign_letters_count(&text), 5);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "\"1. מה אתה אוהב?\"",
            "- - תן לי hug גדול!!",
            "   ",
            "׳׳״״",
            "מה ✨ קורה לך",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_words_ignore_bare_punctuation() {
        assert_eq!(words("מה - אתה ?"), vec!["מה", "אתה"]);
    }

    #[test]
    fn test_matches_token_with_prefix() {
        assert!(matches_token("אתה", "אתה"));
        assert!(matches_token("שאתה", "אתה"));
        assert!(matches_token("ושלך?", "שלך"));
        assert!(!matches_token("זאת", "את"));
        assert!(!matches_token("מתאים", "את"));
        assert!(!matches_token("הולך", "לך"));
    }
}
