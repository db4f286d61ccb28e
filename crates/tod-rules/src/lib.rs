//! # tod-rules
//!
//! Linguistic validation for generated cards.
//!
//! Checks run in a fixed order and every violation is collected:
//!
//! | Step | Rule | Catches |
//! |------|------|---------|
//! | 1 | normalize | Quotes, bullets, numbering, stray symbols |
//! | 2 | `empty` / `too_short` | Nothing usable came back |
//! | 3 | `word_count` | Too long or too short |
//! | 4 | `opening_word` | Question without an interrogative, task without a verb |
//! | 5 | `address` | No second-person address |
//! | 6 | `foreign_characters` | Latin (or other) letters left in the text |
//! | 7 | `duplicate` | Already emitted |
//!
//! A text is accepted only when no rule is violated.
//!
//! The rules themselves are data: see `data/rules.toml` for the built-in set.

pub mod normalize;
pub mod rules;
pub mod validator;

pub use normalize::normalize;
pub use rules::{ContentRules, RuleSet, RulesError};
pub use validator::{ContentValidator, Validated};
