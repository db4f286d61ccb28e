//! # tod-core
//!
//! Core types for the couples truth-or-dare card service.
//!
//! Every crate in the workspace speaks in these types:
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`ContentType`] | Question (truth) or task (dare) |
//! | [`DifficultyLevel`] | Introductory, spicy or bold_sexy |
//! | [`CardRequest`] | A normalized request |
//! | [`GeneratedCard`] | The emitted card and where it came from |
//! | [`ValidationResult`] | Ordered rule violations for one text |
//! | [`DedupStore`] | Previously emitted texts |
//!
//! Requests arrive in either the canonical vocabulary (`question`, `spicy`)
//! or the localized one (`שאלה`, `ספייסי`). Both normalize to the same enums.

pub mod card;
pub mod dedup;
pub mod validation;

pub use card::{
    CardRequest, CardSource, ContentType, DifficultyLevel, GeneratedCard, RequestError,
    CATEGORY_CHARS_MAX_DEFAULT, CATEGORY_DEFAULT,
};
pub use dedup::{DedupSet, DedupStore, MemoryDedupStore};
pub use validation::{Rule, ValidationResult, Violation};
