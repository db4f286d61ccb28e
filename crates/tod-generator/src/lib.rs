//! # tod-generator
//!
//! Card generation with validation, bounded retry and a guaranteed fallback.
//!
//! Every request ends with a card. The provider is asked at most
//! `attempts_max` times; each answer is normalized and validated, and the
//! first clean one wins. A rate limit ends the loop at once. Anything else
//! that goes wrong ends in a card from the curated catalog.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ CardRequest │ ──> │   Prompt    │ ──> │  Provider   │
//! │             │     │   Builder   │     │ (Gemini/..) │
//! └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                │
//!                     ┌──────────────────────────┘
//!                     ▼
//!              ┌─────────────┐
//!              │  Validator  │
//!              │ (tod-rules) │
//!              └──────┬──────┘
//!                     │
//!     ┌───────────────┴───────────────┐
//!     ▼                               ▼
//! (valid)                     (invalid / error)
//! ┌─────────────┐               ┌─────────────┐
//! │  generated  │               │ backoff and │ ── attempts left? ──┐
//! │    card     │               │    retry    │                     │
//! └─────────────┘               └─────────────┘                     ▼
//!                                                            ┌─────────────┐
//!                                                            │  Fallback   │
//!                                                            │  Selector   │
//!                                                            └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run -p tod-generator --bin tod-generate -- \
//!     --type question --level spicy
//! ```

pub mod catalog;
pub mod client;
pub mod fallback;
pub mod generator;
pub mod pause;
pub mod prompt;
pub mod provider;
pub mod store;

pub use catalog::{CatalogError, FallbackCatalog};
pub use client::{
    BlockThreshold, GenerationProvider, GenerationRequest, HarmCategory, ProviderError,
    SafetyConfig, SafetySetting, SamplingConfig,
};
pub use fallback::FallbackSelector;
pub use generator::{
    load_assets, AttemptRecord, CardGenerator, CardOutcome, GenerationState, GeneratorConfig,
    GeneratorError,
};
pub use pause::{Pause, TokioPause};
pub use prompt::PromptBuilder;
pub use provider::{
    ClaudeClient, GeminiClient, Provider, ProviderKind, ProviderSettings, SimProvider, SimReply,
    TIMEOUT_DEFAULT,
};
pub use store::{FileDedupStore, StoreError, DEDUP_PATH_DEFAULT};
