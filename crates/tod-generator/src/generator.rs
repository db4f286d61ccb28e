//! Card generator with validation and retry loop.
//!
//! Implements the generate → validate → retry → fallback cycle. The loop is
//! strictly sequential per request and always ends with a card.

use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tod_core::{CardRequest, DedupStore, GeneratedCard, ValidationResult};
use tod_rules::{ContentValidator, RuleSet, RulesError};
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogError, FallbackCatalog};
use crate::client::{GenerationProvider, GenerationRequest, ProviderError};
use crate::fallback::FallbackSelector;
use crate::pause::Pause;
use crate::prompt::PromptBuilder;

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Maximum provider calls per request
    pub attempts_max: u32,
    /// Base wait after a rejected text, multiplied by the attempt number
    pub validation_backoff: Duration,
    /// Base wait after a status or malformed-body error
    pub provider_backoff: Duration,
    /// Base wait after a transport error
    pub transport_backoff: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            attempts_max: 3,
            validation_backoff: Duration::from_millis(200),
            provider_backoff: Duration::from_millis(250),
            transport_backoff: Duration::from_millis(300),
        }
    }
}

impl GeneratorConfig {
    /// Single attempt, no waiting. For interactive use.
    pub fn quick() -> Self {
        Self {
            attempts_max: 1,
            ..Default::default()
        }
    }

    /// Base backoff for a provider error.
    fn backoff_for(&self, err: &ProviderError) -> Duration {
        match err {
            ProviderError::Transport(_) => self.transport_backoff,
            _ => self.provider_backoff,
        }
    }
}

/// Where the retry loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Attempting,
    /// A text passed validation
    Succeeded,
    /// Every attempt was used, or a non-retryable error ended the loop
    Exhausted,
    /// The provider answered 429
    RateLimited,
}

/// Record of a single generation attempt.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Attempt number (1-indexed)
    pub attempt: u32,
    /// Text as returned by the provider
    pub raw_text: Option<String>,
    /// Text after normalization
    pub cleaned_text: Option<String>,
    /// Verdict, when the provider returned text
    pub validation: Option<ValidationResult>,
    /// Provider error, when it did not
    pub error: Option<String>,
    /// Duration of this attempt, excluding backoff
    pub duration: Duration,
}

/// Result of one request.
#[derive(Debug, Clone)]
pub struct CardOutcome {
    pub card: GeneratedCard,
    pub state: GenerationState,
    /// History of all attempts
    pub attempts: Vec<AttemptRecord>,
    /// Total duration, including backoff
    pub duration: Duration,
}

impl CardOutcome {
    /// The last attempt made, if any.
    pub fn last_attempt(&self) -> Option<&AttemptRecord> {
        self.attempts.last()
    }

    /// Format as a summary string.
    pub fn format_summary(&self) -> String {
        let mut summary = format!(
            "[{}] {:?} after {} attempt(s) in {:.2}s\n",
            self.card.source.name(),
            self.state,
            self.attempts.len(),
            self.duration.as_secs_f64(),
        );

        for record in &self.attempts {
            let verdict = match (&record.validation, &record.error) {
                (Some(result), _) => result.format_report(),
                (None, Some(error)) => format!("error: {}", error),
                (None, None) => "no result".to_string(),
            };
            summary.push_str(&format!("  #{}: {}\n", record.attempt, verdict));
        }

        summary
    }
}

/// Errors building a generator.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Load the rule set and fallback catalog, from files when given.
pub fn load_assets(
    rules_path: Option<&Path>,
    catalog_path: Option<&Path>,
) -> Result<(ContentValidator, FallbackCatalog), GeneratorError> {
    let rules = match rules_path {
        Some(path) => RuleSet::from_file(path)?,
        None => RuleSet::builtin()?,
    };
    let catalog = match catalog_path {
        Some(path) => FallbackCatalog::from_file(path)?,
        None => FallbackCatalog::builtin()?,
    };
    Ok((ContentValidator::new(rules), catalog))
}

/// Card generator.
///
/// Generic over the provider and the way it waits, so tests can drive it
/// with a scripted provider and a simulated clock.
pub struct CardGenerator<P, W> {
    provider: P,
    pause: W,
    validator: ContentValidator,
    catalog: FallbackCatalog,
    config: GeneratorConfig,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl<P: GenerationProvider, W: Pause> CardGenerator<P, W> {
    /// Create a new generator. Fallback picks use an entropy-seeded RNG.
    pub fn new(
        provider: P,
        pause: W,
        validator: ContentValidator,
        catalog: FallbackCatalog,
        config: GeneratorConfig,
    ) -> Self {
        debug_assert!(config.attempts_max >= 1, "Need at least one attempt");

        Self {
            provider,
            pause,
            validator,
            catalog,
            config,
            rng: Mutex::new(Box::new(StdRng::from_entropy())),
        }
    }

    /// Replace the fallback RNG.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Produce a card for the request.
    ///
    /// Never fails: exhaustion, rate limiting and provider errors all end in
    /// a catalog card. Every emitted text is added to `dedup`.
    pub async fn generate(&self, request: &CardRequest, dedup: &dyn DedupStore) -> CardOutcome {
        let start = Instant::now();
        let attempts_max = self.config.attempts_max;
        let mut attempts = Vec::new();
        let mut state = GenerationState::Attempting;

        info!(
            content_type = request.content_type.name(),
            level = request.difficulty_level.name(),
            category = %request.category,
            provider = self.provider.name(),
            "Generating card"
        );

        for attempt in 1..=attempts_max {
            let attempt_start = Instant::now();
            let prompt = PromptBuilder::build_card_prompt(request, attempt, self.validator.rules());
            let call = GenerationRequest::new(prompt, attempt, request.difficulty_level);

            let backoff = match self.provider.generate(&call).await {
                Ok(raw) => {
                    let validated =
                        self.validator.validate(&raw, request.content_type, Some(dedup));
                    debug!(
                        attempt,
                        raw = %raw,
                        cleaned = %validated.text,
                        verdict = %validated.result.format_report(),
                        "Attempt validated"
                    );

                    attempts.push(AttemptRecord {
                        attempt,
                        raw_text: Some(raw),
                        cleaned_text: Some(validated.text.clone()),
                        validation: Some(validated.result.clone()),
                        error: None,
                        duration: attempt_start.elapsed(),
                    });

                    if validated.result.is_valid {
                        dedup.add(validated.text.clone());
                        info!(attempt, "Generated card accepted");

                        return CardOutcome {
                            card: GeneratedCard::generated(
                                validated.text,
                                attempt,
                                validated.result,
                            ),
                            state: GenerationState::Succeeded,
                            attempts,
                            duration: start.elapsed(),
                        };
                    }

                    warn!(
                        attempt,
                        attempts_max,
                        violations = ?validated.result.rule_ids(),
                        "Generated text rejected"
                    );
                    self.config.validation_backoff
                }
                Err(err) => {
                    attempts.push(AttemptRecord {
                        attempt,
                        raw_text: None,
                        cleaned_text: None,
                        validation: None,
                        error: Some(err.to_string()),
                        duration: attempt_start.elapsed(),
                    });

                    if !err.is_retryable() {
                        state = if err == ProviderError::RateLimited {
                            warn!(attempt, "Provider rate limited, using fallback");
                            GenerationState::RateLimited
                        } else {
                            error!(attempt, error = %err, "Provider failed permanently");
                            GenerationState::Exhausted
                        };
                        break;
                    }

                    error!(attempt, attempts_max, error = %err, "Provider call failed");
                    self.config.backoff_for(&err)
                }
            };

            if attempt < attempts_max {
                self.pause.pause(backoff.saturating_mul(attempt)).await;
            }
        }

        if state == GenerationState::Attempting {
            state = GenerationState::Exhausted;
        }

        let text = self.select_fallback(request, dedup);
        dedup.add(text.clone());
        warn!(state = ?state, attempts = attempts.len(), "Serving fallback card");

        let attempts_count = u32::try_from(attempts.len()).unwrap_or(attempts_max);
        CardOutcome {
            card: GeneratedCard::fallback(text, attempts_count),
            state,
            attempts,
            duration: start.elapsed(),
        }
    }

    /// A catalog card for a request whose pipeline failed unexpectedly.
    pub fn fallback_after_error(
        &self,
        request: &CardRequest,
        dedup: &dyn DedupStore,
    ) -> GeneratedCard {
        let text = self.select_fallback(request, dedup);
        dedup.add(text.clone());
        GeneratedCard::fallback_error(text)
    }

    fn select_fallback(&self, request: &CardRequest, dedup: &dyn DedupStore) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        FallbackSelector::select(
            &self.catalog,
            request.content_type,
            request.difficulty_level,
            Some(dedup),
            &mut **rng,
        )
        .to_string()
    }
}
