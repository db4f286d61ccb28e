//! Deterministic provider fault injection.
//!
//! Simulates the ways a remote generation API misbehaves:
//! - Rate limiting (HTTP 429, terminal for the retry loop)
//! - Server errors (non-success status, retryable)
//! - Malformed bodies (no candidate text, retryable)
//! - Unreachable network (transport failure, retryable)

use crate::random::DeterministicRng;

/// A fault the simulated provider should exhibit on one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFault {
    /// Provider answered 429.
    RateLimited,
    /// Provider answered with a non-success status.
    ServerError(u16),
    /// Provider answered 200 with an unusable body.
    Malformed,
    /// The request never reached the provider.
    Unreachable,
}

impl ProviderFault {
    /// Whether the retry loop may try again after this fault.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProviderFault::RateLimited)
    }
}

/// Configuration for fault injection.
///
/// Probabilities are checked in order: rate limit, server error, malformed,
/// unreachable. The first hit wins.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// Probability of a 429
    pub rate_limit_probability: f64,
    /// Probability of a 5xx
    pub server_error_probability: f64,
    /// Probability of a malformed body
    pub malformed_probability: f64,
    /// Probability of a transport failure
    pub unreachable_probability: f64,
    /// Whether fault injection is enabled
    pub enabled: bool,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            rate_limit_probability: 0.01,
            server_error_probability: 0.05,
            malformed_probability: 0.02,
            unreachable_probability: 0.02,
            enabled: true,
        }
    }
}

impl FaultConfig {
    /// No faults - the provider always answers.
    #[must_use]
    pub fn none() -> Self {
        Self {
            rate_limit_probability: 0.0,
            server_error_probability: 0.0,
            malformed_probability: 0.0,
            unreachable_probability: 0.0,
            enabled: false,
        }
    }

    /// Frequent retryable faults, no rate limiting.
    #[must_use]
    pub fn flaky() -> Self {
        Self {
            rate_limit_probability: 0.0,
            server_error_probability: 0.2,
            malformed_probability: 0.1,
            unreachable_probability: 0.1,
            enabled: true,
        }
    }

    /// Every call fails at the transport layer.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            rate_limit_probability: 0.0,
            server_error_probability: 0.0,
            malformed_probability: 0.0,
            unreachable_probability: 1.0,
            enabled: true,
        }
    }

    /// Every call is rate limited.
    #[must_use]
    pub fn rate_limited() -> Self {
        Self {
            rate_limit_probability: 1.0,
            server_error_probability: 0.0,
            malformed_probability: 0.0,
            unreachable_probability: 0.0,
            enabled: true,
        }
    }
}

/// Deterministic fault injector.
///
/// The same seed produces the same fault sequence.
pub struct FaultInjector {
    rng: DeterministicRng,
    config: FaultConfig,
}

/// Status codes used for simulated server errors.
const SERVER_ERROR_STATUSES: [u16; 3] = [500, 502, 503];

impl FaultInjector {
    /// Create a new fault injector with the given RNG and config.
    pub fn new(rng: DeterministicRng, config: FaultConfig) -> Self {
        for probability in [
            config.rate_limit_probability,
            config.server_error_probability,
            config.malformed_probability,
            config.unreachable_probability,
        ] {
            debug_assert!(
                (0.0..=1.0).contains(&probability),
                "Fault probability must be in [0.0, 1.0]"
            );
        }

        Self { rng, config }
    }

    /// Decide the fault for the next provider call, if any.
    pub fn next_fault(&mut self) -> Option<ProviderFault> {
        if !self.config.enabled {
            return None;
        }

        if self.rng.chance(self.config.rate_limit_probability) {
            return Some(ProviderFault::RateLimited);
        }

        if self.rng.chance(self.config.server_error_probability) {
            let status = self.rng.pick(&SERVER_ERROR_STATUSES).copied().unwrap_or(500);
            return Some(ProviderFault::ServerError(status));
        }

        if self.rng.chance(self.config.malformed_probability) {
            return Some(ProviderFault::Malformed);
        }

        if self.rng.chance(self.config.unreachable_probability) {
            return Some(ProviderFault::Unreachable);
        }

        None
    }
}
