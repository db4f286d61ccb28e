//! Simulated provider for deterministic tests.
//!
//! Replies come from a script first. Once the script runs out, the fault
//! injector (if any) decides whether the call fails, and otherwise the
//! default text is returned.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use tod_dst::{FaultInjector, ProviderFault};

use crate::client::{GenerationProvider, GenerationRequest, ProviderError};

/// One scripted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimReply {
    Text(String),
    Fault(ProviderFault),
    /// Any provider error, including ones no fault maps to
    Error(ProviderError),
}

impl SimReply {
    pub fn text(text: impl Into<String>) -> Self {
        SimReply::Text(text.into())
    }
}

impl From<ProviderFault> for ProviderError {
    fn from(fault: ProviderFault) -> Self {
        match fault {
            ProviderFault::RateLimited => ProviderError::RateLimited,
            ProviderFault::ServerError(status) => ProviderError::Status {
                status,
                body: "simulated server error".to_string(),
            },
            ProviderFault::Malformed => ProviderError::Malformed("simulated".to_string()),
            ProviderFault::Unreachable => {
                ProviderError::Transport("simulated unreachable".to_string())
            }
        }
    }
}

/// Scripted provider.
pub struct SimProvider {
    script: Mutex<VecDeque<SimReply>>,
    fault: Option<Mutex<FaultInjector>>,
    default_text: Option<String>,
    prompts: Mutex<Vec<GenerationRequest>>,
    calls_count: AtomicU32,
}

impl SimProvider {
    /// Replay `replies` in order, then fail with `Malformed`.
    pub fn scripted(replies: impl IntoIterator<Item = SimReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            fault: None,
            default_text: None,
            prompts: Mutex::new(Vec::new()),
            calls_count: AtomicU32::new(0),
        }
    }

    /// Answer `text` unless the injector produces a fault.
    pub fn with_faults(fault: FaultInjector, text: impl Into<String>) -> Self {
        Self {
            fault: Some(Mutex::new(fault)),
            default_text: Some(text.into()),
            ..Self::scripted(Vec::<SimReply>::new())
        }
    }

    /// Always fail with the given fault.
    pub fn failing(fault: ProviderFault) -> Self {
        Self::scripted(std::iter::repeat(SimReply::Fault(fault)).take(1024))
    }

    /// Number of `generate` calls so far.
    #[must_use]
    pub fn calls_count(&self) -> u32 {
        self.calls_count.load(Ordering::Acquire)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_reply(&self) -> Result<String, ProviderError> {
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        if let Some(reply) = scripted {
            return match reply {
                SimReply::Text(text) => Ok(text),
                SimReply::Fault(fault) => Err(fault.into()),
                SimReply::Error(err) => Err(err),
            };
        }

        if let Some(ref injector) = self.fault {
            let fault = injector
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .next_fault();
            if let Some(fault) = fault {
                return Err(fault.into());
            }
        }

        self.default_text
            .clone()
            .ok_or_else(|| ProviderError::Malformed("script exhausted".to_string()))
    }
}

impl GenerationProvider for SimProvider {
    fn name(&self) -> &'static str {
        "sim"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        self.calls_count.fetch_add(1, Ordering::AcqRel);
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        self.next_reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tod_core::DifficultyLevel;
    use tod_dst::{DeterministicRng, FaultConfig};

    fn request() -> GenerationRequest {
        GenerationRequest::new("prompt".into(), 1, DifficultyLevel::Introductory)
    }

    #[tokio::test]
    async fn test_script_then_exhausted() {
        let sim = SimProvider::scripted([
            SimReply::text("first"),
            SimReply::Fault(ProviderFault::ServerError(503)),
        ]);

        assert_eq!(sim.generate(&request()).await.unwrap(), "first");
        assert!(matches!(
            sim.generate(&request()).await,
            Err(ProviderError::Status { status: 503, .. })
        ));
        assert!(matches!(
            sim.generate(&request()).await,
            Err(ProviderError::Malformed(_))
        ));
        assert_eq!(sim.calls_count(), 3);
        assert_eq!(sim.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_error_is_returned_as_is() {
        let sim = SimProvider::scripted([SimReply::Error(ProviderError::MissingApiKey(
            "GEMINI_API_KEY",
        ))]);

        assert_eq!(
            sim.generate(&request()).await,
            Err(ProviderError::MissingApiKey("GEMINI_API_KEY"))
        );
    }

    #[tokio::test]
    async fn test_fault_injector_drives_replies() {
        let injector = FaultInjector::new(DeterministicRng::new(7), FaultConfig::unreachable());
        let sim = SimProvider::with_faults(injector, "never");

        for _ in 0..5 {
            assert!(matches!(
                sim.generate(&request()).await,
                Err(ProviderError::Transport(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_no_faults_returns_default_text() {
        let injector = FaultInjector::new(DeterministicRng::new(7), FaultConfig::none());
        let sim = SimProvider::with_faults(injector, "always");
        assert_eq!(sim.generate(&request()).await.unwrap(), "always");
    }
}
