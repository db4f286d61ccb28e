//! DST environment combining clock, RNG and fault injector.
//!
//! One seed drives every source of nondeterminism in a pipeline run.

use crate::clock::SimClock;
use crate::fault::{FaultConfig, FaultInjector};
use crate::random::DeterministicRng;

/// Complete DST environment.
///
/// The pipeline takes the clock, RNG and injector by value in different
/// places, so tests build an environment and split it:
///
/// ```rust
/// use tod_dst::{get_or_generate_seed, DstEnv, FaultConfig};
///
/// let env = DstEnv::with_fault_config(get_or_generate_seed(), FaultConfig::flaky());
/// let (clock, mut rng, mut fault) = env.into_parts();
///
/// clock.sleep_ms(250);
/// let pick = rng.pick(&["first", "second"]);
/// let next = fault.next_fault();
/// # let _ = (pick, next);
/// ```
pub struct DstEnv {
    clock: SimClock,
    rng: DeterministicRng,
    fault: FaultInjector,
}

impl DstEnv {
    /// Create a new DST environment with the default fault mix.
    pub fn new(seed: u64) -> Self {
        Self::with_fault_config(seed, FaultConfig::default())
    }

    /// Create with custom fault configuration.
    pub fn with_fault_config(seed: u64, fault_config: FaultConfig) -> Self {
        debug_assert!(seed != 0, "Seed should not be zero");

        let mut master_rng = DeterministicRng::new(seed);

        // Separate streams, so fault draws never shift fallback picks
        let rng = master_rng.fork();
        let fault = FaultInjector::new(master_rng.fork(), fault_config);

        Self {
            clock: SimClock::new(),
            rng,
            fault,
        }
    }

    /// Split into owned components.
    pub fn into_parts(self) -> (SimClock, DeterministicRng, FaultInjector) {
        (self.clock, self.rng, self.fault)
    }
}
