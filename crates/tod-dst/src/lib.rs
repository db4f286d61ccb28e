//! # tod-dst
//!
//! Deterministic simulation for the card generation pipeline.
//!
//! The retry loop depends on three things that are awkward to test for real:
//! wall-clock backoff, random fallback choice, and a flaky remote provider.
//! This crate replaces all three with seeded, reproducible stand-ins.
//!
//! ## Usage
//!
//! ```rust
//! use tod_dst::{DstEnv, FaultConfig, ProviderFault};
//!
//! let (clock, mut rng, mut fault) =
//!     DstEnv::with_fault_config(12345, FaultConfig::flaky()).into_parts();
//!
//! // Deterministic time
//! clock.sleep_ms(250);
//! assert_eq!(clock.now_ms(), 250);
//!
//! // Deterministic randomness
//! assert!(rng.pick(&[1, 2, 3]).is_some());
//!
//! // Deterministic provider faults
//! match fault.next_fault() {
//!     Some(ProviderFault::RateLimited) => { /* stop retrying */ }
//!     Some(_) => { /* retryable */ }
//!     None => { /* provider answers */ }
//! }
//! ```
//!
//! ## Reproducibility
//!
//! To reproduce a failing test:
//! ```bash
//! DST_SEED=12345 cargo test
//! ```

pub mod clock;
pub mod env;
pub mod fault;
pub mod random;

pub use clock::SimClock;
pub use env::DstEnv;
pub use fault::{FaultConfig, FaultInjector, ProviderFault};
pub use random::DeterministicRng;

/// Get DST seed from environment or generate random one.
///
/// Prints the seed for reproduction. Use `DST_SEED=<seed>` to reproduce.
#[must_use]
pub fn get_or_generate_seed() -> u64 {
    match std::env::var("DST_SEED").ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(seed) => {
            println!("DST_SEED={} (from environment)", seed);
            seed
        }
        None => {
            // Zero is a poor xoshiro seed.
            let seed = rand::random::<u64>() | 1;
            println!("DST_SEED={} (randomly generated)", seed);
            seed
        }
    }
}
