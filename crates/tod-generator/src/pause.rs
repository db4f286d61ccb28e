//! Waiting between attempts.
//!
//! Production waits on the tokio timer. Simulation advances a [`SimClock`]
//! and returns at once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tod_dst::SimClock;

/// Something that can wait for a duration.
pub trait Pause: Send + Sync {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Real waiting via `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

impl Pause for SimClock {
    async fn pause(&self, duration: Duration) {
        self.sleep(duration);
    }
}

impl<P: Pause> Pause for Arc<P> {
    async fn pause(&self, duration: Duration) {
        self.as_ref().pause(duration).await;
    }
}
