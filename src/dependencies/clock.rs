use std::{future::Future, pin::Pin, time::Duration};

use async_trait::async_trait;
use tracing::debug;

/// Resolves once the operator interrupts the process.
pub type Interrupt = Pin<Box<dyn Future<Output = ()> + Send>>;

// Dependency to wait between polls and to notice Ctrl-C, so tests don't spend real time
#[async_trait]
pub trait Clock {
    async fn sleep(&self, duration: Duration);

    /// Listen for an interrupt. Listening starts when the future is first polled and stops when
    /// it is dropped.
    fn interrupted(&self) -> Interrupt;
}

/// Sleeps on the tokio timer and listens for Ctrl-C.
#[derive(Debug, Clone, Default)]
pub struct TokioClock;

impl TokioClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn interrupted(&self) -> Interrupt {
        Box::pin(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                // Without a signal handler we can't be interrupted.
                debug!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
    }
}
