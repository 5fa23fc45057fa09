//! Shutdown coordination
//!
//! One centrally-owned coordinator that every worker registers with exactly
//! once. The process interrupt handler cancels a single root token; each
//! worker's ping loop observes its own child token.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Central owner of the process-wide cancellation signal
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    root: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a child token for one worker.
    ///
    /// Cancelling the root cancels every child; a child can be cancelled on
    /// its own without affecting siblings.
    pub fn register(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Trigger shutdown. Idempotent; safe to call from any task.
    pub fn trigger(&self) {
        self.root.cancel();
    }

    /// Whether shutdown has been triggered
    pub fn is_triggered(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Block until the process receives an interrupt, then trigger shutdown.
    pub async fn listen_for_interrupt(&self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, shutting down"),
            Err(e) => info!("Interrupt listener failed ({}), shutting down", e),
        }
        self.trigger();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_cancels_registered_tokens() {
        let coordinator = ShutdownCoordinator::new();
        let first = coordinator.register();
        let second = coordinator.register();

        assert!(!first.is_cancelled());
        coordinator.trigger();

        first.cancelled().await;
        second.cancelled().await;
        assert!(coordinator.is_triggered());
    }

    #[tokio::test]
    async fn test_trigger_is_idempotent() {
        let coordinator = ShutdownCoordinator::new();
        let token = coordinator.register();

        coordinator.trigger();
        coordinator.trigger();

        token.cancelled().await;
    }

    #[tokio::test]
    async fn test_child_cancellation_does_not_affect_siblings() {
        let coordinator = ShutdownCoordinator::new();
        let first = coordinator.register();
        let second = coordinator.register();

        first.cancel();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!coordinator.is_triggered());
    }
}
