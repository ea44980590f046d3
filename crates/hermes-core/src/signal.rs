//! Store-held abort signal.
//!
//! Every in-flight call races its remaining middleware chain against the
//! signal that was current when it started. Firing the signal wins that race
//! for all of them at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// A one-shot signal that cancels in-flight calls.
///
/// Clones share the same state.
///
/// # Example
///
/// ```rust
/// use hermes_core::AbortSignal;
///
/// let signal = AbortSignal::new();
/// let observer = signal.clone();
///
/// signal.abort();
/// assert!(observer.is_aborted());
/// ```
#[derive(Debug, Clone)]
pub struct AbortSignal {
    aborted: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl AbortSignal {
    /// Creates a signal that has not fired.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            aborted: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Fires the signal. Idempotent.
    pub fn abort(&self) {
        if self
            .aborted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // no receivers is fine
            let _ = self.sender.send(());
        }
    }

    /// Returns `true` once the signal has fired.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Completes when the signal fires, immediately if it already has.
    pub async fn aborted(&self) {
        // Subscribe before checking the flag so a concurrent abort is not missed.
        let mut receiver = self.sender.subscribe();
        if self.is_aborted() {
            return;
        }
        let _ = receiver.recv().await;
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_abort_is_idempotent() {
        let signal = AbortSignal::new();
        assert!(!signal.is_aborted());
        signal.abort();
        signal.abort();
        assert!(signal.is_aborted());
    }

    #[tokio::test]
    async fn test_aborted_completes_after_abort() {
        let signal = AbortSignal::new();
        let waiter = signal.clone();

        let handle = tokio::spawn(async move {
            waiter.aborted().await;
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.abort();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[tokio::test]
    async fn test_aborted_returns_immediately_when_already_fired() {
        let signal = AbortSignal::new();
        signal.abort();

        tokio::time::timeout(Duration::from_millis(100), signal.aborted())
            .await
            .expect("should not wait");
    }
}
