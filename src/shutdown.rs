//! Shutdown coordination for the daemon.
//!
//! Module `exit` hooks must only run once no call is being dispatched. The
//! coordinator stops admission of new calls and waits for the in-flight
//! ones to finish.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainResult {
    Complete,
    Timeout { remaining: u32 },
}

#[derive(Debug, Default)]
struct Shared {
    draining: AtomicBool,
    in_flight: AtomicU32,
    idle: Notify,
}

/// Tracks in-flight calls and drains them on shutdown.
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    shared: Arc<Shared>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_draining(&self) -> bool {
        self.shared.draining.load(Ordering::SeqCst)
    }

    /// Admit one call. Returns `None` once draining has started.
    pub fn track(&self) -> Option<CallGuard> {
        if self.is_draining() {
            return None;
        }
        self.shared.in_flight.fetch_add(1, Ordering::SeqCst);
        Some(CallGuard {
            shared: Arc::clone(&self.shared),
        })
    }

    pub fn in_flight(&self) -> u32 {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Stop admitting calls and wait until the in-flight ones complete.
    pub async fn drain(&self, timeout: Duration) -> DrainResult {
        self.shared.draining.store(true, Ordering::SeqCst);
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let notified = self.shared.idle.notified();
            let remaining = self.in_flight();
            if remaining == 0 {
                return DrainResult::Complete;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return match self.in_flight() {
                    0 => DrainResult::Complete,
                    remaining => DrainResult::Timeout { remaining },
                };
            }
        }
    }
}

/// Marks one call in flight until dropped.
#[derive(Debug)]
pub struct CallGuard {
    shared: Arc<Shared>,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        if self.shared.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shared.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_without_calls_completes() {
        let coordinator = ShutdownCoordinator::new();
        assert_eq!(coordinator.drain(Duration::from_millis(10)).await, DrainResult::Complete);
        assert!(coordinator.track().is_none());
    }

    #[tokio::test]
    async fn drain_waits_for_guard() {
        let coordinator = ShutdownCoordinator::new();
        let guard = coordinator.track().unwrap();

        let waiter = coordinator.clone();
        let handle = tokio::spawn(async move { waiter.drain(Duration::from_secs(5)).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);
        assert_eq!(handle.await.unwrap(), DrainResult::Complete);
    }

    #[tokio::test]
    async fn drain_times_out() {
        let coordinator = ShutdownCoordinator::new();
        let _guard = coordinator.track().unwrap();
        let result = coordinator.drain(Duration::from_millis(20)).await;
        assert_eq!(result, DrainResult::Timeout { remaining: 1 });
    }
}
