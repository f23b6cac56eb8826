//! Limit on concurrently served client connections.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts open connections against a fixed maximum.
#[derive(Debug)]
pub struct ConnectionLimiter {
    open: AtomicUsize,
    max: usize,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            open: AtomicUsize::new(0),
            max: max.max(1),
        }
    }

    /// Reserve a slot, or `None` when the limit is reached.
    pub fn try_acquire(limiter: &Arc<Self>) -> Option<ConnectionSlot> {
        limiter
            .open
            .fetch_update(Ordering::SeqCst, Ordering::Relaxed, |open| {
                (open < limiter.max).then_some(open + 1)
            })
            .ok()
            .map(|_| ConnectionSlot {
                limiter: Arc::clone(limiter),
            })
    }

    pub fn open_count(&self) -> usize {
        self.open.load(Ordering::Relaxed)
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

/// Open-connection slot, released on drop.
#[derive(Debug)]
pub struct ConnectionSlot {
    limiter: Arc<ConnectionLimiter>,
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.limiter.open.fetch_sub(1, Ordering::SeqCst);
    }
}
