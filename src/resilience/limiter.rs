use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Fallback capacity when none is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// Caps the number of concurrently in-flight tool operations.
///
/// Capacity is fixed for the lifetime of the owning agent. Waiting acquirers
/// are served in FIFO order by the underlying semaphore.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        debug!(capacity, "created concurrency limiter");
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until a slot is free. The slot is held until the returned permit
    /// drops.
    pub async fn acquire(&self) -> Permit {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("limiter semaphore is never closed");
        Permit { _inner: permit }
    }

    /// Take a slot without waiting, if one is free.
    pub fn try_acquire(&self) -> Option<Permit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| Permit { _inner: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A capacity token; dropping it frees the slot.
#[must_use = "the slot is held only while the permit is alive"]
#[derive(Debug)]
pub struct Permit {
    _inner: OwnedSemaphorePermit,
}
