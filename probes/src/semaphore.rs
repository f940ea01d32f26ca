//! Shared scan-concurrency primitive.
//!
//! The orchestrator is the single owner: it installs the semaphore strictly
//! before any worker is dispatched and clears it strictly after every worker
//! has completed. Probe engines only borrow a handle here to gate their
//! per-address sub-units of work.

use std::sync::{Arc, RwLock};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

static SCAN_SEMAPHORE: RwLock<Option<Arc<Semaphore>>> = RwLock::new(None);

/// Installs the run's semaphore, replacing any previous instance.
pub fn install(sem: Arc<Semaphore>) {
    let mut slot = SCAN_SEMAPHORE.write().unwrap_or_else(|e| e.into_inner());
    *slot = Some(sem);
}

/// Drops the installed semaphore at teardown.
pub fn clear() {
    let mut slot = SCAN_SEMAPHORE.write().unwrap_or_else(|e| e.into_inner());
    *slot = None;
}

pub fn handle() -> Option<Arc<Semaphore>> {
    let slot = SCAN_SEMAPHORE.read().unwrap_or_else(|e| e.into_inner());
    slot.clone()
}

/// Waits for one scan-unit permit. Without an installed budget the guard is
/// a no-op, so probes stay usable from unit tests.
pub async fn acquire() -> Option<OwnedSemaphorePermit> {
    match handle() {
        Some(sem) => sem.acquire_owned().await.ok(),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_bounds_outstanding_permits() {
        install(Arc::new(Semaphore::new(2)));

        let first = acquire().await;
        let second = acquire().await;
        assert!(first.is_some());
        assert!(second.is_some());
        assert_eq!(handle().unwrap().available_permits(), 0);

        drop(first);
        assert_eq!(handle().unwrap().available_permits(), 1);

        clear();
        assert!(handle().is_none());
        assert!(acquire().await.is_none());
    }
}
