//! Concurrency budget.
//!
//! Every probe address opens a socket, so the number of scan units in
//! flight is bounded by the process's open-file-descriptor ceiling, minus a
//! small reservation for the stdio triplet. The resolved budget backs the
//! one scan semaphore the orchestrator installs for the run.

use std::sync::Arc;

use rlimit::Resource;
use tokio::sync::Semaphore;
use tracing::warn;

/// Descriptors held back for baseline process usage (stdin/stdout/stderr).
pub const RESERVE_FD_COUNT: u64 = 3;

/// Default number of concurrently outstanding scan units.
pub const DEFAULT_SCAN_JOBS: usize = 128;

/// The maximum number of scan units allowed in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyBudget(usize);

impl ConcurrencyBudget {
    /// Resolves a budget against the current soft `RLIMIT_NOFILE`.
    pub fn resolve(requested: usize) -> Self {
        Self(clamp_to_descriptor_limit(requested, soft_nofile_limit()))
    }

    /// Applies a `-T` override on top of the current budget. An unparsable
    /// or non-positive value keeps the current budget with a warning.
    pub fn with_override(self, arg: &str) -> Self {
        Self(apply_override(arg, self.0, soft_nofile_limit()))
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// The counting primitive enforcing this budget for one run.
    pub fn semaphore(self) -> Arc<Semaphore> {
        Arc::new(Semaphore::new(self.0))
    }
}

impl Default for ConcurrencyBudget {
    fn default() -> Self {
        Self::resolve(DEFAULT_SCAN_JOBS)
    }
}

fn soft_nofile_limit() -> Option<u64> {
    match Resource::NOFILE.get() {
        Ok((soft, _hard)) => Some(soft),
        Err(e) => {
            warn!("cannot query the file descriptor limit, keeping default job limits: {e}");
            None
        }
    }
}

fn clamp_to_descriptor_limit(requested: usize, soft_limit: Option<u64>) -> usize {
    let mut budget = requested.clamp(1, Semaphore::MAX_PERMITS);

    if let Some(soft) = soft_limit {
        let ceiling = soft.saturating_sub(RESERVE_FD_COUNT).max(1) as usize;
        if budget > ceiling {
            warn!(
                "Requested scan concurrency {budget} exceeds the file descriptor \
                 limit {soft} minus reservation, constraining to {ceiling}"
            );
            budget = ceiling;
        }
    }

    budget
}

fn apply_override(arg: &str, current: usize, soft_limit: Option<u64>) -> usize {
    match arg.trim().parse::<usize>() {
        Ok(requested) if requested > 0 => clamp_to_descriptor_limit(requested, soft_limit),
        _ => {
            warn!("Requested scan concurrency '{arg}' is out of range, keeping {current}");
            current
        }
    }
}
