//! Scan orchestrator.
//!
//! One run walks a fixed sequence of phases: resolve the plan from
//! enablement and availability, install the shared scan semaphore, dispatch
//! at most one worker per bus, wait for every started worker, then render
//! and release each result slot in fixed bus order. Rendering order never
//! depends on completion order, so parallel and sequential execution
//! produce identical output for deterministic probes.

use std::sync::Arc;

use powerscan_common::device::{Bus, DeviceList};
use powerscan_common::range::RangeRegistry;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::budget::ConcurrencyBudget;
use crate::options::{Enabled, ScanOptions};
use crate::probeset::ProbeSet;
use crate::results::ScanResults;
use crate::worker;

/// How the per-bus workers execute. Result contents are identical either
/// way; only wall-clock behavior differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecStrategy {
    #[default]
    Parallel,
    Sequential,
}

/// Runtime availability per bus, downgradable during a run.
#[derive(Debug, Clone, Copy)]
pub struct Availability {
    flags: [bool; 8],
}

impl Availability {
    pub fn detect(probes: &dyn ProbeSet) -> Self {
        let mut flags = [false; 8];
        for (slot, bus) in flags.iter_mut().zip(Bus::ALL) {
            *slot = probes.available(bus);
        }
        Self { flags }
    }

    /// Everything available, for tests and stubs.
    pub fn full() -> Self {
        Self { flags: [true; 8] }
    }

    pub fn get(&self, bus: Bus) -> bool {
        self.flags[Bus::ALL.iter().position(|b| *b == bus).unwrap_or(0)]
    }

    pub fn set(&mut self, bus: Bus, on: bool) {
        if let Some(idx) = Bus::ALL.iter().position(|b| *b == bus) {
            self.flags[idx] = on;
        }
    }
}

pub struct Orchestrator {
    probes: Arc<dyn ProbeSet>,
    registry: Arc<RangeRegistry>,
    options: Arc<ScanOptions>,
    enabled: Enabled,
    availability: Availability,
    budget: ConcurrencyBudget,
    strategy: ExecStrategy,
}

impl Orchestrator {
    pub fn new(
        probes: Arc<dyn ProbeSet>,
        registry: RangeRegistry,
        options: ScanOptions,
        enabled: Enabled,
        budget: ConcurrencyBudget,
        strategy: ExecStrategy,
    ) -> Self {
        let availability = Availability::detect(probes.as_ref());
        Self {
            probes,
            registry: Arc::new(registry),
            options: Arc::new(options),
            enabled: Enabled::resolve(enabled),
            availability,
            budget,
            strategy,
        }
    }

    /// Runs the full scan cycle. `render` is invoked exactly once per bus,
    /// in fixed [`Bus::ALL`] order, after all workers have completed; each
    /// slot is released right after its render call.
    pub async fn run<F>(mut self, mut render: F) -> anyhow::Result<()>
    where
        F: FnMut(Bus, &DeviceList),
    {
        let plan = self.resolve_plan();

        // The probes library must not carry a semaphore of its own across
        // runs; whatever was installed before is replaced here, strictly
        // before the first worker starts.
        powerscan_probes::semaphore::install(self.budget.semaphore());
        debug!(
            "Dispatching {} scan worker(s), budget {} scan unit(s)",
            plan.len(),
            self.budget.get()
        );

        let mut results = match self.strategy {
            ExecStrategy::Parallel => self.dispatch_parallel(&plan).await,
            ExecStrategy::Sequential => self.dispatch_sequential(&plan).await,
        };

        debug!("SCANS DONE: display results");
        for bus in Bus::ALL {
            debug!("SCANS DONE: display results: {bus}");
            let devices = results.take(bus);
            render(bus, &devices);
            drop(devices);
        }

        // Teardown order matters: the semaphore outlives every worker, and
        // both go away before the registry.
        powerscan_probes::semaphore::clear();
        drop(self.registry);
        debug!("SCANS DONE");
        Ok(())
    }

    /// Configuring phase: which buses actually get a worker.
    fn resolve_plan(&mut self) -> Vec<Bus> {
        let mut plan = Vec::new();

        for bus in Bus::ALL {
            if !self.enabled.get(bus) {
                debug!("{bus} scan: not requested, skipped");
                continue;
            }
            if !self.availability.get(bus) {
                debug!("{bus} scan: not supported, skipped");
                continue;
            }
            // SNMP and the NUT bus have no implicit target; with nothing to
            // scan they are skipped and marked unavailable for this run.
            // XML/HTTP and IPMI instead fall back to broadcast / the local
            // device inside their workers.
            if bus.is_range_oriented() && !bus.has_implicit_target() && self.registry.is_empty() {
                self.progress(format!("No IP range(s) requested, skipping {bus} scan"));
                self.availability.set(bus, false);
                continue;
            }

            self.progress(format!("Scanning {bus}."));
            plan.push(bus);
        }

        plan
    }

    async fn dispatch_parallel(&mut self, plan: &[Bus]) -> ScanResults {
        let mut workers: JoinSet<(Bus, DeviceList)> = JoinSet::new();

        for &bus in plan {
            let probes = Arc::clone(&self.probes);
            let registry = Arc::clone(&self.registry);
            let options = Arc::clone(&self.options);
            workers.spawn(async move {
                let devices = worker::run_backend(bus, probes.as_ref(), &registry, &options).await;
                (bus, devices)
            });
        }

        let mut results = ScanResults::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((bus, devices)) => results.store(bus, devices),
                // One dead worker degrades one bus; its siblings and the
                // rendering phase are unaffected.
                Err(e) => warn!("a scan worker failed and was disabled for this run: {e}"),
            }
        }
        results
    }

    async fn dispatch_sequential(&mut self, plan: &[Bus]) -> ScanResults {
        let mut results = ScanResults::default();
        for &bus in plan {
            let devices =
                worker::run_backend(bus, self.probes.as_ref(), &self.registry, &self.options).await;
            results.store(bus, devices);
        }
        results
    }

    /// Progress notes: always visible by default, demoted under `-q`.
    fn progress(&self, msg: String) {
        if self.options.config.quiet {
            debug!("{msg}");
        } else {
            info!("{msg}");
        }
    }
}
