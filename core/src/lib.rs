//! Scan orchestration engine.
//!
//! Builds the scan plan from enablement and availability flags, bounds
//! concurrency by the process's file-descriptor budget, runs one worker per
//! bus, merges per-range results, and renders every bus slot in a fixed
//! order regardless of completion timing.

pub mod budget;
pub mod merge;
pub mod options;
pub mod orchestrator;
pub mod probeset;
pub mod results;
pub mod worker;
