//! Shared vocabulary: the bus roster, device records, address ranges,
//! run-wide configuration, and the usage-error taxonomy.

pub mod config;
pub mod device;
pub mod error;
pub mod interface;
pub mod range;
