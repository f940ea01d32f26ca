use thiserror::Error;

use crate::device::Bus;

/// Exit code for command-line usage errors (clap's own convention).
pub const EXIT_USAGE: u8 = 2;

/// Fatal, pre-scan errors: malformed or contradictory command-line input.
/// Everything else in the run degrades locally and keeps going.
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("{0} scan is not available in this build or environment")]
    BackendUnavailable(Bus),

    #[error("invalid address '{input}': {reason}")]
    BadAddress { input: String, reason: String },

    #[error("invalid CIDR '{input}': {reason}")]
    BadCidr { input: String, reason: String },
}
