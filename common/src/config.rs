use std::time::Duration;

/// Default network probe timeout in seconds, overridable with `-t`.
pub const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = 5;

/// How a discovered device is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// `ups.conf` sections with sanity-check warnings as comments.
    #[default]
    UpsConfWithSanityCheck,
    /// Plain `ups.conf` sections.
    UpsConf,
    /// One parsable line per device.
    Parsable,
}

/// Run-wide settings shared by every backend.
#[derive(Debug, Clone)]
pub struct Config {
    /// Timeout for a single network probe.
    pub timeout: Duration,
    /// Remote NUT port override (`-p`), default 3493 inside the probe.
    pub port: Option<u16>,
    /// Suppress per-bus progress messages, keep only scan results.
    pub quiet: bool,
    pub display: DisplayMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS),
            port: None,
            quiet: false,
            display: DisplayMode::default(),
        }
    }
}
