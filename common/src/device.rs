//! # Device Model
//!
//! A discovered power device and the closed roster of scan buses.
//!
//! The bus roster is fixed at build time: every run owns exactly one result
//! list per bus, and results are always reported in [`Bus::ALL`] order so the
//! output is reproducible no matter which scan finished first.

use std::fmt;

/// One protocol-specific scan engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bus {
    Usb,
    Snmp,
    XmlHttp,
    NutBus,
    NutSimulation,
    Avahi,
    Ipmi,
    Serial,
}

impl Bus {
    /// Fixed reporting order.
    pub const ALL: [Bus; 8] = [
        Bus::Usb,
        Bus::Snmp,
        Bus::XmlHttp,
        Bus::NutBus,
        Bus::NutSimulation,
        Bus::Avahi,
        Bus::Ipmi,
        Bus::Serial,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Bus::Usb => "USB",
            Bus::Snmp => "SNMP",
            Bus::XmlHttp => "XML/HTTP",
            Bus::NutBus => "NUT bus (old)",
            Bus::NutSimulation => "NUT simulation devices",
            Bus::Avahi => "NUT bus (avahi)",
            Bus::Ipmi => "IPMI",
            Bus::Serial => "serial",
        }
    }

    /// Buses whose probing targets are address ranges rather than local
    /// enumeration.
    pub fn is_range_oriented(self) -> bool {
        matches!(self, Bus::Snmp | Bus::XmlHttp | Bus::NutBus | Bus::Ipmi)
    }

    /// Range-oriented buses that still have a meaningful probe with no range
    /// at all: XML/HTTP falls back to broadcast discovery and IPMI to the
    /// local in-band device. SNMP and the NUT bus have no such default and
    /// are skipped when the registry is empty.
    pub fn has_implicit_target(self) -> bool {
        matches!(self, Bus::XmlHttp | Bus::Ipmi)
    }
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A discovered unit, opaque to the orchestration core beyond its bus.
///
/// `driver` and `port` map directly onto a `ups.conf` section; anything
/// protocol-specific the probe wants rendered goes into `extra` in the order
/// it should appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub bus: Bus,
    pub driver: String,
    pub port: String,
    pub extra: Vec<(String, String)>,
}

impl Device {
    pub fn new(bus: Bus, driver: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            bus,
            driver: driver.into(),
            port: port.into(),
            extra: Vec::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }
}

/// Per-bus accumulated scan result. Empty means "nothing found", never an
/// error.
pub type DeviceList = Vec<Device>;
