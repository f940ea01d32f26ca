//! Result rendering.
//!
//! Discovered devices go to stdout in one of three shapes: `ups.conf`
//! sections (with or without sanity-check comments) or one parsable line
//! per device. Section numbering is global across buses, so a complete
//! run yields `[nutdev1]`, `[nutdev2]`, ... regardless of which bus each
//! device came from.

use powerscan_common::config::DisplayMode;
use powerscan_common::device::{Bus, DeviceList};

/// Short machine-oriented bus token, used by the parsable format and the
/// `--available` listing.
pub fn bus_token(bus: Bus) -> &'static str {
    match bus {
        Bus::Usb => "USB",
        Bus::Snmp => "SNMP",
        Bus::XmlHttp => "XML",
        Bus::NutBus => "NUT",
        Bus::NutSimulation => "NUT_SIMULATION",
        Bus::Avahi => "AVAHI",
        Bus::Ipmi => "IPMI",
        Bus::Serial => "EATON_SERIAL",
    }
}

pub struct Renderer {
    mode: DisplayMode,
    /// Global `nutdev` section counter, shared by all buses in a run.
    counter: usize,
    /// (driver, port) pairs already rendered, for duplicate warnings.
    seen: Vec<(String, String)>,
}

impl Renderer {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            counter: 0,
            seen: Vec::new(),
        }
    }

    pub fn render(&mut self, bus: Bus, devices: &DeviceList) {
        let out = self.format(bus, devices);
        if !out.is_empty() {
            print!("{out}");
        }
    }

    /// Renders one bus result to a string. Empty lists render to nothing.
    pub fn format(&mut self, bus: Bus, devices: &DeviceList) -> String {
        let mut out = String::new();
        for device in devices {
            match self.mode {
                DisplayMode::Parsable => {
                    out.push_str(&format!(
                        "{}:driver=\"{}\",port=\"{}\"",
                        bus_token(bus),
                        device.driver,
                        device.port
                    ));
                    for (key, value) in &device.extra {
                        out.push_str(&format!(",{key}=\"{value}\""));
                    }
                    out.push('\n');
                }
                DisplayMode::UpsConf | DisplayMode::UpsConfWithSanityCheck => {
                    self.counter += 1;
                    if self.mode == DisplayMode::UpsConfWithSanityCheck {
                        let pair = (device.driver.clone(), device.port.clone());
                        if self.seen.contains(&pair) {
                            out.push_str(&format!(
                                "# WARNING: multiple devices reported with driver = \"{}\" \
                                 and port = \"{}\"; only one of them can be monitored under \
                                 this section name\n",
                                device.driver, device.port
                            ));
                        }
                        self.seen.push(pair);
                    }
                    out.push_str(&format!("[nutdev{}]\n", self.counter));
                    out.push_str(&format!("\tdriver = \"{}\"\n", device.driver));
                    out.push_str(&format!("\tport = \"{}\"\n", device.port));
                    for (key, value) in &device.extra {
                        out.push_str(&format!("\t{key} = \"{value}\"\n"));
                    }
                    out.push('\n');
                }
            }
        }
        out
    }
}
