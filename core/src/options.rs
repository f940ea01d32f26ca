//! Per-run enablement flags and backend option records.

use powerscan_common::config::Config;
use powerscan_common::device::Bus;
use powerscan_probes::ipmi::IpmiOptions;
use powerscan_probes::snmp::SnmpOptions;
use powerscan_probes::usb::UsbOptions;
use powerscan_probes::xml_http::XmlHttpOptions;

/// Which buses this run scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Enabled {
    pub usb: bool,
    pub snmp: bool,
    pub xml_http: bool,
    pub nut_bus: bool,
    pub nut_simulation: bool,
    pub avahi: bool,
    pub ipmi: bool,
    pub serial: bool,
}

impl Enabled {
    /// "Scan everything reasonable": every bus except serial, which must be
    /// requested explicitly because probing it is slow and disruptive.
    pub fn all_except_serial() -> Self {
        Self {
            usb: true,
            snmp: true,
            xml_http: true,
            nut_bus: true,
            nut_simulation: true,
            avahi: true,
            ipmi: true,
            serial: false,
        }
    }

    /// With no explicit request, fall back to the implicit full scan.
    pub fn resolve(explicit: Self) -> Self {
        if explicit == Self::default() {
            Self::all_except_serial()
        } else {
            explicit
        }
    }

    pub fn get(&self, bus: Bus) -> bool {
        match bus {
            Bus::Usb => self.usb,
            Bus::Snmp => self.snmp,
            Bus::XmlHttp => self.xml_http,
            Bus::NutBus => self.nut_bus,
            Bus::NutSimulation => self.nut_simulation,
            Bus::Avahi => self.avahi,
            Bus::Ipmi => self.ipmi,
            Bus::Serial => self.serial,
        }
    }

    pub fn set(&mut self, bus: Bus, on: bool) {
        match bus {
            Bus::Usb => self.usb = on,
            Bus::Snmp => self.snmp = on,
            Bus::XmlHttp => self.xml_http = on,
            Bus::NutBus => self.nut_bus = on,
            Bus::NutSimulation => self.nut_simulation = on,
            Bus::Avahi => self.avahi = on,
            Bus::Ipmi => self.ipmi = on,
            Bus::Serial => self.serial = on,
        }
    }

    /// Currently enabled buses, in roster order.
    pub fn requested(&self) -> Vec<Bus> {
        Bus::ALL.into_iter().filter(|bus| self.get(*bus)).collect()
    }
}

/// Everything a backend worker needs besides the range registry.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub config: Config,
    pub usb: UsbOptions,
    pub snmp: SnmpOptions,
    pub xml_http: XmlHttpOptions,
    pub ipmi: IpmiOptions,
    /// Comma-separated serial port list from `-E`.
    pub serial_ports: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_enablement_excludes_serial() {
        let resolved = Enabled::resolve(Enabled::default());
        for bus in Bus::ALL {
            assert_eq!(resolved.get(bus), bus != Bus::Serial, "{bus}");
        }
    }

    #[test]
    fn explicit_request_disables_the_implicit_full_scan() {
        let mut explicit = Enabled::default();
        explicit.set(Bus::Usb, true);

        let resolved = Enabled::resolve(explicit);
        assert!(resolved.get(Bus::Usb));
        assert!(!resolved.get(Bus::Snmp));
        assert_eq!(resolved.requested(), vec![Bus::Usb]);
    }
}
