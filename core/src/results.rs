//! Per-bus result slots.
//!
//! One named field per bus: each worker writes exactly one slot, and the
//! rendering phase reads and releases them in [`Bus::ALL`] order.

use powerscan_common::device::{Bus, DeviceList};

#[derive(Debug, Default)]
pub struct ScanResults {
    pub usb: DeviceList,
    pub snmp: DeviceList,
    pub xml_http: DeviceList,
    pub nut_bus: DeviceList,
    pub nut_simulation: DeviceList,
    pub avahi: DeviceList,
    pub ipmi: DeviceList,
    pub serial: DeviceList,
}

impl ScanResults {
    pub fn slot(&self, bus: Bus) -> &DeviceList {
        match bus {
            Bus::Usb => &self.usb,
            Bus::Snmp => &self.snmp,
            Bus::XmlHttp => &self.xml_http,
            Bus::NutBus => &self.nut_bus,
            Bus::NutSimulation => &self.nut_simulation,
            Bus::Avahi => &self.avahi,
            Bus::Ipmi => &self.ipmi,
            Bus::Serial => &self.serial,
        }
    }

    pub fn store(&mut self, bus: Bus, devices: DeviceList) {
        *self.slot_mut(bus) = devices;
    }

    /// Hands the slot over for rendering, leaving it released.
    pub fn take(&mut self, bus: Bus) -> DeviceList {
        std::mem::take(self.slot_mut(bus))
    }

    pub fn total(&self) -> usize {
        Bus::ALL.iter().map(|bus| self.slot(*bus).len()).sum()
    }

    fn slot_mut(&mut self, bus: Bus) -> &mut DeviceList {
        match bus {
            Bus::Usb => &mut self.usb,
            Bus::Snmp => &mut self.snmp,
            Bus::XmlHttp => &mut self.xml_http,
            Bus::NutBus => &mut self.nut_bus,
            Bus::NutSimulation => &mut self.nut_simulation,
            Bus::Avahi => &mut self.avahi,
            Bus::Ipmi => &mut self.ipmi,
            Bus::Serial => &mut self.serial,
        }
    }
}
