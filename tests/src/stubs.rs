//! Deterministic probe stubs for exercising the orchestration core without
//! any real network or hardware access.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use powerscan_common::device::{Bus, Device, DeviceList};
use powerscan_common::range::IpRange;
use powerscan_core::probeset::ProbeSet;
use powerscan_probes::ipmi::IpmiOptions;
use powerscan_probes::snmp::SnmpOptions;
use powerscan_probes::usb::UsbOptions;
use powerscan_probes::xml_http::XmlHttpOptions;

/// One recorded probe invocation: the bus and the range it was asked to
/// cover, if any.
pub type Call = (Bus, Option<IpRange>);

/// A probe set returning canned devices.
///
/// Range-oriented buses answer with one device per invoked range (its port
/// set to the range start), so tests can observe both which ranges were
/// visited and in which order results accumulate. Implicit-target probes
/// (no range) report a fixed placeholder port.
#[derive(Default)]
pub struct StubProbes {
    /// Buses reported as unsupported by `available`.
    pub unavailable: Vec<Bus>,
    /// Bus whose scan panics, for worker-failure tests.
    pub panic_on: Option<Bus>,
    pub usb_devices: DeviceList,
    pub simulation_devices: DeviceList,
    pub avahi_devices: DeviceList,
    pub calls: Mutex<Vec<Call>>,
}

impl StubProbes {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, bus: Bus, range: Option<IpRange>) {
        if self.panic_on == Some(bus) {
            panic!("{bus} probe deliberately failed");
        }
        self.calls.lock().unwrap().push((bus, range));
    }

    fn range_device(bus: Bus, driver: &str, range: Option<IpRange>) -> DeviceList {
        let port = match range {
            Some(range) => range.start.to_string(),
            None => "implicit".to_string(),
        };
        vec![Device::new(bus, driver, port)]
    }
}

#[async_trait]
impl ProbeSet for StubProbes {
    fn available(&self, bus: Bus) -> bool {
        !self.unavailable.contains(&bus)
    }

    async fn usb(&self, _opts: &UsbOptions) -> DeviceList {
        self.record(Bus::Usb, None);
        self.usb_devices.clone()
    }

    async fn snmp(&self, range: IpRange, _timeout: Duration, _opts: &SnmpOptions) -> DeviceList {
        self.record(Bus::Snmp, Some(range));
        Self::range_device(Bus::Snmp, "snmp-ups", Some(range))
    }

    async fn xml_http(
        &self,
        range: Option<IpRange>,
        _timeout: Duration,
        _opts: &XmlHttpOptions,
    ) -> DeviceList {
        self.record(Bus::XmlHttp, range);
        Self::range_device(Bus::XmlHttp, "netxml-ups", range)
    }

    async fn nut_bus(&self, range: IpRange, _port: Option<u16>, _timeout: Duration) -> DeviceList {
        self.record(Bus::NutBus, Some(range));
        Self::range_device(Bus::NutBus, "nutclient", Some(range))
    }

    async fn nut_simulation(&self) -> DeviceList {
        self.record(Bus::NutSimulation, None);
        self.simulation_devices.clone()
    }

    async fn avahi(&self, _timeout: Duration) -> DeviceList {
        self.record(Bus::Avahi, None);
        self.avahi_devices.clone()
    }

    async fn ipmi(
        &self,
        range: Option<IpRange>,
        _timeout: Duration,
        _opts: &IpmiOptions,
    ) -> DeviceList {
        self.record(Bus::Ipmi, range);
        Self::range_device(Bus::Ipmi, "nut-ipmipsu", range)
    }

    async fn serial(&self, ports: &str) -> DeviceList {
        self.record(Bus::Serial, None);
        ports
            .split(',')
            .filter(|p| !p.is_empty())
            .map(|p| Device::new(Bus::Serial, "mge-shut", p))
            .collect()
    }
}
