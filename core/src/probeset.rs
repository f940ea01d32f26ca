//! The collaborator boundary.
//!
//! Workers talk to their protocol engines only through [`ProbeSet`], so the
//! orchestration core can be exercised with deterministic stubs and the
//! probe implementations stay swappable.

use std::time::Duration;

use async_trait::async_trait;
use powerscan_common::device::{Bus, DeviceList};
use powerscan_common::range::IpRange;
use powerscan_probes::ipmi::IpmiOptions;
use powerscan_probes::snmp::SnmpOptions;
use powerscan_probes::usb::UsbOptions;
use powerscan_probes::xml_http::XmlHttpOptions;

/// One method per collaborator scan entry point. Absent range bounds mean
/// the backend's implicit default target. "Nothing found" is an empty list,
/// never an error.
#[async_trait]
pub trait ProbeSet: Send + Sync {
    /// Build/runtime support for a bus.
    fn available(&self, bus: Bus) -> bool;

    async fn usb(&self, opts: &UsbOptions) -> DeviceList;
    async fn snmp(&self, range: IpRange, timeout: Duration, opts: &SnmpOptions) -> DeviceList;
    async fn xml_http(
        &self,
        range: Option<IpRange>,
        timeout: Duration,
        opts: &XmlHttpOptions,
    ) -> DeviceList;
    async fn nut_bus(&self, range: IpRange, port: Option<u16>, timeout: Duration) -> DeviceList;
    async fn nut_simulation(&self) -> DeviceList;
    async fn avahi(&self, timeout: Duration) -> DeviceList;
    async fn ipmi(&self, range: Option<IpRange>, timeout: Duration, opts: &IpmiOptions)
        -> DeviceList;
    async fn serial(&self, ports: &str) -> DeviceList;
}

/// The production probe engines.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealProbes;

#[async_trait]
impl ProbeSet for RealProbes {
    fn available(&self, bus: Bus) -> bool {
        match bus {
            Bus::Usb => powerscan_probes::usb::available(),
            Bus::Snmp => powerscan_probes::snmp::available(),
            Bus::XmlHttp => powerscan_probes::xml_http::available(),
            Bus::NutBus => powerscan_probes::nut_bus::available(),
            Bus::NutSimulation => powerscan_probes::simulation::available(),
            Bus::Avahi => powerscan_probes::avahi::available(),
            Bus::Ipmi => powerscan_probes::ipmi::available(),
            Bus::Serial => powerscan_probes::serial::available(),
        }
    }

    async fn usb(&self, opts: &UsbOptions) -> DeviceList {
        powerscan_probes::usb::scan_usb(opts).await
    }

    async fn snmp(&self, range: IpRange, timeout: Duration, opts: &SnmpOptions) -> DeviceList {
        powerscan_probes::snmp::scan_snmp(range, timeout, opts).await
    }

    async fn xml_http(
        &self,
        range: Option<IpRange>,
        timeout: Duration,
        opts: &XmlHttpOptions,
    ) -> DeviceList {
        powerscan_probes::xml_http::scan_xml_http(range, timeout, opts).await
    }

    async fn nut_bus(&self, range: IpRange, port: Option<u16>, timeout: Duration) -> DeviceList {
        powerscan_probes::nut_bus::scan_nut_bus(range, port, timeout).await
    }

    async fn nut_simulation(&self) -> DeviceList {
        powerscan_probes::simulation::scan_nut_simulation().await
    }

    async fn avahi(&self, timeout: Duration) -> DeviceList {
        powerscan_probes::avahi::scan_avahi(timeout).await
    }

    async fn ipmi(
        &self,
        range: Option<IpRange>,
        timeout: Duration,
        opts: &IpmiOptions,
    ) -> DeviceList {
        powerscan_probes::ipmi::scan_ipmi(range, timeout, opts).await
    }

    async fn serial(&self, ports: &str) -> DeviceList {
        powerscan_probes::serial::scan_serial(ports).await
    }
}
