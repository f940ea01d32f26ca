//! Backend workers.
//!
//! All eight buses share one worker shape: range-oriented buses iterate the
//! registry in insertion order and fold each range's result into their
//! accumulator; the rest call their single entry point once. XML/HTTP and
//! IPMI keep a meaningful probe with an empty registry (broadcast / local
//! device); the empty-registry skip for SNMP and the NUT bus is decided by
//! the orchestrator before the worker ever runs.

use std::future::Future;

use powerscan_common::device::{Bus, DeviceList};
use powerscan_common::range::{IpRange, RangeRegistry};
use tracing::debug;

use crate::merge::merge_devices;
use crate::options::ScanOptions;
use crate::probeset::ProbeSet;

/// Runs one bus worker to completion and returns its accumulated list.
pub async fn run_backend(
    bus: Bus,
    probes: &dyn ProbeSet,
    registry: &RangeRegistry,
    opts: &ScanOptions,
) -> DeviceList {
    debug!("Entering {bus} worker for {} IP address range(s)", registry.len());
    let timeout = opts.config.timeout;

    let found = match bus {
        Bus::Usb => probes.usb(&opts.usb).await,

        Bus::Snmp => range_loop(registry, |range| probes.snmp(range, timeout, &opts.snmp)).await,

        Bus::XmlHttp => {
            if registry.is_empty() {
                probes.xml_http(None, timeout, &opts.xml_http).await
            } else {
                range_loop(registry, |range| {
                    probes.xml_http(Some(range), timeout, &opts.xml_http)
                })
                .await
            }
        }

        Bus::NutBus => {
            range_loop(registry, |range| {
                probes.nut_bus(range, opts.config.port, timeout)
            })
            .await
        }

        Bus::NutSimulation => probes.nut_simulation().await,

        Bus::Avahi => probes.avahi(timeout).await,

        Bus::Ipmi => {
            if registry.is_empty() {
                probes.ipmi(None, timeout, &opts.ipmi).await
            } else {
                range_loop(registry, |range| {
                    probes.ipmi(Some(range), timeout, &opts.ipmi)
                })
                .await
            }
        }

        Bus::Serial => {
            probes
                .serial(opts.serial_ports.as_deref().unwrap_or(""))
                .await
        }
    };

    debug!("Finished {bus} worker: {} device(s)", found.len());
    found
}

/// The shared range-iteration shape: scan each range, fold into the
/// accumulator.
async fn range_loop<F, Fut>(registry: &RangeRegistry, mut scan: F) -> DeviceList
where
    F: FnMut(IpRange) -> Fut,
    Fut: Future<Output = DeviceList>,
{
    let mut acc = Vec::new();
    for range in registry.iter() {
        let fresh = scan(*range).await;
        acc = merge_devices(fresh, acc);
    }
    acc
}
