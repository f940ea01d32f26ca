//! # Connected-Subnet Auto-Discovery
//!
//! Resolves `-m auto` / `auto4` / `auto6`: walks the local network
//! interfaces and appends one range per connected subnet to the registry.

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;
use tracing::{debug, warn};

use crate::range::{self, RangeRegistry};

/// Address-family filter for auto-discovery, resolved once per process at
/// the first `auto*` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetFamily {
    V4,
    V6,
    Both,
}

impl SubnetFamily {
    pub fn parse(arg: &str) -> Option<Self> {
        match arg {
            "auto" => Some(Self::Both),
            "auto4" => Some(Self::V4),
            "auto6" => Some(Self::V6),
            _ => None,
        }
    }

    fn admits(self, net: &IpNetwork) -> bool {
        match self {
            Self::Both => true,
            Self::V4 => matches!(net, IpNetwork::V4(_)),
            Self::V6 => matches!(net, IpNetwork::V6(_)),
        }
    }
}

/// Appends one range per connected subnet of every viable interface and
/// returns how many were added.
///
/// Link-local subnets are intentionally not filtered out; only loopback,
/// down, not-running and broadcast-incapable interfaces are rejected.
pub fn discover_connected_subnets(family: SubnetFamily, registry: &mut RangeRegistry) -> usize {
    let mut added = 0;

    for interface in datalink::interfaces() {
        if let Err(reason) = viable_for_subnet_scan(&interface) {
            debug!("Auto-discovery skips interface {}: {reason}", interface.name);
            continue;
        }

        for net in &interface.ips {
            if !family.admits(net) {
                continue;
            }

            let subnet = range::network_range(*net);
            debug!("Connected subnet on {}: {subnet}", interface.name);
            registry.add_range(Some(subnet.start), Some(subnet.end));
            added += 1;
        }
    }

    if added == 0 {
        warn!("No connected subnets discovered for automatic scan");
    }
    added
}

fn viable_for_subnet_scan(interface: &NetworkInterface) -> Result<(), &'static str> {
    if !interface.is_up() {
        return Err("interface is down");
    }
    if !interface.is_running() {
        return Err("interface is not running");
    }
    if interface.is_loopback() {
        return Err("loopback interface");
    }
    if !interface.is_broadcast() {
        return Err("interface does not support broadcast");
    }
    Ok(())
}
