//! # Address Range Registry
//!
//! Accumulates the ordered set of `[start .. end]` address pairs that the
//! range-oriented buses walk. Insertion order is scan order; duplicates and
//! overlaps are kept as given.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

use anyhow::anyhow;
use pnet::ipnetwork::IpNetwork;
use tracing::debug;

/// An inclusive address range. A single address is the range where both ends
/// are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpRange {
    pub start: IpAddr,
    pub end: IpAddr,
}

impl IpRange {
    pub fn new(start: IpAddr, end: IpAddr) -> Self {
        Self { start, end }
    }

    pub fn single(addr: IpAddr) -> Self {
        Self { start: addr, end: addr }
    }

    /// Walks every address of the range in order. An inverted range is
    /// empty; a mixed-family range degenerates to the start address alone.
    pub fn addresses(&self) -> Box<dyn Iterator<Item = IpAddr> + Send> {
        match (self.start, self.end) {
            (IpAddr::V4(start), IpAddr::V4(end)) => {
                let (start, end) = (u32::from(start), u32::from(end));
                Box::new((start..=end).map(|ip| IpAddr::V4(ip.into())))
            }
            (IpAddr::V6(start), IpAddr::V6(end)) => {
                let (start, end) = (u128::from(start), u128::from(end));
                Box::new((start..=end).map(|ip| IpAddr::V6(ip.into())))
            }
            (start, end) => {
                debug!("range {start}..{end} mixes address families, using start only");
                Box::new(std::iter::once(start))
            }
        }
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.start, self.end)
    }
}

/// Ordered, append-only sequence of ranges to scan.
///
/// An empty registry is a valid state: "no network ranges requested".
#[derive(Debug, Default)]
pub struct RangeRegistry {
    ranges: Vec<IpRange>,
}

impl RangeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a range and returns the new count. With both ends absent this
    /// is a no-op; with only one end given, the other is set equal to it
    /// before storage.
    pub fn add_range(&mut self, start: Option<IpAddr>, end: Option<IpAddr>) -> usize {
        let range = match (start, end) {
            (None, None) => {
                debug!("skip range, no addresses were provided");
                return self.ranges.len();
            }
            (Some(start), None) => {
                debug!("only start address was provided, setting end to same: {start}");
                IpRange::single(start)
            }
            (None, Some(end)) => {
                debug!("only end address was provided, setting start to same: {end}");
                IpRange::single(end)
            }
            (Some(start), Some(end)) => IpRange::new(start, end),
        };

        self.ranges.push(range);
        debug!("Recorded IP address range #{}: {range}", self.ranges.len());
        self.ranges.len()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpRange> {
        self.ranges.iter()
    }

    /// Releases every recorded range.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}

/// Expands CIDR notation (v4 or v6) into the inclusive network..broadcast
/// range, e.g. `10.0.0.0/30` => `[10.0.0.0 .. 10.0.0.3]`.
pub fn cidr_to_range(cidr: &str) -> anyhow::Result<IpRange> {
    let net: IpNetwork = cidr
        .parse()
        .map_err(|e| anyhow!("cannot parse CIDR '{cidr}': {e}"))?;
    Ok(network_range(net))
}

/// Inclusive bounds of a subnet.
pub fn network_range(net: IpNetwork) -> IpRange {
    match net {
        IpNetwork::V4(v4) => IpRange::new(v4.network().into(), v4.broadcast().into()),
        IpNetwork::V6(v6) => {
            let base = u128::from(v6.network());
            let end = if v6.prefix() >= 128 {
                base
            } else {
                base | (u128::MAX >> v6.prefix())
            };
            IpRange::new(v6.network().into(), Ipv6Addr::from(end).into())
        }
    }
}
