//! IPMI probe.
//!
//! Over the network this is an RMCP/ASF presence ping (the standard way to
//! ask "is there a BMC at this address") per range address. Without a range
//! the probe falls back to the local in-band device node.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use powerscan_common::device::{Bus, Device, DeviceList};
use powerscan_common::range::IpRange;
use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::debug;

const RMCP_PORT: u16 = 623;
/// RMCP header + ASF presence ping, message tag 0xc8.
const ASF_PING: [u8; 12] = [
    0x06, 0x00, 0xff, 0x06, // RMCP: version, reserved, seq, class ASF
    0x00, 0x00, 0x11, 0xbe, // ASF IANA enterprise number
    0x80, 0xc8, 0x00, 0x00, // presence ping, tag, reserved, data length
];

const LOCAL_DEVICE_NODES: &[&str] = &["/dev/ipmi0", "/dev/ipmi/0", "/dev/ipmidev/0"];

/// IPMI 1.5 authentication types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpmiAuthType {
    None,
    StraightPasswordKey,
    Md2,
    #[default]
    Md5,
}

impl IpmiAuthType {
    /// `-d` argument parsing; an unknown name keeps the MD5 default.
    pub fn parse(arg: &str) -> Option<Self> {
        match arg {
            "NONE" => Some(Self::None),
            "STRAIGHT_PASSWORD_KEY" => Some(Self::StraightPasswordKey),
            "MD2" => Some(Self::Md2),
            "MD5" => Some(Self::Md5),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IpmiOptions {
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_type: IpmiAuthType,
    /// Set only by `-L`; forces IPMI 2.0.
    pub cipher_suite_id: Option<u8>,
}

pub fn available() -> bool {
    true
}

/// `range: None` means the local in-band device.
pub async fn scan_ipmi(
    range: Option<IpRange>,
    probe_timeout: Duration,
    _opts: &IpmiOptions,
) -> DeviceList {
    let Some(range) = range else {
        return local_device();
    };

    let mut tasks: JoinSet<Option<Device>> = JoinSet::new();
    for addr in range.addresses() {
        tasks.spawn(async move {
            let _permit = crate::semaphore::acquire().await;
            ping_one(addr, probe_timeout).await
        });
    }

    let mut devices = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        if let Ok(Some(device)) = joined {
            devices.push(device);
        }
    }
    devices.sort_by(|a, b| a.port.cmp(&b.port));
    devices
}

fn local_device() -> DeviceList {
    let Some(node) = LOCAL_DEVICE_NODES.iter().find(|node| Path::new(node).exists()) else {
        debug!("no local IPMI device node found");
        return Vec::new();
    };

    debug!("local IPMI device node present: {node}");
    vec![Device::new(Bus::Ipmi, "nut-ipmipsu", "id0")]
}

async fn ping_one(addr: IpAddr, probe_timeout: Duration) -> Option<Device> {
    let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(bind_addr).await.ok()?;
    socket.connect((addr, RMCP_PORT)).await.ok()?;
    socket.send(&ASF_PING).await.ok()?;

    let mut buf = [0u8; 256];
    match timeout(probe_timeout, socket.recv(&mut buf)).await {
        Ok(Ok(n)) if is_asf_pong(&buf[..n]) => {
            debug!("BMC answered at {addr}");
            Some(Device::new(Bus::Ipmi, "nut-ipmipsu", addr.to_string()))
        }
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            debug!("IPMI ping of {addr} failed: {e}");
            None
        }
        Err(_elapsed) => None,
    }
}

/// ASF class, presence pong message type.
fn is_asf_pong(reply: &[u8]) -> bool {
    reply.len() >= 9 && reply[0] == 0x06 && reply[3] == 0x06 && reply[8] == 0x40
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_type_names() {
        assert_eq!(IpmiAuthType::parse("NONE"), Some(IpmiAuthType::None));
        assert_eq!(IpmiAuthType::parse("MD2"), Some(IpmiAuthType::Md2));
        assert_eq!(IpmiAuthType::parse("MD5"), Some(IpmiAuthType::Md5));
        assert_eq!(
            IpmiAuthType::parse("STRAIGHT_PASSWORD_KEY"),
            Some(IpmiAuthType::StraightPasswordKey)
        );
        assert_eq!(IpmiAuthType::parse("md5"), None);
        assert_eq!(IpmiAuthType::default(), IpmiAuthType::Md5);
    }

    #[test]
    fn pong_recognition() {
        let mut pong = [0u8; 16];
        pong[0] = 0x06;
        pong[3] = 0x06;
        pong[8] = 0x40;
        assert!(is_asf_pong(&pong));

        assert!(!is_asf_pong(&ASF_PING)); // our own ping is not a pong
        assert!(!is_asf_pong(&[0x06, 0x00]));
    }
}
