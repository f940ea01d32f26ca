//! NetXML (XML/HTTP) probe.
//!
//! Units speaking the Eaton/MGE NetXML protocol answer a UDP discovery
//! datagram with a short XML description of their HTTP endpoint. With no
//! address range this probe degenerates to a single broadcast query — the
//! protocol's own default discovery mode.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use powerscan_common::device::{Bus, Device, DeviceList};
use powerscan_common::range::IpRange;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

const SCAN_REQUEST: &[u8] = b"<SCAN_REQUEST/>";

#[derive(Debug, Clone)]
pub struct XmlHttpOptions {
    pub port_udp: u16,
    pub port_http: u16,
}

impl Default for XmlHttpOptions {
    fn default() -> Self {
        Self {
            port_udp: 4679,
            port_http: 80,
        }
    }
}

pub fn available() -> bool {
    true
}

/// `range: None` means broadcast discovery.
pub async fn scan_xml_http(
    range: Option<IpRange>,
    probe_timeout: Duration,
    opts: &XmlHttpOptions,
) -> DeviceList {
    match query(range, probe_timeout, opts).await {
        Ok(devices) => devices,
        Err(e) => {
            debug!("XML/HTTP discovery failed: {e}");
            Vec::new()
        }
    }
}

async fn query(
    range: Option<IpRange>,
    probe_timeout: Duration,
    opts: &XmlHttpOptions,
) -> anyhow::Result<DeviceList> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;

    match range {
        None => {
            socket.set_broadcast(true)?;
            let broadcast = SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), opts.port_udp);
            socket.send_to(SCAN_REQUEST, broadcast).await?;
        }
        Some(range) => {
            for addr in range.addresses() {
                let _permit = crate::semaphore::acquire().await;
                if let Err(e) = socket.send_to(SCAN_REQUEST, (addr, opts.port_udp)).await {
                    debug!("XML/HTTP request to {addr} failed: {e}");
                }
            }
        }
    }

    let mut devices = Vec::new();
    let deadline = tokio::time::Instant::now() + probe_timeout;
    let mut buf = [0u8; 2048];

    // Collect every answer arriving before the deadline.
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining == Duration::ZERO {
            break;
        }
        match timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok((n, peer))) => {
                let reply = String::from_utf8_lossy(&buf[..n]).into_owned();
                devices.push(answer_to_device(peer.ip(), &reply, opts));
            }
            Ok(Err(e)) => {
                debug!("XML/HTTP receive failed: {e}");
                break;
            }
            Err(_elapsed) => break,
        }
    }

    devices.sort_by(|a, b| a.port.cmp(&b.port));
    Ok(devices)
}

fn answer_to_device(peer: IpAddr, reply: &str, opts: &XmlHttpOptions) -> Device {
    let mut device = Device::new(
        Bus::XmlHttp,
        "netxml-ups",
        format!("http://{peer}:{}", opts.port_http),
    );
    if let Some(description) = xml_attribute(reply, "description") {
        device = device.with("desc", description);
    }
    device
}

/// Loose single-attribute extraction; the discovery answer is one flat tag.
fn xml_attribute(xml: &str, name: &str) -> Option<String> {
    let key = format!("{name}=\"");
    let start = xml.find(&key)? + key.len();
    let end = xml[start..].find('"')?;
    Some(xml[start..start + end].to_string())
}
