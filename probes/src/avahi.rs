//! Zeroconf probe.
//!
//! Asks the local network over mDNS for `_nut._tcp` service announcements
//! and reports every announced unit. This replaces a hard dependency on a
//! system zeroconf daemon with a self-contained one-shot query.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use dns_parser::{Builder, Packet, QueryClass, QueryType, RData};
use powerscan_common::device::{Bus, Device, DeviceList};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

const NUT_SERVICE: &str = "_nut._tcp.local";
const MDNS_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);
const MDNS_PORT: u16 = 5353;
/// Fixed query id; mDNS responders ignore it anyway.
const QUERY_ID: u16 = 0;

pub fn available() -> bool {
    true
}

pub async fn scan_avahi(probe_timeout: Duration) -> DeviceList {
    match query(probe_timeout).await {
        Ok(devices) => devices,
        Err(e) => {
            debug!("mDNS service discovery failed: {e}");
            Vec::new()
        }
    }
}

async fn query(probe_timeout: Duration) -> anyhow::Result<DeviceList> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;

    let mut builder = Builder::new_query(QUERY_ID, false);
    builder.add_question(NUT_SERVICE, true, QueryType::PTR, QueryClass::IN);
    let packet = builder.build().unwrap_or_else(|truncated| truncated);

    let group = SocketAddr::new(MDNS_GROUP.into(), MDNS_PORT);
    socket.send_to(&packet, group).await?;

    let mut devices = Vec::new();
    let deadline = tokio::time::Instant::now() + probe_timeout;
    let mut buf = [0u8; 4096];

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining == Duration::ZERO {
            break;
        }
        match timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok((n, peer))) => match extract_announcements(&buf[..n], &peer.ip().to_string()) {
                Ok(found) => devices.extend(found),
                Err(e) => debug!("unparsable mDNS answer from {peer}: {e}"),
            },
            Ok(Err(e)) => {
                debug!("mDNS receive failed: {e}");
                break;
            }
            Err(_elapsed) => break,
        }
    }

    devices.sort_by(|a, b| a.port.cmp(&b.port));
    devices.dedup();
    Ok(devices)
}

/// Turns the PTR/SRV records of one announcement into devices.
fn extract_announcements(data: &[u8], peer: &str) -> anyhow::Result<DeviceList> {
    let packet = Packet::parse(data)?;
    let mut devices = Vec::new();

    for record in packet.answers.iter() {
        let RData::PTR(ptr) = &record.data else {
            continue;
        };
        let instance = ptr.0.to_string();
        let Some(unit) = instance.strip_suffix(&format!(".{NUT_SERVICE}")) else {
            continue;
        };

        // Prefer the announced SRV target over the packet's source address.
        let (host, port) = packet
            .additional
            .iter()
            .find_map(|extra| match &extra.data {
                RData::SRV(srv) => Some((srv.target.to_string(), srv.port)),
                _ => None,
            })
            .unwrap_or_else(|| (peer.to_string(), 0));

        let mut device = Device::new(Bus::Avahi, "nutclient", format!("{unit}@{host}"));
        if port != 0 {
            device = device.with("port", port.to_string());
        }
        devices.push(device);
    }

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_nut_announcements_are_ignored() {
        let mut builder = Builder::new_query(0, false);
        builder.add_question("_ipp._tcp.local", false, QueryType::PTR, QueryClass::IN);
        let query_packet = builder.build().unwrap_or_else(|t| t);

        // A query (no answers) yields nothing, parsable or not.
        let devices = extract_announcements(&query_packet, "10.0.0.5").unwrap();
        assert!(devices.is_empty());
    }

    #[test]
    fn query_asks_for_nut_ptr_records() {
        let mut builder = Builder::new_query(QUERY_ID, false);
        builder.add_question(NUT_SERVICE, true, QueryType::PTR, QueryClass::IN);
        let packet = builder.build().unwrap_or_else(|t| t);

        let parsed = Packet::parse(&packet).unwrap();
        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(parsed.questions[0].qtype, QueryType::PTR);
        assert_eq!(parsed.questions[0].qname.to_string(), NUT_SERVICE);
    }

    #[test]
    fn garbage_is_an_error_not_a_panic() {
        assert!(extract_announcements(b"junk", "10.0.0.5").is_err());
    }
}
