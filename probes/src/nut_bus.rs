//! NUT bus probe (classic upsd connect method).
//!
//! Connects to the NUT TCP port on every address of a range and asks the
//! daemon to list its units.

use std::net::IpAddr;
use std::time::Duration;

use powerscan_common::device::{Bus, Device, DeviceList};
use powerscan_common::range::IpRange;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::debug;

const DEFAULT_NUT_PORT: u16 = 3493;
const LIST_UPS: &[u8] = b"LIST UPS\n";

pub fn available() -> bool {
    true
}

pub async fn scan_nut_bus(range: IpRange, port: Option<u16>, probe_timeout: Duration) -> DeviceList {
    let port = port.unwrap_or(DEFAULT_NUT_PORT);
    let mut tasks: JoinSet<DeviceList> = JoinSet::new();

    for addr in range.addresses() {
        tasks.spawn(async move {
            let _permit = crate::semaphore::acquire().await;
            match probe_one(addr, port, probe_timeout).await {
                Ok(devices) => devices,
                Err(e) => {
                    debug!("NUT bus probe of {addr}:{port} failed: {e}");
                    Vec::new()
                }
            }
        });
    }

    let mut devices = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        if let Ok(found) = joined {
            devices.extend(found);
        }
    }
    devices.sort_by(|a, b| a.port.cmp(&b.port));
    devices
}

async fn probe_one(addr: IpAddr, port: u16, probe_timeout: Duration) -> anyhow::Result<DeviceList> {
    let mut stream = timeout(probe_timeout, TcpStream::connect((addr, port))).await??;
    stream.write_all(LIST_UPS).await?;

    let mut reply = String::new();
    let mut buf = [0u8; 1024];
    let deadline = tokio::time::Instant::now() + probe_timeout;

    while !reply.contains("END LIST UPS") {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining == Duration::ZERO {
            break;
        }
        match timeout(remaining, stream.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => reply.push_str(&String::from_utf8_lossy(&buf[..n])),
            Ok(Err(e)) => return Err(e.into()),
            Err(_elapsed) => break,
        }
    }

    Ok(parse_ups_listing(&reply, &addr.to_string()))
}

/// Parses `UPS <name> "<description>"` lines of a LIST UPS answer.
fn parse_ups_listing(reply: &str, host: &str) -> DeviceList {
    let mut devices = Vec::new();

    for line in reply.lines() {
        let Some(rest) = line.strip_prefix("UPS ") else {
            continue;
        };
        let (name, description) = match rest.split_once(' ') {
            Some((name, tail)) => (name, tail.trim().trim_matches('"')),
            None => (rest.trim(), ""),
        };
        if name.is_empty() {
            continue;
        }

        let mut device = Device::new(Bus::NutBus, "nutclient", format!("{name}@{host}"));
        if !description.is_empty() {
            device = device.with("desc", description);
        }
        devices.push(device);
    }

    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_lines_become_devices() {
        let reply = concat!(
            "BEGIN LIST UPS\n",
            "UPS rack1 \"Eaton 9PX rack unit\"\n",
            "UPS rack2 \"\"\n",
            "END LIST UPS\n",
        );

        let devices = parse_ups_listing(reply, "10.0.0.9");
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].port, "rack1@10.0.0.9");
        assert!(devices[0].extra.contains(&("desc".into(), "Eaton 9PX rack unit".into())));
        assert_eq!(devices[1].port, "rack2@10.0.0.9");
        assert!(devices[1].extra.is_empty());
    }

    #[test]
    fn noise_lines_are_ignored() {
        assert!(parse_ups_listing("ERR ACCESS-DENIED\n", "h").is_empty());
        assert!(parse_ups_listing("", "h").is_empty());
        assert!(parse_ups_listing("UPS \n", "h").is_empty());
    }
}
