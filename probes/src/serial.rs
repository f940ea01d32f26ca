//! Serial probe.
//!
//! Never enabled implicitly: opening serial ports is slow and can disturb
//! whatever is attached to them, so the operator lists the ports to try
//! (`-E`). A port that can be opened read/write is reported as a candidate
//! for the serial UPS protocols (SHUT, XCP, Q1).

use std::fs::OpenOptions;
use std::path::PathBuf;

use powerscan_common::device::{Bus, Device, DeviceList};
use tracing::debug;

pub fn available() -> bool {
    cfg!(unix)
}

/// `ports` is the operator-supplied comma-separated list; each entry is a
/// device path, a device name, or a bare port number.
pub async fn scan_serial(ports: &str) -> DeviceList {
    let mut devices = Vec::new();

    for token in ports.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let path = device_path(token);
        match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(_handle) => {
                debug!("serial port {} is openable", path.display());
                devices.push(Device::new(
                    Bus::Serial,
                    "mge-shut",
                    path.display().to_string(),
                ));
            }
            Err(e) => debug!("serial port {} skipped: {e}", path.display()),
        }
    }

    devices
}

/// Expands the short forms the original tool accepted: a bare number means
/// `/dev/ttyS<n>`, a bare name is rooted under `/dev`.
fn device_path(token: &str) -> PathBuf {
    if token.chars().all(|c| c.is_ascii_digit()) {
        return PathBuf::from(format!("/dev/ttyS{token}"));
    }
    if token.starts_with('/') {
        return PathBuf::from(token);
    }
    PathBuf::from("/dev").join(token)
}
