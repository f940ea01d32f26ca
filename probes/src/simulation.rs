//! NUT simulation probe.
//!
//! Reports the simulation description files (`*.dev`, `*.seq`) present in
//! the NUT configuration directory.

use std::fs;
use std::path::Path;

use powerscan_common::device::{Bus, Device, DeviceList};
use tracing::debug;

const DEFAULT_CONFPATH: &str = "/etc/nut";

pub fn available() -> bool {
    true
}

pub async fn scan_nut_simulation() -> DeviceList {
    let confpath = std::env::var("NUT_CONFPATH").unwrap_or_else(|_| DEFAULT_CONFPATH.to_string());
    scan_dir(Path::new(&confpath))
}

fn scan_dir(confpath: &Path) -> DeviceList {
    let entries = match fs::read_dir(confpath) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("cannot read simulation directory {}: {e}", confpath.display());
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".dev") || name.ends_with(".seq"))
        .collect();
    names.sort();

    names
        .into_iter()
        .map(|name| Device::new(Bus::NutSimulation, "dummy-ups", name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_simulation_files_are_reported() {
        let dir = std::env::temp_dir().join(format!("powerscan-sim-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("rack.dev"), "battery.charge: 100\n").unwrap();
        fs::write(dir.join("outage.seq"), "").unwrap();
        fs::write(dir.join("ups.conf"), "").unwrap();

        let devices = scan_dir(&dir);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].driver, "dummy-ups");
        assert_eq!(devices[0].port, "outage.seq");
        assert_eq!(devices[1].port, "rack.dev");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_is_an_empty_result() {
        assert!(scan_dir(Path::new("/nonexistent/powerscan-sim")).is_empty());
    }
}
