//! USB enumeration probe.
//!
//! Walks sysfs (`/sys/bus/usb/devices`) and reports devices whose vendor ID
//! belongs to a known UPS manufacturer. No USB traffic is generated.

use std::fs;
use std::path::Path;

use powerscan_common::device::{Bus, Device, DeviceList};
use tracing::debug;

const SYSFS_USB_ROOT: &str = "/sys/bus/usb/devices";

/// Vendor IDs of UPS manufacturers and the driver handling them.
const UPS_VENDORS: &[(u16, &str)] = &[
    (0x0463, "usbhid-ups"), // MGE / Eaton
    (0x047c, "usbhid-ups"), // Dell rebranded
    (0x050d, "usbhid-ups"), // Belkin
    (0x051d, "usbhid-ups"), // APC
    (0x0592, "usbhid-ups"), // Powerware
    (0x06da, "nutdrv_qx"),  // Phoenixtec
    (0x0665, "nutdrv_qx"),  // Cypress / Q1 clones
    (0x0764, "usbhid-ups"), // CyberPower
    (0x09ae, "usbhid-ups"), // Tripp Lite
    (0x10af, "usbhid-ups"), // Liebert
];

/// How much change-prone physical detail (bus/device/busport numbers) gets
/// reported; raised by repeating `-U`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsbOptions {
    pub link_detail_level: u8,
}

pub fn available() -> bool {
    Path::new(SYSFS_USB_ROOT).is_dir()
}

pub async fn scan_usb(opts: &UsbOptions) -> DeviceList {
    match enumerate(Path::new(SYSFS_USB_ROOT), opts) {
        Ok(devices) => devices,
        Err(e) => {
            debug!("USB enumeration failed: {e}");
            Vec::new()
        }
    }
}

fn enumerate(root: &Path, opts: &UsbOptions) -> anyhow::Result<DeviceList> {
    let mut devices = Vec::new();

    let mut entries: Vec<_> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        let Some(vendor_id) = read_hex_attr(&path, "idVendor") else {
            continue;
        };
        let Some((_, driver)) = UPS_VENDORS.iter().find(|(vid, _)| *vid == vendor_id) else {
            continue;
        };

        let mut device = Device::new(Bus::Usb, *driver, "auto")
            .with("vendorid", format!("{vendor_id:04x}"));
        if let Some(product_id) = read_hex_attr(&path, "idProduct") {
            device = device.with("productid", format!("{product_id:04x}"));
        }
        if let Some(product) = read_attr(&path, "product") {
            device = device.with("product", product);
        }
        if let Some(serial) = read_attr(&path, "serial") {
            device = device.with("serial", serial);
        }
        if let Some(vendor) = read_attr(&path, "manufacturer") {
            device = device.with("vendor", vendor);
        }

        device = with_link_details(device, &path, opts.link_detail_level);
        devices.push(device);
    }

    Ok(devices)
}

fn with_link_details(mut device: Device, path: &Path, level: u8) -> Device {
    if level >= 1 {
        if let Some(bus) = read_attr(path, "busnum") {
            device = device.with("bus", bus);
        }
    }
    if level >= 2 {
        if let Some(devnum) = read_attr(path, "devnum") {
            device = device.with("device", devnum);
        }
    }
    if level >= 3 {
        if let Some(bcd) = read_attr(path, "bcdDevice") {
            device = device.with("bcdDevice", bcd);
        }
    }
    device
}

fn read_attr(dir: &Path, name: &str) -> Option<String> {
    let raw = fs::read_to_string(dir.join(name)).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn read_hex_attr(dir: &Path, name: &str) -> Option<u16> {
    u16::from_str_radix(&read_attr(dir, name)?, 16).ok()
}
