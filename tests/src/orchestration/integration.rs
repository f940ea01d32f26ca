use std::net::IpAddr;
use std::sync::Arc;

use powerscan_common::device::{Bus, Device, DeviceList};
use powerscan_common::range::RangeRegistry;
use powerscan_core::budget::ConcurrencyBudget;
use powerscan_core::options::{Enabled, ScanOptions};
use powerscan_core::orchestrator::{ExecStrategy, Orchestrator};
use powerscan_core::probeset::ProbeSet;

use crate::stubs::StubProbes;

fn addr(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn registry_with(ranges: &[(&str, &str)]) -> RangeRegistry {
    let mut registry = RangeRegistry::new();
    for (start, end) in ranges {
        registry.add_range(Some(addr(start)), Some(addr(end)));
    }
    registry
}

/// Runs a full scan cycle and captures every render call in order.
async fn run_scan(
    probes: Arc<StubProbes>,
    registry: RangeRegistry,
    enabled: Enabled,
    strategy: ExecStrategy,
) -> Vec<(Bus, DeviceList)> {
    let orchestrator = Orchestrator::new(
        probes as Arc<dyn ProbeSet>,
        registry,
        ScanOptions::default(),
        enabled,
        ConcurrencyBudget::resolve(8),
        strategy,
    );

    let mut rendered = Vec::new();
    orchestrator
        .run(|bus, devices| rendered.push((bus, devices.clone())))
        .await
        .unwrap();
    rendered
}

#[tokio::test]
async fn every_bus_is_rendered_once_in_fixed_order() {
    let probes = Arc::new(StubProbes {
        usb_devices: vec![Device::new(Bus::Usb, "usbhid-ups", "auto")],
        ..StubProbes::default()
    });

    let rendered = run_scan(
        Arc::clone(&probes),
        registry_with(&[("10.0.0.1", "10.0.0.3")]),
        Enabled::default(),
        ExecStrategy::Parallel,
    )
    .await;

    let order: Vec<Bus> = rendered.iter().map(|(bus, _)| *bus).collect();
    assert_eq!(order, Bus::ALL);
}

#[tokio::test]
async fn usb_only_scan_reports_both_devices_and_touches_no_other_bus() {
    let probes = Arc::new(StubProbes {
        usb_devices: vec![
            Device::new(Bus::Usb, "usbhid-ups", "auto").with("vendorid", "0463"),
            Device::new(Bus::Usb, "usbhid-ups", "auto").with("vendorid", "051d"),
        ],
        ..StubProbes::default()
    });

    let mut enabled = Enabled::default();
    enabled.set(Bus::Usb, true);

    let rendered = run_scan(
        Arc::clone(&probes),
        RangeRegistry::new(),
        enabled,
        ExecStrategy::Parallel,
    )
    .await;

    let usb = &rendered.iter().find(|(bus, _)| *bus == Bus::Usb).unwrap().1;
    assert_eq!(usb.len(), 2);
    for (bus, devices) in &rendered {
        if *bus != Bus::Usb {
            assert!(devices.is_empty(), "{bus} slot should be empty");
        }
    }
    assert_eq!(probes.calls(), vec![(Bus::Usb, None)]);
}

#[tokio::test]
async fn parallel_and_sequential_runs_render_identically() {
    let make_probes = || {
        Arc::new(StubProbes {
            usb_devices: vec![Device::new(Bus::Usb, "usbhid-ups", "auto")],
            avahi_devices: vec![Device::new(Bus::Avahi, "nutclient", "ups@announced.local")],
            ..StubProbes::default()
        })
    };
    let ranges = [("10.0.0.1", "10.0.0.3"), ("10.0.1.1", "10.0.1.3")];

    let parallel = run_scan(
        make_probes(),
        registry_with(&ranges),
        Enabled::default(),
        ExecStrategy::Parallel,
    )
    .await;
    let sequential = run_scan(
        make_probes(),
        registry_with(&ranges),
        Enabled::default(),
        ExecStrategy::Sequential,
    )
    .await;

    assert_eq!(parallel, sequential);
}

#[tokio::test]
async fn empty_registry_skips_snmp_and_nut_but_probes_xml_and_ipmi_implicitly() {
    let probes = Arc::new(StubProbes::default());

    let rendered = run_scan(
        Arc::clone(&probes),
        RangeRegistry::new(),
        Enabled::default(),
        ExecStrategy::Parallel,
    )
    .await;

    let calls = probes.calls();
    assert!(!calls.iter().any(|(bus, _)| *bus == Bus::Snmp));
    assert!(!calls.iter().any(|(bus, _)| *bus == Bus::NutBus));
    assert!(calls.contains(&(Bus::XmlHttp, None)));
    assert!(calls.contains(&(Bus::Ipmi, None)));

    // The skipped buses still get their (empty) render slot.
    let snmp = rendered.iter().find(|(bus, _)| *bus == Bus::Snmp).unwrap();
    assert!(snmp.1.is_empty());
}

#[tokio::test]
async fn range_oriented_buses_accumulate_most_recent_range_first() {
    let probes = Arc::new(StubProbes::default());

    let rendered = run_scan(
        Arc::clone(&probes),
        registry_with(&[("10.0.0.1", "10.0.0.3"), ("10.0.1.1", "10.0.1.3")]),
        Enabled::default(),
        ExecStrategy::Sequential,
    )
    .await;

    let snmp = &rendered.iter().find(|(bus, _)| *bus == Bus::Snmp).unwrap().1;
    let ports: Vec<&str> = snmp.iter().map(|d| d.port.as_str()).collect();
    assert_eq!(ports, ["10.0.1.1", "10.0.0.1"]);
}

#[tokio::test]
async fn failed_worker_degrades_only_its_own_bus() {
    let probes = Arc::new(StubProbes {
        panic_on: Some(Bus::Snmp),
        usb_devices: vec![Device::new(Bus::Usb, "usbhid-ups", "auto")],
        ..StubProbes::default()
    });

    let rendered = run_scan(
        Arc::clone(&probes),
        registry_with(&[("10.0.0.1", "10.0.0.3")]),
        Enabled::default(),
        ExecStrategy::Parallel,
    )
    .await;

    let snmp = rendered.iter().find(|(bus, _)| *bus == Bus::Snmp).unwrap();
    assert!(snmp.1.is_empty());
    let usb = rendered.iter().find(|(bus, _)| *bus == Bus::Usb).unwrap();
    assert_eq!(usb.1.len(), 1);
}

#[tokio::test]
async fn unsupported_bus_is_skipped_without_a_probe_call() {
    let probes = Arc::new(StubProbes {
        unavailable: vec![Bus::Snmp],
        ..StubProbes::default()
    });

    let mut enabled = Enabled::default();
    enabled.set(Bus::Snmp, true);
    enabled.set(Bus::Usb, true);

    run_scan(
        Arc::clone(&probes),
        registry_with(&[("10.0.0.1", "10.0.0.3")]),
        enabled,
        ExecStrategy::Parallel,
    )
    .await;

    let calls = probes.calls();
    assert!(!calls.iter().any(|(bus, _)| *bus == Bus::Snmp));
    assert!(calls.iter().any(|(bus, _)| *bus == Bus::Usb));
}

#[tokio::test]
async fn explicit_serial_request_reaches_the_serial_probe() {
    let probes = Arc::new(StubProbes::default());

    let mut enabled = Enabled::default();
    enabled.set(Bus::Serial, true);

    let mut options = ScanOptions::default();
    options.serial_ports = Some("ttyS0,ttyS1".to_string());

    let orchestrator = Orchestrator::new(
        Arc::clone(&probes) as Arc<dyn ProbeSet>,
        RangeRegistry::new(),
        options,
        enabled,
        ConcurrencyBudget::resolve(8),
        ExecStrategy::Sequential,
    );

    let mut rendered = Vec::new();
    orchestrator
        .run(|bus, devices| rendered.push((bus, devices.clone())))
        .await
        .unwrap();

    let serial = &rendered.iter().find(|(bus, _)| *bus == Bus::Serial).unwrap().1;
    let ports: Vec<&str> = serial.iter().map(|d| d.port.as_str()).collect();
    assert_eq!(ports, ["ttyS0", "ttyS1"]);
}
