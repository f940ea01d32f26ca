use clap::{ArgAction, Parser};
use powerscan_common::config::{Config, DEFAULT_NETWORK_TIMEOUT_SECS, DisplayMode};
use powerscan_common::device::Bus;
use powerscan_common::error::UsageError;
use powerscan_common::interface::{self, SubnetFamily};
use powerscan_common::range::{self, RangeRegistry};
use powerscan_core::options::{Enabled, ScanOptions};
use powerscan_probes::ipmi::IpmiAuthType;
use std::net::IpAddr;
use std::time::Duration;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    name = "powerscan",
    about = "Detects available power devices (UPS, PDU) on all supported buses.",
    disable_version_flag = true
)]
pub struct CommandLine {
    /// Scan all available buses except serial ports (default when nothing is requested)
    #[arg(short = 'C', long = "complete_scan")]
    pub complete_scan: bool,

    /// Scan USB devices; repeat for more change-prone physical detail
    #[arg(short = 'U', long = "usb_scan", action = ArgAction::Count)]
    pub usb_scan: u8,

    /// Scan SNMP devices
    #[arg(short = 'S', long = "snmp_scan")]
    pub snmp_scan: bool,

    /// Scan XML/HTTP devices
    #[arg(short = 'M', long = "xml_scan")]
    pub xml_scan: bool,

    /// Scan NUT devices (classic upsd connect method)
    #[arg(short = 'O', long = "oldnut_scan")]
    pub oldnut_scan: bool,

    /// Scan NUT devices announced over zeroconf
    #[arg(short = 'A', long = "avahi_scan")]
    pub avahi_scan: bool,

    /// Scan NUT simulated devices (.dev files in the config directory)
    #[arg(short = 'n', long = "nut_simulation_scan")]
    pub nut_simulation_scan: bool,

    /// Scan IPMI devices
    #[arg(short = 'I', long = "ipmi_scan")]
    pub ipmi_scan: bool,

    /// Scan serial power devices on the listed ports; never enabled implicitly
    #[arg(short = 'E', long = "eaton_serial", value_name = "SERIAL PORTS")]
    pub eaton_serial: Option<String>,

    /// First IP address of a range; repeatable
    #[arg(short = 's', long = "start_ip", value_name = "IP ADDRESS")]
    pub start_ip: Vec<String>,

    /// Last IP address of a range; repeatable
    #[arg(short = 'e', long = "end_ip", value_name = "IP ADDRESS")]
    pub end_ip: Vec<String>,

    /// IP range in CIDR notation, or auto/auto4/auto6 for connected subnets; repeatable
    #[arg(short = 'm', long = "mask_cidr", value_name = "CIDR")]
    pub mask_cidr: Vec<String>,

    /// Network operation timeout in seconds
    #[arg(short = 't', long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<String>,

    /// Limit the number of simultaneously outstanding scan units
    #[arg(short = 'T', long = "thread", value_name = "COUNT")]
    pub thread: Option<String>,

    /// Port number of the remote NUT upsd
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// SNMP v1 community name (default: public)
    #[arg(short = 'c', long = "community", value_name = "COMMUNITY")]
    pub community: Option<String>,

    /// SNMPv3 security level (noAuthNoPriv, authNoPriv, authPriv)
    #[arg(short = 'l', long = "secLevel", value_name = "SECURITY LEVEL")]
    pub sec_level: Option<String>,

    /// SNMPv3 security name
    #[arg(short = 'u', long = "secName", value_name = "SECURITY NAME")]
    pub sec_name: Option<String>,

    /// SNMPv3 authentication pass phrase
    #[arg(short = 'W', long = "authPassword", value_name = "PASS PHRASE")]
    pub auth_password: Option<String>,

    /// SNMPv3 privacy pass phrase
    #[arg(short = 'X', long = "privPassword", value_name = "PASS PHRASE")]
    pub priv_password: Option<String>,

    /// SNMPv3 authentication protocol
    #[arg(short = 'w', long = "authProtocol", value_name = "PROTOCOL")]
    pub auth_protocol: Option<String>,

    /// SNMPv3 privacy protocol
    #[arg(short = 'x', long = "privProtocol", value_name = "PROTOCOL")]
    pub priv_protocol: Option<String>,

    /// IPMI over LAN username
    #[arg(short = 'b', long = "username", value_name = "USERNAME")]
    pub username: Option<String>,

    /// IPMI over LAN password
    #[arg(short = 'B', long = "password", value_name = "PASSWORD")]
    pub password: Option<String>,

    /// IPMI 1.5 authentication type (NONE, STRAIGHT_PASSWORD_KEY, MD2, MD5)
    #[arg(short = 'd', long = "authType", value_name = "TYPE")]
    pub auth_type: Option<String>,

    /// IPMI 2.0 cipher suite id
    #[arg(short = 'L', long = "cipher_suite_id", value_name = "ID")]
    pub cipher_suite_id: Option<u8>,

    /// Display results in ups.conf format with sanity-check warnings (default)
    #[arg(short = 'Q', long = "disp_nut_conf_with_sanity_check", group = "display")]
    pub disp_sanity: bool,

    /// Display results in ups.conf format
    #[arg(short = 'N', long = "disp_nut_conf", group = "display")]
    pub disp_nut_conf: bool,

    /// Display results in a parsable format
    #[arg(short = 'P', long = "disp_parsable", group = "display")]
    pub disp_parsable: bool,

    /// Display only scan results, no progress messages
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Raise the debugging level; repeatable
    #[arg(short = 'D', long = "nut_debug_level", action = ArgAction::Count)]
    pub debug: u8,

    /// Display version and exit
    #[arg(short = 'V', long = "version")]
    pub version: bool,

    /// Display buses available for scanning and exit
    #[arg(short = 'a', long = "available")]
    pub available: bool,

    /// Run bus scans one after another instead of in parallel
    #[arg(long = "sequential")]
    pub sequential: bool,
}

impl CommandLine {
    pub fn display_mode(&self) -> DisplayMode {
        if self.disp_parsable {
            DisplayMode::Parsable
        } else if self.disp_nut_conf {
            DisplayMode::UpsConf
        } else {
            DisplayMode::UpsConfWithSanityCheck
        }
    }

    /// Buses named by their own flag. `-C` is not one of them: like the
    /// no-flag default it expands to the everything-but-serial set and
    /// degrades quietly on unavailable buses, while a per-bus flag turns
    /// unavailability into a usage error.
    pub fn explicit_buses(&self) -> Vec<Bus> {
        let mut buses = Vec::new();
        if self.usb_scan > 0 {
            buses.push(Bus::Usb);
        }
        if self.snmp_scan {
            buses.push(Bus::Snmp);
        }
        if self.xml_scan {
            buses.push(Bus::XmlHttp);
        }
        if self.oldnut_scan {
            buses.push(Bus::NutBus);
        }
        if self.nut_simulation_scan {
            buses.push(Bus::NutSimulation);
        }
        if self.avahi_scan {
            buses.push(Bus::Avahi);
        }
        if self.ipmi_scan {
            buses.push(Bus::Ipmi);
        }
        if self.eaton_serial.is_some() {
            buses.push(Bus::Serial);
        }
        buses
    }

    /// Buses requested on the command line, per-bus flags and `-C` combined.
    /// The implicit everything-but-serial fallback is resolved later by the
    /// orchestrator.
    pub fn enabled(&self) -> Enabled {
        let mut enabled = if self.complete_scan {
            Enabled::all_except_serial()
        } else {
            Enabled::default()
        };
        for bus in self.explicit_buses() {
            enabled.set(bus, true);
        }
        enabled
    }

    /// Builds the range registry from `-s`/`-e` pairs and `-m` entries.
    pub fn build_registry(&self) -> Result<RangeRegistry, UsageError> {
        let mut registry = RangeRegistry::new();

        for (start, end) in pair_addresses(&self.start_ip, &self.end_ip) {
            let start = start.map(|s| parse_address(s)).transpose()?;
            let end = end.map(|s| parse_address(s)).transpose()?;
            registry.add_range(start, end);
        }

        let mut auto_done = false;
        for mask in &self.mask_cidr {
            if let Some(family) = SubnetFamily::parse(mask) {
                // Auto-discovery is idempotent per run, not cumulative.
                if auto_done {
                    warn!("Duplicate request for connected subnet scan ignored");
                    continue;
                }
                auto_done = true;
                interface::discover_connected_subnets(family, &mut registry);
            } else {
                let range = range::cidr_to_range(mask).map_err(|e| UsageError::BadCidr {
                    input: mask.clone(),
                    reason: e.to_string(),
                })?;
                registry.add_range(Some(range.start), Some(range.end));
            }
        }

        Ok(registry)
    }

    pub fn scan_options(&self) -> ScanOptions {
        let mut options = ScanOptions::default();

        options.config = Config {
            timeout: self.resolve_timeout(),
            port: self.port,
            quiet: self.quiet,
            display: self.display_mode(),
        };

        // First -U gives minimal detail, each further -U bumps the level.
        options.usb.link_detail_level = self.usb_scan.saturating_sub(1).min(3);

        if let Some(community) = &self.community {
            options.snmp.community = community.clone();
        }
        options.snmp.sec_level = self.sec_level.clone();
        options.snmp.sec_name = self.sec_name.clone();
        options.snmp.auth_password = self.auth_password.clone();
        options.snmp.priv_password = self.priv_password.clone();
        options.snmp.auth_protocol = self.auth_protocol.clone();
        options.snmp.priv_protocol = self.priv_protocol.clone();

        options.ipmi.username = self.username.clone();
        options.ipmi.password = self.password.clone();
        if let Some(auth_type) = &self.auth_type {
            match IpmiAuthType::parse(auth_type) {
                Some(parsed) => options.ipmi.auth_type = parsed,
                None => warn!("Unknown authentication type ({auth_type}). Defaulting to MD5"),
            }
        }
        options.ipmi.cipher_suite_id = self.cipher_suite_id;

        options.serial_ports = self.eaton_serial.clone();
        options
    }

    fn resolve_timeout(&self) -> Duration {
        let Some(arg) = &self.timeout else {
            return Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS);
        };
        match arg.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!("Illegal timeout value, using default {DEFAULT_NETWORK_TIMEOUT_SECS}s");
                Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS)
            }
        }
    }
}

fn parse_address(s: &str) -> Result<IpAddr, UsageError> {
    s.parse().map_err(|e: std::net::AddrParseError| UsageError::BadAddress {
        input: s.to_string(),
        reason: e.to_string(),
    })
}

/// Pairs the Nth `-s` with the Nth `-e`; an unmatched start or end stands
/// alone as a single-address range.
fn pair_addresses<'a>(
    starts: &'a [String],
    ends: &'a [String],
) -> Vec<(Option<&'a str>, Option<&'a str>)> {
    let len = starts.len().max(ends.len());
    (0..len)
        .map(|i| {
            (
                starts.get(i).map(String::as_str),
                ends.get(i).map(String::as_str),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CommandLine {
        CommandLine::try_parse_from(std::iter::once("powerscan").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn repeated_start_end_pairs_become_distinct_ranges() {
        let cmd = parse(&["-s", "10.0.0.1", "-e", "10.0.0.5", "-s", "10.0.1.1", "-e", "10.0.1.5"]);
        let registry = cmd.build_registry().unwrap();
        assert_eq!(registry.len(), 2);

        let ranges: Vec<_> = registry.iter().collect();
        assert_eq!(ranges[0].start, "10.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(ranges[0].end, "10.0.0.5".parse::<IpAddr>().unwrap());
        assert_eq!(ranges[1].start, "10.0.1.1".parse::<IpAddr>().unwrap());
        assert_eq!(ranges[1].end, "10.0.1.5".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn lone_start_becomes_single_address_range() {
        let cmd = parse(&["-s", "192.168.1.50"]);
        let registry = cmd.build_registry().unwrap();
        assert_eq!(registry.len(), 1);
        let range = registry.iter().next().unwrap();
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn cidr_mask_expands_to_a_range() {
        let cmd = parse(&["-m", "10.0.0.0/30"]);
        let registry = cmd.build_registry().unwrap();
        let range = registry.iter().next().unwrap();
        assert_eq!(range.start, "10.0.0.0".parse::<IpAddr>().unwrap());
        assert_eq!(range.end, "10.0.0.3".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn bad_addresses_are_usage_errors() {
        assert!(parse(&["-s", "not-an-ip"]).build_registry().is_err());
        assert!(parse(&["-m", "10.0.0.0/33"]).build_registry().is_err());
    }

    #[test]
    fn explicit_flags_map_to_buses() {
        let cmd = parse(&["-S", "-E", "ttyS0,ttyS1"]);
        let enabled = cmd.enabled();
        assert!(enabled.get(Bus::Snmp));
        assert!(enabled.get(Bus::Serial));
        assert!(!enabled.get(Bus::Usb));

        let options = cmd.scan_options();
        assert_eq!(options.serial_ports.as_deref(), Some("ttyS0,ttyS1"));
    }

    #[test]
    fn complete_scan_enables_buses_without_marking_them_explicit() {
        let cmd = parse(&["-C"]);
        assert!(cmd.enabled().get(Bus::Snmp));
        assert!(cmd.enabled().get(Bus::Usb));
        assert!(!cmd.enabled().get(Bus::Serial));
        assert!(cmd.explicit_buses().is_empty());

        let cmd = parse(&["-C", "-S"]);
        assert_eq!(cmd.explicit_buses(), vec![Bus::Snmp]);
    }

    #[test]
    fn display_modes_are_mutually_exclusive() {
        assert!(CommandLine::try_parse_from(["powerscan", "-N", "-P"]).is_err());
        assert_eq!(parse(&["-P"]).display_mode(), DisplayMode::Parsable);
        assert_eq!(parse(&["-N"]).display_mode(), DisplayMode::UpsConf);
        assert_eq!(parse(&[]).display_mode(), DisplayMode::UpsConfWithSanityCheck);
    }

    #[test]
    fn usb_detail_level_grows_with_repetition() {
        assert_eq!(parse(&["-U"]).scan_options().usb.link_detail_level, 0);
        assert_eq!(parse(&["-UU"]).scan_options().usb.link_detail_level, 1);
        assert_eq!(parse(&["-UUUU"]).scan_options().usb.link_detail_level, 3);
        assert_eq!(parse(&["-UUUUUU"]).scan_options().usb.link_detail_level, 3);
    }

    #[test]
    fn bad_timeout_falls_back_to_default() {
        let cmd = parse(&["-t", "0"]);
        assert_eq!(
            cmd.scan_options().config.timeout,
            Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS)
        );
        let cmd = parse(&["-t", "30"]);
        assert_eq!(cmd.scan_options().config.timeout, Duration::from_secs(30));
    }
}
