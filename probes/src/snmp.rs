//! SNMP probe.
//!
//! Sends a community-authenticated SNMPv1 GET for `sysDescr.0` to every
//! address of a range and reports the units that answered. The BER encoding
//! is hand-rolled; the few TLV shapes involved are fixed.
//!
//! SNMPv3 credentials are carried in [`SnmpOptions`] for the driver section
//! of the output; probing itself stays v1.

use std::net::IpAddr;
use std::time::Duration;

use powerscan_common::device::{Bus, Device, DeviceList};
use powerscan_common::range::IpRange;
use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::debug;

use crate::semaphore;

const SNMP_PORT: u16 = 161;
/// Fixed per-run request id ("PS").
const REQUEST_ID: i32 = 0x5053;
/// 1.3.6.1.2.1.1.1.0 (sysDescr.0), pre-encoded.
const SYS_DESCR_OID: &[u8] = &[0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00];

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_NULL: u8 = 0x05;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_GET_REQUEST: u8 = 0xa0;
const TAG_GET_RESPONSE: u8 = 0xa2;

#[derive(Debug, Clone)]
pub struct SnmpOptions {
    pub community: String,
    pub sec_level: Option<String>,
    pub sec_name: Option<String>,
    pub auth_password: Option<String>,
    pub priv_password: Option<String>,
    pub auth_protocol: Option<String>,
    pub priv_protocol: Option<String>,
}

impl Default for SnmpOptions {
    fn default() -> Self {
        Self {
            community: "public".to_string(),
            sec_level: None,
            sec_name: None,
            auth_password: None,
            priv_password: None,
            auth_protocol: None,
            priv_protocol: None,
        }
    }
}

pub fn available() -> bool {
    true
}

pub async fn scan_snmp(range: IpRange, probe_timeout: Duration, opts: &SnmpOptions) -> DeviceList {
    let request = build_get_request(opts.community.as_bytes());
    let mut tasks: JoinSet<Option<Device>> = JoinSet::new();

    for addr in range.addresses() {
        let request = request.clone();
        let community = opts.community.clone();
        tasks.spawn(async move {
            let _permit = semaphore::acquire().await;
            probe_one(addr, &request, &community, probe_timeout).await
        });
    }

    let mut devices = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        if let Ok(Some(device)) = joined {
            devices.push(device);
        }
    }
    // Stable report order regardless of reply timing.
    devices.sort_by(|a, b| a.port.cmp(&b.port));
    devices
}

async fn probe_one(
    addr: IpAddr,
    request: &[u8],
    community: &str,
    probe_timeout: Duration,
) -> Option<Device> {
    let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(bind_addr).await.ok()?;
    socket.connect((addr, SNMP_PORT)).await.ok()?;
    socket.send(request).await.ok()?;

    let mut buf = [0u8; 1500];
    let received = match timeout(probe_timeout, socket.recv(&mut buf)).await {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => {
            debug!("SNMP probe of {addr} failed: {e}");
            return None;
        }
        Err(_elapsed) => return None,
    };

    let sys_descr = parse_sys_descr(&buf[..received])?;
    debug!("SNMP agent at {addr}: {sys_descr}");

    Some(
        Device::new(Bus::Snmp, "snmp-ups", addr.to_string())
            .with("desc", sys_descr)
            .with("community", community),
    )
}

fn build_get_request(community: &[u8]) -> Vec<u8> {
    let varbind = tlv(
        TAG_SEQUENCE,
        &[tlv(TAG_OID, SYS_DESCR_OID), tlv(TAG_NULL, &[])].concat(),
    );
    let pdu = tlv(
        TAG_GET_REQUEST,
        &[
            ber_int(REQUEST_ID),
            ber_int(0), // error-status
            ber_int(0), // error-index
            tlv(TAG_SEQUENCE, &varbind),
        ]
        .concat(),
    );
    tlv(
        TAG_SEQUENCE,
        &[
            ber_int(0), // version 1
            tlv(TAG_OCTET_STRING, community),
            pdu,
        ]
        .concat(),
    )
}

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    match content.len() {
        len if len < 0x80 => out.push(len as u8),
        len if len <= 0xff => out.extend_from_slice(&[0x81, len as u8]),
        len => out.extend_from_slice(&[0x82, (len >> 8) as u8, (len & 0xff) as u8]),
    }
    out.extend_from_slice(content);
    out
}

fn ber_int(value: i32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes
        .iter()
        .take(3)
        .take_while(|&&b| b == 0)
        .count();
    tlv(TAG_INTEGER, &bytes[skip..])
}

/// Pulls the varbind value out of a GetResponse, expecting an OCTET STRING.
fn parse_sys_descr(buf: &[u8]) -> Option<String> {
    let mut top = Reader::new(buf);
    let (TAG_SEQUENCE, body) = top.tlv()? else {
        return None;
    };

    let mut msg = Reader::new(body);
    msg.tlv()?; // version
    msg.tlv()?; // community
    let (TAG_GET_RESPONSE, pdu) = msg.tlv()? else {
        return None;
    };

    let mut pdu = Reader::new(pdu);
    pdu.tlv()?; // request-id
    pdu.tlv()?; // error-status
    pdu.tlv()?; // error-index
    let (TAG_SEQUENCE, varbinds) = pdu.tlv()? else {
        return None;
    };
    let (TAG_SEQUENCE, varbind) = Reader::new(varbinds).tlv()? else {
        return None;
    };

    let mut varbind = Reader::new(varbind);
    varbind.tlv()?; // OID
    let (TAG_OCTET_STRING, value) = varbind.tlv()? else {
        return None;
    };
    Some(String::from_utf8_lossy(value).into_owned())
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Reads one TLV, handling short and 1/2-byte long-form lengths.
    fn tlv(&mut self) -> Option<(u8, &'a [u8])> {
        let tag = *self.buf.get(self.pos)?;
        let mut len = *self.buf.get(self.pos + 1)? as usize;
        let mut header = 2;

        if len == 0x81 {
            len = *self.buf.get(self.pos + 2)? as usize;
            header = 3;
        } else if len == 0x82 {
            len = ((*self.buf.get(self.pos + 2)? as usize) << 8)
                | *self.buf.get(self.pos + 3)? as usize;
            header = 4;
        } else if len >= 0x80 {
            return None;
        }

        let start = self.pos + header;
        let content = self.buf.get(start..start + len)?;
        self.pos = start + len;
        Some((tag, content))
    }
}
