use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};
use std::process::Command;
use std::sync::LazyLock;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use regex::Regex;
use tracing::warn;

/// Outcome label recorded in the `DNS_Status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsStatus {
    Found,
    NotFound,
    Timeout,
    Error,
}

impl DnsStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DnsStatus::Found => "Found in DNS",
            DnsStatus::NotFound => "Not found in DNS",
            DnsStatus::Timeout => "DNS lookup timeout",
            DnsStatus::Error => "DNS lookup error",
        }
    }
}

impl fmt::Display for DnsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seam for the fallback name resolution used when the monitoring API does
/// not know a device.
pub trait Resolver {
    fn resolve(&self, hostname: &str) -> (Option<IpAddr>, DnsStatus);
}

/// Bound on the primary resolution attempt.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

static NSLOOKUP_ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    // The server banner line ends in "#<port>", answer lines do not.
    Regex::new(r"(?m)Address:\s+(\d+\.\d+\.\d+\.\d+)\s*$").expect("hardcoded regex pattern")
});

/// Resolver backed by the operating system. The primary path is the libc
/// resolver driven from a watchdog thread so a stalled lookup cannot hang the
/// batch; when it answers without an address the `nslookup` utility gets a
/// second opinion before the device is declared absent from DNS.
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, hostname: &str) -> (Option<IpAddr>, DnsStatus) {
        let (sender, receiver) = mpsc::channel();
        let host = hostname.to_string();
        thread::spawn(move || {
            let result = (host.as_str(), 0u16)
                .to_socket_addrs()
                .map(|addrs| addrs.map(|addr| addr.ip()).collect::<Vec<_>>());
            let _ = sender.send(result);
        });

        match receiver.recv_timeout(LOOKUP_TIMEOUT) {
            Ok(Ok(addresses)) => match pick_address(&addresses) {
                Some(address) => (Some(address), DnsStatus::Found),
                None => nslookup_fallback(hostname),
            },
            // The resolver answered negatively; no point in a second opinion.
            Ok(Err(_)) => (None, DnsStatus::NotFound),
            Err(RecvTimeoutError::Timeout) => (None, DnsStatus::Timeout),
            Err(RecvTimeoutError::Disconnected) => (None, DnsStatus::Error),
        }
    }
}

/// Prefers an IPv4 answer, falling back to the first address of any family.
fn pick_address(addresses: &[IpAddr]) -> Option<IpAddr> {
    addresses
        .iter()
        .find(|address| address.is_ipv4())
        .or_else(|| addresses.first())
        .copied()
}

fn nslookup_fallback(hostname: &str) -> (Option<IpAddr>, DnsStatus) {
    match Command::new("nslookup").arg(hostname).output() {
        Ok(output) => {
            let text = String::from_utf8_lossy(&output.stdout);
            parse_nslookup_output(&text)
        }
        Err(error) => {
            warn!(hostname, %error, "nslookup fallback failed to run");
            (None, DnsStatus::Error)
        }
    }
}

fn parse_nslookup_output(output: &str) -> (Option<IpAddr>, DnsStatus) {
    if output.contains("NXDOMAIN") || output.contains("can't find") {
        return (None, DnsStatus::NotFound);
    }
    let address = NSLOOKUP_ANSWER
        .captures(output)
        .and_then(|captures| captures[1].parse::<IpAddr>().ok());
    match address {
        Some(address) => (Some(address), DnsStatus::Found),
        None => (None, DnsStatus::NotFound),
    }
}
