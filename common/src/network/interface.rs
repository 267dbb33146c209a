use std::fmt;
use std::net::Ipv4Addr;

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use thiserror::Error;

/// Most interfaces offered for selection.
pub const MAX_INTERFACES: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("no usable IPv4 interface found")]
    NoneAvailable,
    #[error("no interface named or addressed '{0}'")]
    NotFound(String),
}

/// One IPv4 address bound to an interface that can reach a broadcast domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInterface {
    pub name: String,
    pub addr: Ipv4Addr,
    pub prefix: u8,
}

impl fmt::Display for LocalInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.addr, self.prefix)
    }
}

pub trait NetworkInterfaceExtension {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network>;
    fn is_usable(&self) -> bool;
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network> {
        self.ips
            .iter()
            .filter_map(|ip| {
                if let IpNetwork::V4(ipv4) = ip {
                    Some(*ipv4)
                } else {
                    None
                }
            })
            .collect()
    }

    fn is_usable(&self) -> bool {
        self.is_up() && !self.is_loopback() && !self.ips.is_empty()
    }
}

/// Lists the IPv4 addresses of every usable interface, wired ones first.
pub fn get_ipv4_interfaces(limit: usize) -> Vec<LocalInterface> {
    let mut interfaces: Vec<NetworkInterface> = datalink::interfaces()
        .into_iter()
        .filter(|i| i.is_usable())
        .collect();

    // Wired before wireless, approximated by name.
    interfaces.sort_by_key(|i| if i.name.starts_with('e') { 0 } else { 1 });

    flatten_ipv4(&interfaces).into_iter().take(limit).collect()
}

fn flatten_ipv4(interfaces: &[NetworkInterface]) -> Vec<LocalInterface> {
    interfaces
        .iter()
        .flat_map(|iface| {
            iface.get_ipv4_nets().into_iter().map(|net| LocalInterface {
                name: iface.name.clone(),
                addr: net.ip(),
                prefix: net.prefix(),
            })
        })
        .collect()
}

/// Picks an entry by interface name or by its IPv4 address.
pub fn find_interface(
    candidates: &[LocalInterface],
    query: &str,
) -> Result<LocalInterface, InterfaceError> {
    if candidates.is_empty() {
        return Err(InterfaceError::NoneAvailable);
    }

    let by_addr: Option<Ipv4Addr> = query.parse().ok();
    candidates
        .iter()
        .find(|c| c.name == query || Some(c.addr) == by_addr)
        .cloned()
        .ok_or_else(|| InterfaceError::NotFound(query.to_string()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
