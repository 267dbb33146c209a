use std::net::{Ipv4Addr, SocketAddrV4};

/// Broadcast address of the /24 network `ip` lives in.
///
/// Devices answer probes sent to the class C broadcast regardless of the
/// interface's real prefix, so the host octet is forced to 255.
pub fn class_c_broadcast(ip: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = ip.octets();
    Ipv4Addr::new(a, b, c, 255)
}

pub fn broadcast_target(ip: Ipv4Addr, port: u16) -> SocketAddrV4 {
    SocketAddrV4::new(class_c_broadcast(ip), port)
}
