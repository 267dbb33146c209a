use crate::terminal::{colors, print};
use colored::*;
use otaflash_common::network::broadcast;
use otaflash_common::network::interface::LocalInterface;
use otaflash_core::discovery::DiscoveryResponse;

pub fn interface_to_key_value_pair(interface: &LocalInterface) -> Vec<(String, ColoredString)> {
    let address: ColoredString = interface.addr.to_string().color(colors::IPV4_ADDR);
    let prefix: ColoredString = interface.prefix.to_string().color(colors::IPV4_PREFIX);
    let probe: ColoredString = broadcast::class_c_broadcast(interface.addr)
        .to_string()
        .color(colors::IPV4_ADDR);

    vec![
        ("IPv4".to_string(), format!("{address}/{prefix}").color(colors::SEPARATOR)),
        ("Probe".to_string(), probe),
    ]
}

pub fn print_interface(interface: &LocalInterface, idx: usize) {
    print::tree_head(idx, &interface.name);
    print::as_tree_one_level(interface_to_key_value_pair(interface));
}

pub fn print_response(response: &DiscoveryResponse, idx: usize) {
    print::tree_head(idx, &response.payload);
    let target: ColoredString = match response.target() {
        Some(target) => target.to_string().color(colors::IPV4_ADDR),
        None => "unusable".color(colors::FAILURE),
    };
    print::as_tree_one_level(vec![
        ("Source".to_string(), response.source.to_string().normal()),
        ("Target".to_string(), target),
    ]);
}
