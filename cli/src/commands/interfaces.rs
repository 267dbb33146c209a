use otaflash_common::config::Config;
use otaflash_common::network::interface::{self, LocalInterface, MAX_INTERFACES};

use crate::oprint;
use crate::terminal::{network_fmt, print};

pub fn interfaces(cfg: &Config) -> anyhow::Result<()> {
    let interfaces: Vec<LocalInterface> = interface::get_ipv4_interfaces(MAX_INTERFACES);

    if interfaces.is_empty() {
        print::print_status("No usable IPv4 interface found");
        return Ok(());
    }

    for (idx, iface) in interfaces.iter().enumerate() {
        match cfg.quiet {
            2 => print::print(&format!("{} {}", iface.name, iface.addr)),
            _ => network_fmt::print_interface(iface, idx + 1),
        }
        if idx + 1 != interfaces.len() && cfg.quiet < 2 {
            oprint!();
        }
    }
    Ok(())
}
