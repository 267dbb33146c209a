use anyhow::Context;
use otaflash_common::config::DiscoveryConfig;
use otaflash_common::network::interface::{self, InterfaceError, LocalInterface, MAX_INTERFACES};
use otaflash_common::network::target::TargetSet;
use otaflash_core::discovery::{DiscoveryResponse, DiscoveryService};
use tracing::{info, warn};

use crate::terminal::prompt::{self, TargetChoice};

/// Resolves the interface to probe from; `None` means the user quit.
pub fn resolve_interface(query: Option<&str>) -> anyhow::Result<Option<LocalInterface>> {
    let candidates: Vec<LocalInterface> = interface::get_ipv4_interfaces(MAX_INTERFACES);
    info!("Number of network interfaces : {}", candidates.len());

    if let Some(query) = query {
        let selected = interface::find_interface(&candidates, query)?;
        info!("Interface : {selected} selected");
        return Ok(Some(selected));
    }

    match candidates.len() {
        0 => Err(InterfaceError::NoneAvailable.into()),
        1 => {
            info!("Interface : {} selected", candidates[0]);
            Ok(Some(candidates[0].clone()))
        }
        _ => prompt::choose_interface(&candidates),
    }
}

pub async fn bind_discovery(local: &LocalInterface) -> anyhow::Result<DiscoveryService> {
    DiscoveryService::bind(local.addr, DiscoveryConfig::default())
        .await
        .with_context(|| format!("cannot probe from {local}"))
}

/// Repeats probe cycles until a target set is accepted.
///
/// With `accept_all` the first cycle that yields any usable answer is taken
/// whole; otherwise the user picks from a menu after each cycle.
pub async fn discover_targets(local: &LocalInterface, accept_all: bool) -> anyhow::Result<TargetSet> {
    let mut service = bind_discovery(local).await?;

    loop {
        let responses: Vec<DiscoveryResponse> = service.probe_cycle().await?;
        info!("All responses received: {}", responses.len());

        if accept_all {
            let targets: TargetSet = responses.iter().filter_map(DiscoveryResponse::target).collect();
            if targets.is_empty() {
                warn!("No device answered, rescanning");
                continue;
            }
            return Ok(targets);
        }

        match prompt::choose_targets(&responses)? {
            TargetChoice::Rescan => info!("Rescan targets"),
            TargetChoice::Accept(targets) => return Ok(targets),
        }
    }
}
