use std::net::SocketAddr;
use std::time::{Duration, Instant};

use colored::*;
use tracing::debug;

use crate::commands::select;
use crate::oprint;
use crate::terminal::{colors, network_fmt, print};
use otaflash_common::config::Config;
use otaflash_core::discovery::DiscoveryResponse;

pub async fn discover(interface: Option<&str>, cfg: &Config) -> anyhow::Result<()> {
    let Some(local) = select::resolve_interface(interface)? else {
        return Ok(());
    };

    let mut service = select::bind_discovery(&local).await?;
    if let Ok(bound) = service.local_addr() {
        debug!("Probing from {bound}");
    }

    let start_time: Instant = Instant::now();
    let responses: Vec<DiscoveryResponse> = service.probe_cycle().await?;

    discovery_ends(&responses, service.destination(), start_time.elapsed(), cfg);
    Ok(())
}

fn discovery_ends(
    responses: &[DiscoveryResponse],
    destination: SocketAddr,
    total_time: Duration,
    cfg: &Config,
) {
    if responses.is_empty() {
        print::header("no devices", cfg.quiet);
        print::no_results();
        return;
    }

    print::header("devices", cfg.quiet);
    for (idx, response) in responses.iter().enumerate() {
        match cfg.quiet {
            2 => print::print(&response.payload),
            _ => network_fmt::print_response(response, idx + 1),
        }
    }
    print_summary(responses.len(), destination, total_time, cfg);
}

fn print_summary(count: usize, destination: SocketAddr, total_time: Duration, cfg: &Config) {
    let answers: ColoredString = format!("{count} responses").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: String =
        format!("Discovery Complete: {answers} to probe on {destination} in {total_time}");

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => {
            oprint!();
            print::print_status(format!("{}", output.color(colors::TEXT_DEFAULT)));
        }
    }
}
