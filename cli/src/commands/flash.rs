use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::bail;
use clap::Args;
use colored::*;

use crate::commands::select;
use crate::oprint;
use crate::terminal::{colors, print, progress::TransferBars};
use otaflash_common::config::{Config, DEFAULT_FIRMWARE, TransferConfig};
use otaflash_common::network::target::{Target, TargetSet};
use otaflash_core::firmware::Firmware;
use otaflash_core::transfer::{
    Orchestrator, TcpConnector, TransferReport, TransferSummary, event_channel,
};

type Detail = (String, ColoredString);

#[derive(Args)]
pub struct FlashArgs {
    /// Firmware image to upload
    #[arg(default_value = DEFAULT_FIRMWARE)]
    pub firmware: PathBuf,

    /// Interface name or IPv4 address to probe from
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Device address to upload to; skips discovery. Repeatable
    #[arg(short, long = "target", value_name = "ADDR")]
    pub targets: Vec<Target>,

    /// Take every device that answers instead of asking
    #[arg(short, long)]
    pub all: bool,
}

pub async fn flash(args: FlashArgs, cfg: &Config) -> anyhow::Result<()> {
    let firmware: Firmware = Firmware::load(&args.firmware).await?;

    let targets: TargetSet = if args.targets.is_empty() {
        let Some(local) = select::resolve_interface(args.interface.as_deref())? else {
            return Ok(());
        };
        select::discover_targets(&local, args.all).await?
    } else {
        args.targets.into_iter().collect()
    };

    print::header("uploading firmware", cfg.quiet);

    let transfer_cfg = TransferConfig::default();
    let orchestrator = Orchestrator::new(TcpConnector::from(&transfer_cfg), transfer_cfg);

    let bars = TransferBars::new(&targets, firmware.len());
    let (tx, mut rx) = event_channel();
    let renderer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            bars.apply(&event);
        }
    });

    let start_time: Instant = Instant::now();
    let summary: TransferSummary = orchestrator.run(targets, &firmware, Some(tx)).await?;
    let _ = renderer.await;

    transfer_ends(&summary, start_time.elapsed(), cfg);

    if !summary.all_succeeded() {
        bail!(
            "{} of {} target(s) failed",
            summary.failed(),
            summary.reports().len()
        );
    }
    Ok(())
}

fn transfer_ends(summary: &TransferSummary, total_time: Duration, cfg: &Config) {
    print::header("ota results", cfg.quiet);

    for (idx, report) in summary.reports().iter().enumerate() {
        match cfg.quiet {
            2 => print::print(&format!("{} {}", report.target, report.outcome)),
            _ => {
                print::tree_head(idx + 1, report.target.as_str());
                print::as_tree_one_level(report_details(report));
            }
        }
    }

    print_summary(summary, total_time, cfg);
}

fn report_details(report: &TransferReport) -> Vec<Detail> {
    let outcome = report.outcome.to_string();
    let outcome: ColoredString = if report.outcome.is_success() {
        outcome.color(colors::SUCCESS).bold()
    } else {
        outcome.color(colors::FAILURE).bold()
    };

    let mut details: Vec<Detail> = vec![
        ("Result".to_string(), outcome),
        (
            "Sent".to_string(),
            format!("{} / {} bytes", report.bytes_sent, report.total_bytes).normal(),
        ),
    ];

    if let Some(error) = &report.error {
        details.push(("Error".to_string(), error.to_string().color(colors::FAILURE)));
    }
    details
}

fn print_summary(summary: &TransferSummary, total_time: Duration, cfg: &Config) {
    let ok: ColoredString = format!("{} succeeded", summary.succeeded()).bold().green();
    let failed: ColoredString = format!("{} failed", summary.failed()).bold().red();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: String = format!("OTA Complete: {ok}, {failed} in {total_time}");

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => {
            oprint!();
            print::print_status(&output);
        }
    }
}
