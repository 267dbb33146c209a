use std::collections::HashMap;
use std::sync::OnceLock;

use colored::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use otaflash_common::network::target::{Target, TargetSet};
use otaflash_core::transfer::{TransferEvent, TransferOutcome};

use crate::terminal::colors;

static MULTI: OnceLock<MultiProgress> = OnceLock::new();

/// Container every bar and every log line is drawn through.
pub fn multi() -> &'static MultiProgress {
    MULTI.get_or_init(MultiProgress::new)
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:>18.bold} [{bar:32.cyan/blue}] {bytes:>10}/{total_bytes:10} {percent:>3}% {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏ ")
}

/// One progress bar per target, driven by [`TransferEvent`]s.
pub struct TransferBars {
    bars: HashMap<Target, ProgressBar>,
}

impl TransferBars {
    pub fn new(targets: &TargetSet, total_bytes: usize) -> Self {
        let bars = targets
            .iter()
            .map(|target| {
                let bar = multi().add(ProgressBar::new(total_bytes as u64));
                bar.set_style(bar_style());
                bar.set_prefix(target.to_string());
                bar.set_message("connecting");
                (target.clone(), bar)
            })
            .collect();
        Self { bars }
    }

    pub fn apply(&self, event: &TransferEvent) {
        match event {
            TransferEvent::Progress {
                target, bytes_sent, ..
            } => {
                if let Some(bar) = self.bars.get(target) {
                    bar.set_message("sending");
                    bar.set_position(*bytes_sent as u64);
                }
            }
            TransferEvent::Finished { target, outcome } => {
                if let Some(bar) = self.bars.get(target) {
                    finish(bar, *outcome);
                }
            }
        }
    }
}

fn finish(bar: &ProgressBar, outcome: TransferOutcome) {
    let text = outcome.to_string();
    if outcome.is_success() {
        bar.finish_with_message(format!("{}", text.color(colors::SUCCESS).bold()));
    } else {
        bar.abandon_with_message(format!("{}", text.color(colors::FAILURE).bold()));
    }
}
