//! Numbered console menus.
//!
//! Both menus read a single number per line from stdin and keep asking until
//! the answer is in range.

use std::io::{self, BufRead, Write};

use anyhow::bail;
use otaflash_common::network::interface::LocalInterface;
use otaflash_common::network::target::TargetSet;
use otaflash_core::discovery::DiscoveryResponse;
use tracing::{info, warn};

use crate::terminal::print;

pub enum TargetChoice {
    Rescan,
    Accept(TargetSet),
}

/// `None` when the user picks quit.
pub fn choose_interface(candidates: &[LocalInterface]) -> anyhow::Result<Option<LocalInterface>> {
    print::menu_entry(0, "Quit");
    for (i, candidate) in candidates.iter().enumerate() {
        print::menu_entry(i + 1, format!("Interface : {}, IP : {}", candidate.name, candidate.addr));
    }

    let choice = read_choice(&mut io::stdin().lock(), "Select interface", candidates.len())?;
    Ok(choice.checked_sub(1).map(|idx| candidates[idx].clone()))
}

pub fn choose_targets(responses: &[DiscoveryResponse]) -> anyhow::Result<TargetChoice> {
    print::menu_entry(0, "Rescan");
    for (i, response) in responses.iter().enumerate() {
        print::menu_entry(i + 1, response.to_string());
    }
    print::menu_entry(responses.len() + 1, "All targets");

    let choice = read_choice(&mut io::stdin().lock(), "Select target IP", responses.len() + 1)?;
    Ok(resolve_target_choice(responses, choice))
}

fn resolve_target_choice(responses: &[DiscoveryResponse], choice: usize) -> TargetChoice {
    match choice {
        0 => TargetChoice::Rescan,
        n if n <= responses.len() => {
            TargetChoice::Accept(responses[n - 1].target().into_iter().collect())
        }
        _ => TargetChoice::Accept(responses.iter().filter_map(DiscoveryResponse::target).collect()),
    }
}

fn read_choice(input: &mut impl BufRead, prompt: &str, max: usize) -> anyhow::Result<usize> {
    loop {
        eprint!("{prompt}(0-{max}) : ");
        io::stderr().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("input closed before a selection was made");
        }

        match line.trim().parse::<usize>() {
            Ok(n) if n <= max => {
                info!("Selected {n}");
                return Ok(n);
            }
            Ok(n) => warn!("Invalid selection : {n}"),
            Err(_) => warn!("Input number only"),
        }
    }
}
