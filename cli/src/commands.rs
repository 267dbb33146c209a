pub mod discover;
pub mod flash;
pub mod interfaces;
pub mod select;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "otaflash")]
#[command(about = "Find devices on the local network and push firmware to them over the air.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Reduce output; repeat for less
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,

    /// Increase log verbosity; repeat for more
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the IPv4 interfaces discovery can run from
    #[command(alias = "i")]
    Interfaces,
    /// Run one probe cycle and list the devices that answered
    #[command(alias = "d")]
    Discover {
        /// Interface name or IPv4 address to probe from
        #[arg(short, long)]
        interface: Option<String>,
    },
    /// Upload a firmware image to one or more devices
    #[command(alias = "f")]
    Flash(flash::FlashArgs),
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
