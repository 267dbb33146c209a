mod commands;
mod terminal;

use commands::{CommandLine, Commands, discover, flash, interfaces};
use otaflash_common::config::Config;
use terminal::{logging, print};
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    let cfg = Config {
        quiet: commands.quiet,
        no_banner: commands.no_banner,
        verbose: commands.verbose,
    };

    logging::init_logging(cfg.verbose);
    print::banner(cfg.no_banner, cfg.quiet);
    debug!("Host OS: {} ({})", std::env::consts::OS, std::env::consts::ARCH);

    match commands.command {
        Commands::Interfaces => {
            print::header("network interfaces", cfg.quiet);
            interfaces::interfaces(&cfg)
        }
        Commands::Discover { interface } => {
            print::header("discovering devices", cfg.quiet);
            discover::discover(interface.as_deref(), &cfg).await
        }
        Commands::Flash(args) => {
            print::header("getting ready for ota", cfg.quiet);
            flash::flash(args, &cfg).await
        }
    }
}
