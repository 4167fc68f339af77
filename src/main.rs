mod cmd;

use anyhow::Result;
use cdn_html_helper::cli::{Cli, Command};
use clap::Parser;
use tracing::Level;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Tags(args) => cmd::tags::run_tags(&args),
        Command::Inspect(args) => cmd::tags::run_inspect(&args),
        Command::Config(config_cmd) => cmd::config::run(config_cmd),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
