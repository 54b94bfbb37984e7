mod cli;

use clap::Parser;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

use crate::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match &cli.command {
        Commands::Contacts(args) => cli::contacts::run(args),
        Commands::Features(args) => cli::features::run(args),
    }
}

/// Log to stderr, with -v for info, -vv for debug and -vvv for trace.
fn setup_logging(verbosity: u8) {
    let level_filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(level_filter)
        .with(stderr_layer)
        .init();
}
