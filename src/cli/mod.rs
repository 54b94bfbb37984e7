use clap::{Parser, Subcommand};

pub(crate) mod contacts;
pub(crate) mod features;

#[derive(Parser, Debug)]
#[command(version, about)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Verbosity of the program:
    /// -v for info, -vv for debug, and -vvv for trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Detect non-covalent contacts and write them to a table
    Contacts(contacts::Args),
    /// Derive chemical features without pairing them up
    Features(features::Args),
}
