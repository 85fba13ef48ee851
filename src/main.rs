use clap::Parser;
use pricefeed::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
