use anyhow::Result;
use clap::Parser;

use lexdrill::cli::{self, Cli};

fn main() -> Result<()> {
    cli::run(Cli::parse())
}
