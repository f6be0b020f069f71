//! Terminal front end for Jotter.
//!
//! # Responsibility
//! - Map subcommands onto note store operations.
//! - Render notes as compact cards with relative creation age.

mod cli;
mod recognizer;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
