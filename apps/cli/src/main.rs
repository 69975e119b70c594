//! pdblink CLI: link debug symbols to hosted source.
//!
//! Writes a source-server index into each symbol file so a debugger can
//! fetch the exact revision of every source file from its hosting service.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
