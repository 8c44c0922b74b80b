//! topcolors CLI: three most prevalent colors for each image URL in a list.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use topcolors::engine::arg_parser::Cli;
use topcolors::engine::handle_run;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
