//! Death pool standings: animated GIF, one frame per cumulative year range
//!
//! Same configuration as the grid binary, with the mode forced to sequence.

use anyhow::Context;
use death_pool::config::CONFIG_FILE;
use death_pool::logging::init_logging;
use death_pool::{run, PoolConfig, RenderMode};
use std::path::Path;

fn main() {
    init_logging();
    println!("Death Pool Standings (animated) v{}\n", env!("CARGO_PKG_VERSION"));

    if let Err(e) = try_main() {
        eprintln!("\n✗ {:#}", e);
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let config = PoolConfig::load_or_default(Path::new(CONFIG_FILE))
        .context("Could not load configuration")?
        .with_mode(RenderMode::Sequence);
    let report = run(&config).context("Could not render animation")?;
    report.print_summary();
    Ok(())
}
