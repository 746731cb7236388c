//! Death pool standings: grid of cumulative year-range panels
//!
//! Reads `death_pool.json` from the working directory when present; the
//! output mode comes from that file (grid by default). A saved grid is opened
//! in the desktop viewer when a display is available.

use anyhow::Context;
use death_pool::config::CONFIG_FILE;
use death_pool::display::show_grid;
use death_pool::logging::init_logging;
use death_pool::{run, PoolConfig};
use std::path::Path;

fn main() {
    init_logging();
    println!("Death Pool Standings v{}\n", env!("CARGO_PKG_VERSION"));

    if let Err(e) = try_main() {
        eprintln!("\n✗ {:#}", e);
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let config = PoolConfig::load_or_default(Path::new(CONFIG_FILE))
        .context("Could not load configuration")?;
    let report = run(&config).context("Could not render standings")?;
    report.print_summary();
    show_grid(&report, &config);
    Ok(())
}
