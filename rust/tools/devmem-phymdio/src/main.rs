//! Dumps the MDIO controller and PHY registers on Beaglebone / TI814x class systems.

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use devmem::{DEFAULT_BACKING_PATH, RegionOptions};

mod mdio;

use mdio::{MDIO_BASE, PhyMdio};

#[derive(Parser, Debug)]
#[command(name = "phymdio")]
#[command(about = "Dump MDIO controller and PHY registers")]
#[command(version)]
struct Cli {
    /// Base address of the MDIO controller
    #[arg(value_name = "ADDR", default_value_t = MDIO_BASE, value_parser = parse_address)]
    base_addr: u64,

    /// File to open with mmap()
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_BACKING_PATH)]
    mmap: PathBuf,

    /// How long to wait for each PHY register access, in milliseconds
    #[arg(short, long, default_value_t = 100)]
    timeout_ms: u64,

    /// Provide debugging information
    #[arg(short, long)]
    debug: bool,
}

fn parse_address(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let res = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    res.map_err(|e| format!("invalid address '{s}': {e}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.debug { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();

    let options = RegionOptions::new()
        .with_backing_path(&cli.mmap)
        .with_debug(cli.debug);
    let mut mdio =
        PhyMdio::open(cli.base_addr, &options)?.with_timeout(Duration::from_millis(cli.timeout_ms));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    mdio.dump(&mut out)
}
