use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, CommandFactory, Parser};
use devmem::{DEFAULT_BACKING_PATH, RegionOptions, WordSize};

mod commands;
mod utils;

use commands::Operation;

#[derive(Parser, Debug)]
#[command(name = "devmem")]
#[command(about = "Read and write memory-mapped device registers")]
#[command(version)]
#[command(group(ArgGroup::new("operation").required(true).args(["read", "write"])))]
struct Cli {
    /// Read a value
    #[arg(short, long, value_name = "ADDR", value_parser = utils::parse_address)]
    read: Option<u64>,

    /// Write a value
    #[arg(
        short,
        long,
        num_args = 2,
        value_names = ["ADDR", "VALUE"],
        value_parser = utils::parse_address
    )]
    write: Option<Vec<u64>>,

    /// Number of words to read
    #[arg(
        short,
        long,
        default_value = "1",
        allow_negative_numbers = true,
        value_parser = utils::parse_count
    )]
    num: i64,

    /// Size of word when displayed; registers are always accessed as 32-bit words
    #[arg(short = 's', long, default_value = "4", value_parser = utils::parse_word_size)]
    word_size: WordSize,

    /// File to open with mmap()
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_BACKING_PATH)]
    mmap: PathBuf,

    /// Provide more information regarding operation
    #[arg(short, long)]
    verbose: bool,

    /// Provide debugging information
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    /// Resolves the parsed flags into a single operation.
    fn operation(&self) -> Result<Operation> {
        if self.num < 0 {
            anyhow::bail!("Invalid num of words specified");
        }
        match (self.read, self.write.as_deref()) {
            (Some(addr), None) => Ok(Operation::Read {
                addr,
                count: usize::try_from(self.num)?,
            }),
            (None, Some(&[addr, value])) => {
                if self.num != 1 {
                    eprintln!("Warning: Forcing number of words to 1 for set operation\n");
                }
                let value = u32::try_from(value)
                    .map_err(|_| anyhow::anyhow!("Value {value:#x} does not fit a 32-bit word"))?;
                Ok(Operation::Write { addr, value })
            }
            _ => anyhow::bail!("Exactly one of --read or --write must be specified"),
        }
    }

    fn region_options(&self) -> RegionOptions {
        RegionOptions::new()
            .with_backing_path(&self.mmap)
            .with_word_size(WordSize::Four)
            .with_debug(self.debug)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.debug);

    if cli.num < 0 {
        Cli::command().print_help()?;
        println!();
    }
    let operation = cli.operation()?;
    log::debug!("{operation:?} on {}", cli.mmap.display());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(
        operation,
        &cli.region_options(),
        cli.word_size,
        cli.verbose,
        &mut out,
    )
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Operation};
    use devmem::WordSize;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_read() {
        let cli = Cli::try_parse_from(["devmem", "-r", "0x4A101080", "-n", "4", "-s", "2"]).unwrap();
        assert_eq!(cli.word_size, WordSize::Two);
        assert_eq!(cli.mmap.to_str(), Some("/dev/mem"));
        assert_eq!(
            cli.operation().unwrap(),
            Operation::Read {
                addr: 0x4A101080,
                count: 4
            }
        );
    }

    #[test]
    fn test_parse_write() {
        let cli = Cli::try_parse_from(["devmem", "--write", "0x1000", "42", "--num", "3"]).unwrap();
        assert_eq!(
            cli.operation().unwrap(),
            Operation::Write {
                addr: 0x1000,
                value: 42
            }
        );

        let cli = Cli::try_parse_from(["devmem", "-w", "0x1000", "0x100000000"]).unwrap();
        assert!(cli.operation().is_err());
    }

    #[test]
    fn test_invalid_combinations() {
        assert!(Cli::try_parse_from(["devmem"]).is_err());
        assert!(Cli::try_parse_from(["devmem", "-r", "0x10", "-w", "0x10", "1"]).is_err());
        assert!(Cli::try_parse_from(["devmem", "-r", "0x10", "-s", "3"]).is_err());
        assert!(Cli::try_parse_from(["devmem", "-w", "0x10"]).is_err());
        assert!(Cli::try_parse_from(["devmem", "-r", "zz"]).is_err());
    }

    #[test]
    fn test_negative_count() {
        let cli = Cli::try_parse_from(["devmem", "-r", "0x10", "-n", "-1"]).unwrap();
        assert_eq!(cli.num, -1);
        let err = cli.operation().unwrap_err();
        assert_eq!(err.to_string(), "Invalid num of words specified");
    }

    #[test]
    fn test_word_size_only_affects_display() {
        for size in ["1", "2", "4"] {
            let cli = Cli::try_parse_from(["devmem", "-r", "0x1000", "-s", size]).unwrap();
            assert_eq!(cli.region_options().word_size(), WordSize::Four);
        }
    }

    #[test]
    fn test_flags() {
        let cli =
            Cli::try_parse_from(["devmem", "-r", "16", "-m", "/tmp/mem", "-v", "-d"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.debug);
        let options = cli.region_options();
        assert_eq!(options.backing_path().to_str(), Some("/tmp/mem"));
        assert!(options.debug());
    }
}
