//! Run one party of a private set intersection or join-and-compute.
//!
//! ```text
//! setops-party psi --config party0.json --input keys.csv
//! setops-party pjc --config party0.json --input keys_and_features.csv
//! ```

mod input;

use clap::{Args, Parser, Subcommand};
use eyre::{Context, Result};
use log::info;
use setops::{Pjc, Psi, SessionConfig};
use std::{fs::File, io::Write, path::PathBuf};

/// Two-party private set operations.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct Common {
    /// JSON session configuration.
    #[arg(long)]
    config: PathBuf,
    /// CSV input, one `key[,feature...]` record per row.
    #[arg(long)]
    input: PathBuf,
    /// The input starts with a header row.
    #[arg(long)]
    has_header: bool,
    /// Write the result as CSV to this file instead of standard output.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Log protocol progress at `info`.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Private set intersection; prints the common keys.
    Psi {
        #[command(flatten)]
        common: Common,
        /// Help the peer without learning the result.
        #[arg(long)]
        no_result: bool,
        /// Reveal only the size of the intersection.
        #[arg(long)]
        cardinality: bool,
    },
    /// Private join-and-compute; prints this party's shares, one row per line.
    Pjc {
        #[command(flatten)]
        common: Common,
    },
}

fn load(common: &Common) -> Result<(SessionConfig, input::Input)> {
    let config = SessionConfig::from_file(&common.config)
        .with_context(|| format!("loading {}", common.config.display()))?;
    let input = input::read(&common.input, common.has_header)?;
    info!(
        "party {}: {} keys, {} features",
        config.party_id,
        input.keys.len(),
        input.features.len()
    );
    Ok((config, input))
}

fn output(common: &Common) -> Result<Box<dyn Write>> {
    Ok(match &common.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    })
}

fn main() -> Result<()> {
    pretty_env_logger::init_timed();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Psi {
            common,
            no_result,
            cardinality,
        } => {
            let (config, input) = load(&common)?;
            let psi = Psi::new(config)?;
            if cardinality {
                let n = psi.process_cardinality_only(&input.keys, !no_result, common.verbose)?;
                if !no_result {
                    input::write(output(&common)?, [[n]])?;
                }
            } else {
                let found = psi.process(&input.keys, !no_result, common.verbose)?;
                input::write(output(&common)?, found.into_iter().map(|key| [key]))?;
            }
        }
        Command::Pjc { common } => {
            let (config, input) = load(&common)?;
            let shares = Pjc::new(config)?.process(&input.keys, &input.features, common.verbose)?;
            input::write(output(&common)?, shares.to_rows())?;
        }
    }
    Ok(())
}
