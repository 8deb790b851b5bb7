//! hexsge - hexagonal spatial gene expression binning
//!
//! Turns a single-molecule spatial transcriptomics table into a gene-by-unit
//! count matrix whose units are hexagons on a lattice that slides over
//! sub-cell offsets, written in the 10x-style `features`/`barcode`/`matrix`
//! MatrixMarket layout.
//!
//! # Usage
//!
//! ```bash
//! hexsge hexbin --input transcripts.tsv.gz --gene-id-info genes.tsv.gz \
//!     --output-pref out/sample.hex_24. --hex-width 24 --n-move 2
//! ```

extern crate hexsge_lib;
pub mod commands;
use anyhow::Result;
use env_logger::Env;
use hexsge_lib::utils;
use log::*;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// Spatial transcriptomics binning with hexagonal units
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Bin molecules into sliding hexagons and write a MatrixMarket matrix
    Hexbin(commands::HexbinArgs),
}

impl Subcommand {
    fn run(self) -> Result<()> {
        match self {
            Subcommand::Hexbin(args) => {
                commands::run_hexbin(args)?;
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = Args::from_args().subcommand.run() {
        if utils::is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{:#}", err);
        std::process::exit(1);
    }
    Ok(())
}
