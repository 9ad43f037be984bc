use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sgra_observations::Band;

pub const DEFAULT_TABLE: &str = "data/sgr_a_observations.tsv";

#[derive(Parser, Debug)]
#[command(
    name = "sgra-obs",
    version,
    about = "Inspect and convert the Sgr A* observation reference table"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "SGRA_OBS_TABLE",
        default_value = DEFAULT_TABLE,
        help = "Observation table (.tsv, .csv, .json or .parquet)"
    )]
    pub table: PathBuf,
    #[arg(long, global = true, help = "JSON file with loader options")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the table and report whether every row is valid.
    Validate,
    /// Print records in file order.
    List {
        #[arg(long, help = "Only records of this band (radio, nir_ir, xray)")]
        band: Option<Band>,
    },
    /// Print the distinct source citations.
    Citations,
    /// Per-band record count and frequency/luminosity envelope.
    Summary,
    /// Write the table in the format implied by OUTPUT's extension.
    Convert { output: PathBuf },
    /// Import the legacy split per-band tables from DIR and save them to OUTPUT.
    ImportLegacy { dir: PathBuf, output: PathBuf },
}
