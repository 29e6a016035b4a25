use crate::io::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stressmap")]
#[command(about = "Bayesian vehicle failure risk scoring", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a batch of vehicle contexts
    Score {
        /// JSON array of vehicle contexts
        #[arg(short, long)]
        contexts: PathBuf,

        /// Cohort catalog (defaults to the built-in catalog)
        #[arg(long, env = "STRESSMAP_CATALOG")]
        catalog: Option<PathBuf>,

        /// Configuration file (defaults to the nearest .stressmap.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of worker threads (0 = use the [parallel] setting)
        #[arg(short = 'j', long = "jobs", default_value = "0")]
        jobs: usize,

        /// Observation month for contexts that omit one (defaults to the current month)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        /// Disable parallel scoring
        #[arg(long = "no-parallel")]
        no_parallel: bool,

        /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Validate a cohort catalog and print a summary
    Catalog {
        /// Cohort catalog (defaults to the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Print the catalog as JSON instead of a summary
        #[arg(long)]
        json: bool,

        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Write a default .stressmap.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
