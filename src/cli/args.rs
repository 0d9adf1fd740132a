use crate::readers::ReferenceDataset;
use crate::writers::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ghcn-anomaly")]
#[command(about = "Global land temperature anomaly series from GHCN-M station data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Pipeline configuration file (TOML)")]
    pub config: Option<PathBuf>,
}

/// Where the GHCN tables come from
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    #[arg(
        short,
        long,
        help = "Extracted GHCN-M directory containing the .dat and .inv files"
    )]
    pub input_dir: Option<PathBuf>,

    #[arg(long, help = "GHCN-M .dat file (overrides --input-dir)")]
    pub data_file: Option<PathBuf>,

    #[arg(long, help = "GHCN-M .inv file (overrides --input-dir)")]
    pub inventory_file: Option<PathBuf>,
}

/// Reference period, output range and execution settings
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    #[arg(long, help = "First year of the reference period [default: 1961]")]
    pub baseline_start: Option<i32>,

    #[arg(long, help = "Last year of the reference period [default: 1990]")]
    pub baseline_end: Option<i32>,

    #[arg(long, help = "First output year [default: 1900]")]
    pub first_year: Option<i32>,

    #[arg(long, help = "Last output year [default: last complete year]")]
    pub last_year: Option<i32>,

    #[arg(long)]
    pub max_workers: Option<usize>,

    #[arg(long, help = "Fail on malformed lines and zero-weight years")]
    pub strict: bool,

    #[arg(long, help = "Use buffered reads instead of memory mapping")]
    pub no_mmap: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(short, long, help = "Output file path [default: output/<name>-{YYMMDD}.<ext>]")]
    pub output_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Output format: csv, json or parquet [default: from extension, else csv]"
    )]
    pub format: Option<OutputFormat>,

    #[arg(short, long, default_value = "snappy", help = "Parquet compression")]
    pub compression: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the area-weighted global anomaly series
    Process {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short, long, help = "Land-mask CSV (gridbox,land_percent,ocean_percent)")]
        land_mask: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Read and check the input tables without writing output
    Validate {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short, long)]
        land_mask: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[arg(long, help = "Also run the pipeline and report its counts")]
        dry_run: bool,
    },

    /// Unweighted mean absolute temperature of complete station-years
    SimpleAverage {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Import a published reference series (CRUTEM or GISTEMP)
    Reference {
        #[arg(short, long, help = "Dataset: crutem or giss")]
        dataset: ReferenceDataset,

        #[arg(short, long, help = "Downloaded reference file")]
        input_file: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Display a written series file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10", help = "Rows to print (0 = all)")]
        sample: usize,
    },
}
