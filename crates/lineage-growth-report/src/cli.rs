use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for the `growth-report` binary.
#[derive(Debug, Parser)]
#[command(
    name = "growth-report",
    version,
    about = "Lineage growth-rate and SGTF takeover reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML file with `[growth]` and `[takeover]` settings
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory the CSV reports are written to
    #[arg(short, long, global = true, default_value = ".")]
    pub out_dir: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Estimate lineage growth rates from sequence records
    Growth(GrowthArgs),

    /// Estimate variant takeover from a daily proportion series
    Takeover(TakeoverArgs),
}

#[derive(Debug, Args)]
pub struct GrowthArgs {
    /// Sequence records CSV (ID, collection_date, epiweek, lineage, state)
    pub sequences: PathBuf,

    /// Regions to report on; each is run independently
    #[arg(short, long = "region", default_value = "San Diego")]
    pub regions: Vec<String>,

    /// Forced-keep lineage list, one label per line
    #[arg(long)]
    pub forced: Option<PathBuf>,

    /// Variant-name table, `label,name` per line
    #[arg(long)]
    pub variant_names: Option<PathBuf>,

    /// PANGO alias_key.json (built-in table when absent)
    #[arg(long)]
    pub aliases: Option<PathBuf>,

    /// Labels need more than this many window records to be kept
    #[arg(long)]
    pub min_count: Option<usize>,

    /// Number of trailing qualifying weeks
    #[arg(long)]
    pub window_weeks: Option<usize>,

    /// Fewest qualifying weeks accepted
    #[arg(long)]
    pub required_weeks: Option<usize>,

    /// Number of fastest growers in the filtered table
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Write reports for the regions that succeeded even if others failed
    #[arg(long)]
    pub allow_partial: bool,
}

#[derive(Debug, Args)]
pub struct TakeoverArgs {
    /// Daily proportion CSV
    pub series: PathBuf,

    /// Date column
    #[arg(long, default_value = "Date")]
    pub date_column: String,

    /// Numerator column
    #[arg(long, default_value = "sgtf_likely")]
    pub numerator_column: String,

    /// Denominator column
    #[arg(long, default_value = "total_positive")]
    pub denominator_column: String,

    /// Number of simulated days
    #[arg(long)]
    pub horizon_days: Option<usize>,

    /// Search crossing dates from this date (YYYY-MM-DD)
    #[arg(long)]
    pub anchor: Option<chrono::NaiveDate>,

    /// Use symmetric one-sigma bounds instead of the reference policy
    #[arg(long)]
    pub symmetric: bool,

    /// Mixture term (1-3) whose rate is reported as the growth rate
    #[arg(long)]
    pub growth_term: Option<usize>,
}
