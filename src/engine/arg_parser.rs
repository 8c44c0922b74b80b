use clap::Parser;
use std::path::PathBuf;

/// Top three colors per image for a (very long) list of image URLs.
#[derive(Clone, Debug, Parser)]
#[command(name = "topcolors")]
#[command(
    about = "Fetch each image URL, find its three most prevalent RGB colors, and write url, #rrggbb, #rrggbb, #rrggbb per line."
)]
pub struct Cli {
    /// Line-delimited list of image URLs. Required unless set in the settings file.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output file. Removed and recreated at start. Default: topcolors.csv.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Max decoded images held in memory at once.
    #[arg(long, short = 'q', value_parser = clap::value_parser!(u32).range(1..))]
    pub queue_capacity: Option<u32>,

    /// Worker threads. Default: available CPUs. Use 1 to stay on a single core.
    #[arg(long, short = 'w', value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Per-request timeout in seconds.
    #[arg(long, short = 't', value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Extra attempts for network errors and timeouts (max 5).
    #[arg(long)]
    pub retries: Option<u32>,

    /// Settings file. Default: .topcolors.toml in the working directory, if present.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Verbose output: progress counter, debug logs, and skipped URLs at the end.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
