//! topcolors: three most prevalent colors per image, for URL lists far larger than memory.
//!
//! Producer (fetch + decode) → bounded queue → worker pool (histogram + top-3) → single writer.
//! At most `queue_capacity` decoded images are alive at once, however long the input is.

pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use log::debug;
use std::sync::Arc;

/// Result alias used by public topcolors API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: read `opts.input_path`, recreate `opts.output_path`, fetch over HTTP, and
/// return the run summary.
///
/// Per-URL failures are skipped and counted; only setup, input, and output failures return `Err`
/// (downcast to [`pipeline::PipelineError`] for the kind).
pub fn run(opts: &Opts) -> Result<RunSummary> {
    let fetcher = engine::HttpImageFetcher::new(opts)?;
    run_with_fetcher(opts, Arc::new(fetcher))
}

/// Same as [`run`] with a caller-supplied [`engine::ImageFetcher`] (other transports, tests).
pub fn run_with_fetcher(
    opts: &Opts,
    fetcher: Arc<dyn engine::ImageFetcher>,
) -> Result<RunSummary> {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    pipeline::Pipeline::new(opts.clone(), fetcher).run_from_paths()
}
