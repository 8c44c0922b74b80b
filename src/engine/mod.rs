//! Engine module: per-image algorithms, fetching, formatting, and the CLI front end

pub mod arg_parser;
pub mod cli;
pub mod fetcher;
pub mod format;
pub mod histogram;
pub mod progress;
pub mod topk;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::{build_opts, handle_run};
pub use fetcher::{FetchError, HttpImageFetcher, ImageFetcher, decode_image};
pub use format::{format_result_line, write_result_line};
pub use histogram::ColorHistogram;
pub use topk::top_k;
