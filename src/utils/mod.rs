pub mod config;
pub mod config_file;
pub mod io;
pub mod logger;

pub use config::*;
pub use config_file::{apply_settings_to_opts, load_settings};
pub use io::{OutputSink, open_url_source, prepare_output_file};
pub use logger::setup_logging;
