//! Load `.topcolors.toml` settings (CLI only). Lib callers build [`Opts`] directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    settings: RunSection,
}

#[derive(Debug, Default, Deserialize)]
struct RunSection {
    input_path: Option<String>,
    output_path: Option<String>,
    queue_capacity: Option<usize>,
    worker_count: Option<usize>,
    /// Seconds.
    fetch_timeout: Option<u64>,
    fetch_retries: Option<u32>,
    max_image_bytes: Option<u64>,
    max_decode_alloc: Option<u64>,
    result_channel_capacity: Option<usize>,
    verbose: Option<bool>,
}

/// Load settings from `explicit`, or from the default settings file in the working directory.
/// Missing default file → None. An explicit path that can't be read or parsed is an error.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Option<SettingsFile>> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = PathBuf::from(PackagePaths::get().settings_filename());
            if !p.is_file() {
                return Ok(None);
            }
            p
        }
    };
    let s = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
    parse_settings(&s)
        .map(Some)
        .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
}

pub fn parse_settings(s: &str) -> Result<SettingsFile, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $sec.$field {
            $opts.$field = v;
        }
    };
}

/// Apply file settings to opts (only fields present in the file). Call before applying CLI.
pub fn apply_settings_to_opts(file: &SettingsFile, opts: &mut Opts) {
    let sec = &file.settings;
    if let Some(ref p) = sec.input_path {
        opts.input_path = PathBuf::from(p);
    }
    if let Some(ref p) = sec.output_path {
        opts.output_path = PathBuf::from(p);
    }
    apply_file_opt!(sec, opts, queue_capacity);
    if sec.worker_count.is_some() {
        opts.worker_count = sec.worker_count;
    }
    if let Some(secs) = sec.fetch_timeout {
        opts.fetch_timeout = Duration::from_secs(secs);
    }
    apply_file_opt!(sec, opts, fetch_retries);
    apply_file_opt!(sec, opts, max_image_bytes);
    apply_file_opt!(sec, opts, max_decode_alloc);
    if sec.result_channel_capacity.is_some() {
        opts.result_channel_capacity = sec.result_channel_capacity;
    }
    apply_file_opt!(sec, opts, verbose);
}
