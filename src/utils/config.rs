//! Application configuration constants.
//! Defaults and thresholds in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    results_filename: String,
    settings_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                results_filename: format!("{pkg}.csv"),
                settings_filename: format!(".{pkg}.toml"),
            }
        })
    }

    /// Default output file when none is given.
    pub fn results_filename(&self) -> &str {
        &self.results_filename
    }

    /// Settings file looked up in the working directory when `--config` is not given.
    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }
}

// ---- Worker threads ----

/// Thread limits for the worker pool.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Hard cap regardless of what the operator asks for.
    pub max: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            max: Self::MAX_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const MAX_THREADS: usize = 256;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    /// Honors `RAYON_NUM_THREADS`, so a single-core container can pin it to 1.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }
}

// ---- Queue ----

/// Bounded queue sizing.
pub struct QueueDefaults;

impl QueueDefaults {
    /// Max decoded images resident at once.
    pub const CAPACITY: usize = 10;
    /// Result channel capacity = queue capacity × this. Result lines are small.
    pub const RESULT_CHANNEL_FACTOR: usize = 4;
}

// ---- Fetching ----

/// Network and decode limits.
pub struct FetchDefaults;

impl FetchDefaults {
    pub const TIMEOUT_SECS: u64 = 30;
    /// Upper bound on `fetch_retries`.
    pub const MAX_RETRIES: u32 = 5;
    /// Pause between retry attempts (ms), multiplied by the attempt number.
    pub const RETRY_BACKOFF_MS: u64 = 250;
    /// Response body cap (bytes). 64 MB.
    pub const MAX_IMAGE_BYTES: u64 = 64 * 1024 * 1024;
    /// Decoder allocation limit (bytes). 512 MB.
    pub const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;
    pub const MAX_REDIRECTS: usize = 5;
}

// ---- Writer ----

/// Output batching.
pub struct WriterConsts;

impl WriterConsts {
    /// Upper bound on one batch of already-waiting lines, written with one call (bytes).
    pub const BATCH_BYTES: usize = 64 * 1024;
}

// ---- Skips ----

/// Skip events kept for the end-of-run listing. Later skips are only counted.
pub const SKIP_SAMPLE_CAP: usize = 100;

/// Number of colors reported per URL.
pub const TOP_COLORS: usize = 3;
