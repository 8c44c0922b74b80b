//! Public and internal types for the topcolors API and pipeline.

use image::RgbImage;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::queue::ResidencyPermit;
use crate::utils::config::{FetchDefaults, PackagePaths, QueueDefaults, WorkerThreadLimits};

/// 24-bit RGB value packed as `0xRRGGBB`.
///
/// Ordering is numeric, which for fixed-width lowercase hex is the same as comparing the
/// `#rrggbb` strings lexicographically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rgb24(u32);

impl Rgb24 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb24(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Canonical `#rrggbb` (lowercase, zero-padded).
    pub fn to_hex(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl From<[u8; 3]> for Rgb24 {
    fn from(p: [u8; 3]) -> Self {
        Rgb24::new(p[0], p[1], p[2])
    }
}

/// One decoded image in flight. Holds a residency permit: dropping the image releases a slot
/// in the bounded queue, so the pixel buffer must be dropped as soon as its histogram is built.
pub struct DecodedImage {
    pub url: String,
    pub pixels: RgbImage,
    pub(crate) permit: Option<ResidencyPermit>,
}

impl DecodedImage {
    /// Image without a residency permit (tests, or callers outside the pipeline).
    pub fn new(url: impl Into<String>, pixels: RgbImage) -> Self {
        Self {
            url: url.into(),
            pixels,
            permit: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub(crate) fn attach_permit(&mut self, permit: ResidencyPermit) {
        self.permit = Some(permit);
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("url", &self.url)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("permit", &self.permit.is_some())
            .finish()
    }
}

/// Up to three colors, most frequent first.
pub type TopKResult = Vec<Rgb24>;

/// The unit handed to the writer: one URL and its ranked colors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultLine {
    pub url: String,
    pub colors: TopKResult,
}

/// Why a URL produced no output line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Fetch or decode failed (see [`crate::engine::fetcher::FetchError`]).
    Fetch(String),
    /// Histogram or top-k panicked for this image; the worker kept going.
    WorkerPanic(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Fetch(msg) => write!(f, "{msg}"),
            SkipReason::WorkerPanic(msg) => write!(f, "worker panicked: {msg}"),
        }
    }
}

/// A recoverable per-URL failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkipEvent {
    pub url: String,
    pub reason: SkipReason,
}

/// Counts reported at the end of a run. `written + skipped + discarded == submitted`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Non-blank input lines handed to the producer.
    pub submitted: usize,
    /// Lines appended to the output.
    pub written: usize,
    /// URLs that produced a skip event.
    pub skipped: usize,
    /// Jobs dropped unprocessed because the run was cancelled.
    pub discarded: usize,
    /// Highest number of decoded images resident at once.
    pub peak_resident: usize,
    pub elapsed: Duration,
}

/// Full run options (CLI, settings file, lib).
#[derive(Clone, Debug)]
pub struct Opts {
    /// Line-delimited URL list.
    pub input_path: PathBuf,
    /// CSV-style output; removed and recreated at start.
    pub output_path: PathBuf,
    /// Max decoded images resident at once.
    pub queue_capacity: usize,
    /// Worker thread count. When None, uses available CPU parallelism.
    pub worker_count: Option<usize>,
    /// Per-request timeout (connect + body).
    pub fetch_timeout: Duration,
    /// Extra attempts for network/timeout failures.
    pub fetch_retries: u32,
    /// Response bodies larger than this are skipped (bytes).
    pub max_image_bytes: u64,
    /// Decoder allocation limit (bytes).
    pub max_decode_alloc: u64,
    /// Capacity of the worker → writer channel. When None, 4 × queue capacity.
    pub result_channel_capacity: Option<usize>,
    /// Show progress counter and list skipped URLs at the end.
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_path: PathBuf::from(PackagePaths::get().results_filename()),
            queue_capacity: QueueDefaults::CAPACITY,
            worker_count: None,
            fetch_timeout: Duration::from_secs(FetchDefaults::TIMEOUT_SECS),
            fetch_retries: 0,
            max_image_bytes: FetchDefaults::MAX_IMAGE_BYTES,
            max_decode_alloc: FetchDefaults::MAX_DECODE_ALLOC,
            result_channel_capacity: None,
            verbose: false,
        }
    }
}

impl Opts {
    /// Worker count after applying the CPU default, clamped to `1..=WorkerThreadLimits::MAX_THREADS`.
    pub fn effective_workers(&self) -> usize {
        let limits = WorkerThreadLimits::current();
        self.worker_count
            .unwrap_or(limits.all_threads)
            .clamp(1, limits.max)
    }

    /// Queue capacity clamped to at least 1.
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }

    pub fn effective_result_capacity(&self) -> usize {
        self.result_channel_capacity
            .unwrap_or(self.effective_queue_capacity() * QueueDefaults::RESULT_CHANNEL_FACTOR)
            .max(1)
    }

    /// Retries clamped to [`FetchDefaults::MAX_RETRIES`].
    pub fn effective_retries(&self) -> u32 {
        self.fetch_retries.min(FetchDefaults::MAX_RETRIES)
    }
}
