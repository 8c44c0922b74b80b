use log::{info, warn};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

use crate::types::{RunSummary, SkipEvent, SkipReason};
use crate::utils::config::SKIP_SAMPLE_CAP;

/// Failures that end the run. Per-URL failures never become one of these.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input or output could not be opened; nothing was started.
    #[error("cannot {what} {}", .path.display())]
    Setup {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// URL source failed mid-stream.
    #[error("reading URL source")]
    Input(#[source] io::Error),
    /// Output became unwritable mid-run.
    #[error("writing results")]
    Write(#[source] io::Error),
    /// Shutdown was requested before the input was exhausted.
    #[error("cancelled by user; partial output was flushed")]
    Cancelled,
    #[error("{0} thread panicked")]
    StagePanicked(&'static str),
}

/// Skip events for one run: every skip is counted and logged, the first few are kept.
#[derive(Debug, Default)]
pub struct SkipLog {
    count: AtomicUsize,
    sample: Mutex<Vec<SkipEvent>>,
}

impl SkipLog {
    /// Record one skipped URL. Logged at warn; retained only while under [`SKIP_SAMPLE_CAP`].
    pub fn record(&self, url: &str, reason: SkipReason) {
        warn!("skipping {}: {}", url, reason);
        self.count.fetch_add(1, Ordering::Relaxed);
        let mut sample = self.sample.lock().unwrap();
        if sample.len() < SKIP_SAMPLE_CAP {
            sample.push(SkipEvent {
                url: url.to_string(),
                reason,
            });
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Retained skip events, oldest first.
    pub fn sample(&self) -> Vec<SkipEvent> {
        self.sample.lock().unwrap().clone()
    }
}

/// Log the end-of-run summary; in verbose mode also list the retained skip events.
pub fn report_summary(summary: &RunSummary, skips: &SkipLog, verbose: bool) {
    info!(
        "processed {} of {} URLs ({} skipped, {} discarded) in {:.1?}; peak resident images: {}",
        summary.written,
        summary.submitted,
        summary.skipped,
        summary.discarded,
        summary.elapsed,
        summary.peak_resident
    );
    if summary.skipped > 0 && verbose {
        let sample = skips.sample();
        for ev in &sample {
            eprintln!("  skipped: {} ({})", ev.url, ev.reason);
        }
        if summary.skipped > sample.len() {
            eprintln!("  ... and {} more", summary.skipped - sample.len());
        }
    }
}
