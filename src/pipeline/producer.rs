//! Producer loop: consumes the URL source, fetches and decodes each URL, pushes onto the queue.

use log::debug;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::engine::fetcher::ImageFetcher;
use crate::types::SkipReason;

use super::context::{PipelineContext, StageOutcome};
use super::error_handler::PipelineError;
use super::queue::QueueProducer;
use super::workers::panic_message;

pub fn spawn_producer_thread<I>(
    urls: I,
    producer: QueueProducer,
    fetcher: Arc<dyn ImageFetcher>,
    ctx: PipelineContext,
) -> JoinHandle<StageOutcome>
where
    I: Iterator<Item = io::Result<String>> + Send + 'static,
{
    thread::spawn(move || run_producer_loop(urls, producer, fetcher.as_ref(), &ctx))
}

/// Run the producer: for each non-blank line, take a residency slot (blocking while the queue is
/// at capacity), fetch + decode, and push. Fetch failures are recorded as skips and the loop moves
/// on. Closes the queue on every exit path. Counts the URLs submitted.
///
/// A read error from the source is fatal: cancellation is requested so the other stages wind down.
pub fn run_producer_loop<I>(
    urls: I,
    producer: QueueProducer,
    fetcher: &dyn ImageFetcher,
    ctx: &PipelineContext,
) -> StageOutcome
where
    I: Iterator<Item = io::Result<String>>,
{
    let mut submitted = 0_usize;
    for line in urls {
        if ctx.is_cancelled() {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                ctx.request_cancel();
                producer.close();
                return StageOutcome::failed(submitted, PipelineError::Input(e));
            }
        };
        let url = line.trim();
        if url.is_empty() {
            continue;
        }
        submitted += 1;
        debug!("fetching {}", url);

        let permit = producer.reserve();
        if ctx.is_cancelled() {
            ctx.discard(1);
            break;
        }
        let fetched = catch_unwind(AssertUnwindSafe(|| fetcher.fetch(url)));
        match fetched {
            Ok(Ok(image)) => {
                if producer.push(image, permit).is_err() {
                    // Every worker is gone; nothing can consume further jobs.
                    ctx.discard(1);
                    break;
                }
            }
            Ok(Err(e)) => ctx.skips.record(url, SkipReason::Fetch(e.to_string())),
            Err(payload) => ctx.skips.record(
                url,
                SkipReason::Fetch(format!("fetcher panicked: {}", panic_message(&*payload))),
            ),
        }
    }
    debug!("producer: source exhausted or stopped after {} URLs", submitted);
    producer.close();
    StageOutcome::done(submitted)
}
