use crossbeam_channel::Sender;
use log::debug;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, JoinHandle};

use crate::engine::histogram::ColorHistogram;
use crate::types::{DecodedImage, ResultLine, SkipReason};
use crate::utils::config::TOP_COLORS;

use super::context::PipelineContext;
use super::queue::QueueConsumer;

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Histogram + top-k for one image. The image (pixel buffer and residency permit) is dropped
/// before this returns, so it never outlives its histogram.
pub fn process_image(image: DecodedImage) -> ResultLine {
    let hist = ColorHistogram::accumulate(&image);
    let DecodedImage {
        url,
        pixels,
        permit,
    } = image;
    drop(pixels);
    drop(permit);
    ResultLine {
        url,
        colors: hist.top_k(TOP_COLORS),
    }
}

/// Single worker: pop images, run `job` on each, send the line to the writer.
/// A panic inside one job is recorded as a skip; the worker moves on to the next job.
/// After cancellation, remaining jobs are popped and dropped so the producer can unblock.
pub fn worker_loop<F>(
    consumer: QueueConsumer,
    result_tx: Sender<ResultLine>,
    ctx: PipelineContext,
    job: F,
) where
    F: Fn(DecodedImage) -> ResultLine,
{
    while let Some(image) = consumer.pop() {
        if ctx.is_cancelled() {
            ctx.discard(1);
            continue;
        }
        let url = image.url.clone();
        match catch_unwind(AssertUnwindSafe(|| job(image))) {
            Ok(line) => {
                if result_tx.send(line).is_err() {
                    // Writer is gone; only happens once the run is failing.
                    ctx.discard(1);
                }
            }
            Err(payload) => ctx
                .skips
                .record(&url, SkipReason::WorkerPanic(panic_message(&*payload))),
        }
    }
    debug!("worker: queue drained");
    drop(result_tx);
}

/// Spawn `num_workers` workers. Caller must drop its own `result_tx` after this so the writer
/// sees the channel close once every worker exits.
pub fn spawn_workers(
    consumer: &QueueConsumer,
    result_tx: &Sender<ResultLine>,
    ctx: &PipelineContext,
    num_workers: usize,
) -> Vec<JoinHandle<()>> {
    (0..num_workers)
        .map(|_| {
            let consumer = consumer.clone();
            let result_tx = result_tx.clone();
            let ctx = ctx.clone();
            thread::spawn(move || worker_loop(consumer, result_tx, ctx, process_image))
        })
        .collect()
}
