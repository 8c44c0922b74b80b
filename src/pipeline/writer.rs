//! Result writer: the only stage that touches the output sink.

use crossbeam_channel::Receiver;
use log::{debug, error};
use std::io;
use std::thread::{self, JoinHandle};

use crate::engine::format::write_result_line;
use crate::types::ResultLine;
use crate::utils::config::WriterConsts;
use crate::utils::io::OutputSink;

use super::context::{PipelineContext, StageOutcome};
use super::error_handler::PipelineError;

/// Called with the number of lines just written (progress).
pub type OnWritten = Box<dyn Fn(usize) + Send>;

pub fn spawn_writer_thread<W>(
    sink: W,
    result_rx: Receiver<ResultLine>,
    ctx: PipelineContext,
    on_written: Option<OnWritten>,
) -> JoinHandle<StageOutcome>
where
    W: OutputSink + Send + 'static,
{
    thread::spawn(move || run_writer_loop(sink, result_rx, &ctx, on_written))
}

/// Receive result lines until every worker has dropped its sender, appending each to `sink`.
///
/// The writer blocks only when nothing is waiting. Lines already queued are gathered into one
/// batch (up to [`WriterConsts::BATCH_BYTES`]) and appended with a single `write_all`; a lone line
/// goes out immediately. A batch lands whole or not at all: a failed write is truncated back to
/// the end of the last good batch. After a write error the run is cancelled, the rest of the
/// channel is drained and discarded (so workers never block on a dead writer), and the error is
/// returned next to the count of lines written.
pub fn run_writer_loop<W: OutputSink>(
    mut sink: W,
    result_rx: Receiver<ResultLine>,
    ctx: &PipelineContext,
    on_written: Option<OnWritten>,
) -> StageOutcome {
    let mut batch = String::with_capacity(WriterConsts::BATCH_BYTES);
    let mut written = 0_usize;
    let mut committed = 0_u64;
    let mut failure: Option<io::Error> = None;

    match sink.end_offset() {
        Ok(len) => committed = len,
        Err(e) => {
            error!("cannot read output length: {}", e);
            ctx.request_cancel();
            failure = Some(e);
        }
    }

    while let Ok(line) = result_rx.recv() {
        if failure.is_some() {
            ctx.discard(1);
            continue;
        }
        write_result_line(&mut batch, &line);
        let mut batch_lines = 1_usize;
        while batch.len() < WriterConsts::BATCH_BYTES {
            match result_rx.try_recv() {
                Ok(line) => {
                    write_result_line(&mut batch, &line);
                    batch_lines += 1;
                }
                Err(_) => break,
            }
        }

        match append_batch(&mut sink, &batch, committed) {
            Ok(()) => {
                committed += batch.len() as u64;
                written += batch_lines;
                if let Some(cb) = &on_written {
                    cb(batch_lines);
                }
            }
            Err(e) => {
                error!("output became unwritable: {}", e);
                ctx.request_cancel();
                ctx.discard(batch_lines);
                failure = Some(e);
            }
        }
        batch.clear();
    }

    if failure.is_none()
        && let Err(e) = sink.flush()
    {
        failure = Some(e);
    }

    debug!("writer: channel closed, {} lines written", written);
    match failure {
        Some(e) => StageOutcome::failed(written, PipelineError::Write(e)),
        None => StageOutcome::done(written),
    }
}

/// Append `batch` in full, or roll the sink back to `committed` so no partial line remains.
fn append_batch<W: OutputSink>(sink: &mut W, batch: &str, committed: u64) -> io::Result<()> {
    match sink.write_all(batch.as_bytes()) {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Err(undo) = sink.truncate_to(committed) {
                error!("cannot roll back partial write: {}", undo);
            }
            Err(e)
        }
    }
}
