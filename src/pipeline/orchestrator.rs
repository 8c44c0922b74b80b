use anyhow::Result;
use log::debug;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use crate::Opts;
use crate::engine::fetcher::ImageFetcher;
use crate::pipeline;
use crate::pipeline::context::StageOutcome;
use crate::pipeline::error_handler::{PipelineError, report_summary};
use crate::pipeline::writer::OnWritten;
use crate::types::{RunSummary, SkipEvent};
use crate::utils::io::{OutputSink, open_url_source, prepare_output_file};

/// Coordinator lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Draining,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Running => "running",
            PipelineState::Draining => "draining",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Wires producer → queue → workers → writer for one run and owns the run's lifecycle.
///
/// Output order is completion order: with more than one worker it need not match input order.
pub struct Pipeline {
    opts: Opts,
    fetcher: Arc<dyn ImageFetcher>,
    ctx: pipeline::PipelineContext,
    state: PipelineState,
    on_written: Option<OnWritten>,
    summary: Option<RunSummary>,
}

impl Pipeline {
    pub fn new(opts: Opts, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            opts,
            fetcher,
            ctx: pipeline::PipelineContext::default(),
            state: PipelineState::Idle,
            on_written: None,
            summary: None,
        }
    }

    /// Share an existing shutdown flag (e.g. one set by a Ctrl+C handler).
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.ctx = pipeline::PipelineContext::new(cancel);
        self
    }

    /// Progress callback invoked by the writer with the number of lines just written.
    pub fn with_progress(mut self, on_written: OnWritten) -> Self {
        self.on_written = Some(on_written);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Setting this flag starts the coordinated shutdown.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.ctx.cancel)
    }

    /// Counts from the last run that got past setup, including one that ended in `Err`.
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    /// Retained skip events (the first few of the run).
    pub fn skip_events(&self) -> Vec<SkipEvent> {
        self.ctx.skips.sample()
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("pipeline: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Fail before anything was spawned.
    pub(crate) fn fail_setup(&mut self, err: PipelineError) -> anyhow::Error {
        self.transition(PipelineState::Failed);
        err.into()
    }

    /// Start all stages. Returns handles; caller must [`Pipeline::finish`] them.
    pub fn start<I, W>(&mut self, urls: I, sink: W) -> pipeline::PipelineHandles
    where
        I: Iterator<Item = io::Result<String>> + Send + 'static,
        W: OutputSink + Send + 'static,
    {
        let tuning = pipeline::PipelineTuning::from(&self.opts);
        debug!(
            "starting: {} workers, queue capacity {}, result channel {}",
            tuning.num_workers, tuning.queue_capacity, tuning.result_channel_cap
        );
        let channels = pipeline::create_pipeline_channels(&tuning);

        let writer_handle = pipeline::spawn_writer_thread(
            sink,
            channels.result_rx,
            self.ctx.clone(),
            self.on_written.take(),
        );
        let worker_handles = pipeline::spawn_workers(
            &channels.consumer,
            &channels.result_tx,
            &self.ctx,
            tuning.num_workers,
        );
        // Dropping our copies leaves the workers as the only holders, so the channels close
        // exactly when the stages upstream of them are done.
        drop(channels.result_tx);
        drop(channels.consumer);

        let producer_handle = pipeline::spawn_producer_thread(
            urls,
            channels.producer,
            Arc::clone(&self.fetcher),
            self.ctx.clone(),
        );
        self.transition(PipelineState::Running);

        pipeline::PipelineHandles {
            producer_handle,
            worker_handles,
            writer_handle,
            stats: channels.stats,
        }
    }

    /// Join every stage in pipeline order and build the summary.
    pub fn finish(
        &mut self,
        handles: pipeline::PipelineHandles,
        started: Instant,
    ) -> Result<RunSummary> {
        let pipeline::PipelineHandles {
            producer_handle,
            worker_handles,
            writer_handle,
            stats,
        } = handles;

        let produced = producer_handle.join().unwrap_or_else(|_| {
            StageOutcome::failed(0, PipelineError::StagePanicked("producer"))
        });
        self.transition(PipelineState::Draining);
        let mut worker_panicked = false;
        for h in worker_handles {
            worker_panicked |= h.join().is_err();
        }
        let written = writer_handle
            .join()
            .unwrap_or_else(|_| StageOutcome::failed(0, PipelineError::StagePanicked("writer")));

        let summary = RunSummary {
            submitted: produced.count,
            written: written.count,
            skipped: self.ctx.skips.count(),
            discarded: self.ctx.discarded(),
            peak_resident: stats.peak_resident(),
            elapsed: started.elapsed(),
        };
        report_summary(&summary, &self.ctx.skips, self.opts.verbose);
        self.summary = Some(summary.clone());

        let outcome = run_outcome(
            written.error,
            produced.error,
            worker_panicked,
            self.ctx.is_cancelled(),
        );
        match outcome {
            Ok(()) => {
                self.transition(PipelineState::Done);
                Ok(summary)
            }
            Err(e) => {
                self.transition(PipelineState::Failed);
                Err(e.into())
            }
        }
    }

    /// Run to completion over an already-open source and sink.
    pub fn run<I, W>(&mut self, urls: I, sink: W) -> Result<RunSummary>
    where
        I: Iterator<Item = io::Result<String>> + Send + 'static,
        W: OutputSink + Send + 'static,
    {
        let started = Instant::now();
        let handles = self.start(urls, sink);
        self.finish(handles, started)
    }

    /// Open `opts.input_path`, recreate `opts.output_path`, and run. Any open failure ends in
    /// [`PipelineState::Failed`] before a single thread is spawned.
    pub fn run_from_paths(&mut self) -> Result<RunSummary> {
        let urls = match open_url_source(&self.opts.input_path) {
            Ok(urls) => urls,
            Err(e) => return Err(self.fail_setup(e)),
        };
        let sink = match prepare_output_file(&self.opts.output_path) {
            Ok(f) => f,
            Err(e) => return Err(self.fail_setup(e)),
        };
        self.run(urls, sink)
    }
}

/// First fatal error wins: output, then input, then worker panics, then cancellation.
fn run_outcome(
    written: Option<PipelineError>,
    produced: Option<PipelineError>,
    worker_panicked: bool,
    cancelled: bool,
) -> std::result::Result<(), PipelineError> {
    if let Some(e) = written.or(produced) {
        return Err(e);
    }
    if worker_panicked {
        return Err(PipelineError::StagePanicked("worker"));
    }
    if cancelled {
        return Err(PipelineError::Cancelled);
    }
    Ok(())
}
