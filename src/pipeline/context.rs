//! Pipeline context: shared state passed into the producer, worker, and writer threads.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crate::Opts;
use crate::types::ResultLine;

use super::error_handler::{PipelineError, SkipLog};
use super::queue::{QueueConsumer, QueueProducer, QueueStats, WorkQueue};

/// Sizing for one run, resolved from [`Opts`].
#[derive(Clone, Debug)]
pub struct PipelineTuning {
    pub num_workers: usize,
    pub queue_capacity: usize,
    pub result_channel_cap: usize,
}

impl From<&Opts> for PipelineTuning {
    fn from(opts: &Opts) -> Self {
        Self {
            num_workers: opts.effective_workers(),
            queue_capacity: opts.effective_queue_capacity(),
            result_channel_cap: opts.effective_result_capacity(),
        }
    }
}

/// State shared by every stage. The cancel flag is the single coordinated shutdown signal.
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub cancel: Arc<AtomicBool>,
    pub skips: Arc<SkipLog>,
    /// Jobs dropped unprocessed after cancellation.
    pub discarded: Arc<AtomicUsize>,
}

impl PipelineContext {
    pub fn new(cancel: Arc<AtomicBool>) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn discard(&self, n: usize) {
        self.discarded.fetch_add(n, Ordering::Relaxed);
    }

    pub fn discarded(&self) -> usize {
        self.discarded.load(Ordering::Relaxed)
    }
}

/// Both hand-off channels for one run. Producer gets `producer`; workers get `consumer` and
/// `result_tx`; the writer gets `result_rx`.
pub struct PipelineChannels {
    pub producer: QueueProducer,
    pub consumer: QueueConsumer,
    pub result_tx: Sender<ResultLine>,
    pub result_rx: Receiver<ResultLine>,
    pub stats: QueueStats,
}

pub fn create_pipeline_channels(tuning: &PipelineTuning) -> PipelineChannels {
    let (producer, consumer) = WorkQueue::new(tuning.queue_capacity).split();
    let (result_tx, result_rx) = bounded::<ResultLine>(tuning.result_channel_cap);
    let stats = producer.stats().clone();
    PipelineChannels {
        producer,
        consumer,
        result_tx,
        result_rx,
        stats,
    }
}

/// What the producer or writer thread hands back: its count, and the error that stopped it
/// early if any. The count is kept on failure so the run summary still adds up.
#[derive(Debug, Default)]
pub struct StageOutcome {
    pub count: usize,
    pub error: Option<PipelineError>,
}

impl StageOutcome {
    pub fn done(count: usize) -> Self {
        Self { count, error: None }
    }

    pub fn failed(count: usize, error: PipelineError) -> Self {
        Self {
            count,
            error: Some(error),
        }
    }
}

/// Join handles for a running pipeline. Producer counts URLs submitted; writer counts lines
/// written.
pub struct PipelineHandles {
    pub producer_handle: JoinHandle<StageOutcome>,
    pub worker_handles: Vec<JoinHandle<()>>,
    pub writer_handle: JoinHandle<StageOutcome>,
    pub stats: QueueStats,
}
