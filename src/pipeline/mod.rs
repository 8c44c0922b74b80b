//! Pipeline components: bounded queue, producer, worker pool, writer, coordinator.

pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod producer;
pub mod queue;
pub mod workers;
pub mod writer;

pub use context::{
    PipelineChannels, PipelineContext, PipelineHandles, PipelineTuning, StageOutcome,
    create_pipeline_channels,
};
pub use error_handler::{PipelineError, SkipLog, report_summary};
pub use orchestrator::{Pipeline, PipelineState};
pub use producer::{run_producer_loop, spawn_producer_thread};
pub use queue::{QueueConsumer, QueueProducer, QueueStats, ResidencyPermit, WorkQueue};
pub use workers::{process_image, spawn_workers, worker_loop};
pub use writer::{OnWritten, run_writer_loop, spawn_writer_thread};
