//! Bounded work queue between the producer and the worker pool.
//!
//! Two crossbeam channels back it: a job channel of capacity C, and a token channel pre-filled
//! with C residency tokens. The producer takes a token before fetching; the token rides inside the
//! [`DecodedImage`] and goes back when the image is dropped. At most C decoded images therefore
//! exist at any moment, wherever they are (producer, queue, or a worker).

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::types::DecodedImage;

/// Resident image counters shared by every permit.
#[derive(Debug, Default)]
struct Residency {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Residency {
    fn acquire(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn release(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One slot of resident-image budget. Returned to the queue on drop.
#[derive(Debug)]
pub struct ResidencyPermit {
    token_tx: Sender<()>,
    residency: Arc<Residency>,
}

impl Drop for ResidencyPermit {
    fn drop(&mut self) {
        self.residency.release();
        // Capacity equals the number of tokens, so this never blocks.
        let _ = self.token_tx.send(());
    }
}

/// Fixed-capacity FIFO of decoded images. Split it with [`WorkQueue::split`].
pub struct WorkQueue {
    capacity: usize,
    job_tx: Sender<DecodedImage>,
    job_rx: Receiver<DecodedImage>,
    token_tx: Sender<()>,
    token_rx: Receiver<()>,
    residency: Arc<Residency>,
}

impl WorkQueue {
    /// Queue holding at most `capacity` decoded images (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (job_tx, job_rx) = bounded::<DecodedImage>(capacity);
        let (token_tx, token_rx) = bounded::<()>(capacity);
        for _ in 0..capacity {
            // Fresh channel with room for exactly `capacity` tokens.
            let _ = token_tx.send(());
        }
        Self {
            capacity,
            job_tx,
            job_rx,
            token_tx,
            token_rx,
            residency: Arc::new(Residency::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Split into the single producer end and a cloneable consumer end.
    pub fn split(self) -> (QueueProducer, QueueConsumer) {
        let stats = QueueStats {
            residency: Arc::clone(&self.residency),
        };
        (
            QueueProducer {
                job_tx: self.job_tx,
                token_tx: self.token_tx,
                token_rx: self.token_rx,
                residency: self.residency,
                stats,
            },
            QueueConsumer {
                job_rx: self.job_rx,
            },
        )
    }
}

/// Read-only view of residency counters.
#[derive(Clone, Debug)]
pub struct QueueStats {
    residency: Arc<Residency>,
}

impl QueueStats {
    /// Decoded images alive right now.
    pub fn resident(&self) -> usize {
        self.residency.current.load(Ordering::SeqCst)
    }

    /// Highest value [`QueueStats::resident`] has reached.
    pub fn peak_resident(&self) -> usize {
        self.residency.peak.load(Ordering::SeqCst)
    }
}

/// Producer end. There is exactly one; [`QueueProducer::close`] consumes it, so closing twice or
/// pushing after close cannot be written.
pub struct QueueProducer {
    job_tx: Sender<DecodedImage>,
    token_tx: Sender<()>,
    token_rx: Receiver<()>,
    residency: Arc<Residency>,
    stats: QueueStats,
}

impl QueueProducer {
    fn permit(&self) -> ResidencyPermit {
        self.residency.acquire();
        ResidencyPermit {
            token_tx: self.token_tx.clone(),
            residency: Arc::clone(&self.residency),
        }
    }

    /// Block until a residency slot is free. This is where backpressure suspends the producer.
    pub fn reserve(&self) -> ResidencyPermit {
        // We hold token_tx ourselves, so the token channel never disconnects.
        let _ = self.token_rx.recv();
        self.permit()
    }

    /// Non-blocking [`QueueProducer::reserve`]; `None` when all slots are taken.
    pub fn try_reserve(&self) -> Option<ResidencyPermit> {
        match self.token_rx.try_recv() {
            Ok(()) => Some(self.permit()),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Enqueue an image, attaching `permit` to it. Blocks while the queue is full.
    /// Returns the image back when every consumer is gone.
    pub fn push(
        &self,
        mut image: DecodedImage,
        permit: ResidencyPermit,
    ) -> Result<(), DecodedImage> {
        image.attach_permit(permit);
        self.job_tx.send(image).map_err(|e| e.into_inner())
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// No more items will be pushed. Consumers drain what is left, then see end-of-stream.
    pub fn close(self) {
        drop(self.job_tx);
    }
}

/// Consumer end; clone one per worker.
#[derive(Clone)]
pub struct QueueConsumer {
    job_rx: Receiver<DecodedImage>,
}

impl QueueConsumer {
    /// Next image in FIFO order. `None` once the producer has closed and the queue is drained.
    pub fn pop(&self) -> Option<DecodedImage> {
        self.job_rx.recv().ok()
    }
}
