use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::{Semaphore, mpsc, oneshot};
use tracing::debug;

use crate::error::StoreError;

/// A boxed, `Send`-able unit of work.
type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// FIFO unit-of-work runner with a fixed concurrency ceiling.
///
/// Jobs are started in submission order. At most `width` jobs run at any
/// moment: a single dispatcher task drains the queue and waits for a free
/// slot before starting the next job, so `width == 1` gives total
/// serialization and `width == n` allows up to `n` jobs to overlap.
///
/// Once submitted, a job runs to completion — there is no cancellation.
/// Dropping the queue stops accepting new work; already-queued jobs still
/// run.
///
/// Must be created inside a tokio runtime (the dispatcher is a spawned
/// task).
pub struct WorkQueue {
    tx: mpsc::UnboundedSender<Job>,
    width: usize,
}

impl WorkQueue {
    /// Create a queue running at most `width` jobs concurrently.
    ///
    /// A `width` of 0 is treated as 1.
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let permits = Arc::new(Semaphore::new(width));

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                // Hold the next start until a slot frees up. Starts keep
                // submission order because only this task dequeues.
                let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                    break;
                };
                tokio::spawn(async move {
                    job.await;
                    drop(permit);
                });
            }
            debug!("work queue dispatcher stopped");
        });

        Self { tx, width }
    }

    /// The queue's concurrency ceiling.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Submit a unit of work, returning an awaitable for its result.
    ///
    /// The returned [`Completion`] resolves once the job has run, or to
    /// `Err(StoreError::QueueShutdown)` if the dispatcher went away before
    /// the job could run.
    pub fn submit<F, T>(&self, work: F) -> Completion<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (done, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            // The submitter may have dropped its Completion; that is fine.
            let _ = done.send(work.await);
        });
        let _ = self.tx.send(job);
        Completion { rx }
    }

    /// Submit a unit of work without waiting for it.
    ///
    /// Used for notification delivery: the submitter only cares that the
    /// job has been handed off, not when it finishes.
    pub fn spawn<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let _ = self.tx.send(Box::pin(work));
    }
}

/// Awaitable handle for a submitted job's result.
pub struct Completion<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for Completion<T> {
    type Output = Result<T, StoreError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| StoreError::QueueShutdown))
    }
}
