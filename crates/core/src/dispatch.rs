//! Worker pool shared by both collection modes.
//!
//! [`dispatch`] spawns the worker tasks, publishes every job onto a
//! pre-sized intake channel and hands back the receiving end of the result
//! channel. How the results are reassembled is up to the collectors in
//! [`crate::collect`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::context::Context;
use crate::error::JobError;
use crate::result::JobResult;

/// Number of workers actually started for a batch of `job_count` jobs.
///
/// A request of `0`, or one larger than the batch, becomes one worker per
/// job. An empty batch gets no workers at all.
pub fn effective_concurrency(requested: usize, job_count: usize) -> usize {
    if requested == 0 || requested > job_count {
        job_count
    } else {
        requested
    }
}

/// A job tagged with its position in the submitted batch.
#[derive(Debug)]
pub(crate) struct IndexedJob<T> {
    pub index: usize,
    pub job: T,
}

/// What a worker publishes for every job it takes.
#[derive(Debug)]
pub(crate) struct Completed<T, R, E> {
    pub index: usize,
    pub job: T,
    pub outcome: Result<R, JobError<E>>,
}

impl<T, R, E> Completed<T, R, E> {
    pub fn into_result(self) -> JobResult<T, R, E> {
        JobResult {
            job: self.job,
            outcome: self.outcome,
        }
    }
}

/// Handles to a running pool.
pub(crate) struct Dispatch<T, R, E> {
    pub results: mpsc::Receiver<Completed<T, R, E>>,
    pub workers: Vec<JoinHandle<()>>,
}

type SharedIntake<T> = Arc<Mutex<mpsc::Receiver<IndexedJob<T>>>>;

/// Start `concurrency` workers over `jobs`.
///
/// `jobs` must be non-empty and `concurrency` already clamped with
/// [`effective_concurrency`].
pub(crate) fn dispatch<T, R, E, F, Fut>(
    ctx: &Context,
    jobs: &[T],
    worker: F,
    concurrency: usize,
) -> Dispatch<T, R, E>
where
    T: Clone + Send + Sync + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    debug_assert!(!jobs.is_empty(), "dispatch requires at least one job");
    debug_assert!((1..=jobs.len()).contains(&concurrency));

    let total = jobs.len();
    let (job_tx, job_rx) = mpsc::channel::<IndexedJob<T>>(total);
    let (result_tx, result_rx) = mpsc::channel::<Completed<T, R, E>>(total);
    let intake: SharedIntake<T> = Arc::new(Mutex::new(job_rx));
    let worker = Arc::new(worker);

    let workers = (0..concurrency)
        .map(|worker_id| {
            tokio::spawn(worker_loop(
                worker_id,
                ctx.clone(),
                Arc::clone(&intake),
                result_tx.clone(),
                Arc::clone(&worker),
            ))
        })
        .collect();
    drop(result_tx);
    drop(intake);

    for (index, job) in jobs.iter().enumerate() {
        let job = IndexedJob {
            index,
            job: job.clone(),
        };
        // The channel holds the whole batch, so the only possible failure is
        // that every worker has already stopped on a done context.
        if job_tx.try_send(job).is_err() {
            tracing::debug!(published = index, total, "Intake closed, remaining jobs dropped");
            break;
        }
    }
    drop(job_tx);

    Dispatch {
        results: result_rx,
        workers,
    }
}

async fn worker_loop<T, R, E, F, Fut>(
    worker_id: usize,
    ctx: Context,
    intake: SharedIntake<T>,
    results: mpsc::Sender<Completed<T, R, E>>,
    worker: Arc<F>,
) where
    T: Clone + Send + Sync + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    tracing::trace!(worker_id, "Worker started");
    let mut processed = 0usize;

    loop {
        if let Some(reason) = ctx.err() {
            tracing::debug!(worker_id, %reason, "Context done, worker stopping");
            break;
        }

        let next = intake.lock().await.recv().await;
        let Some(IndexedJob { index, job }) = next else {
            break;
        };

        let outcome = run_job(worker.as_ref(), ctx.clone(), job.clone()).await;
        if let Err(JobError::Panicked(message)) = &outcome {
            tracing::warn!(worker_id, index, panic = %message, "Worker function panicked");
        }
        processed += 1;

        if results.send(Completed { index, job, outcome }).await.is_err() {
            // The collector has already given up on this batch.
            break;
        }
    }

    tracing::trace!(worker_id, processed, "Worker exited");
}

/// Invoke the worker function once, turning a panic into a per-job error.
async fn run_job<T, R, E, F, Fut>(worker: &F, ctx: Context, job: T) -> Result<R, JobError<E>>
where
    F: Fn(Context, T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    match AssertUnwindSafe(async move { worker(ctx, job).await })
        .catch_unwind()
        .await
    {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(JobError::Failed(err)),
        Err(payload) => Err(JobError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
