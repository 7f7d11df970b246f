//! Public entry points: [`process`] and [`process_ordered`].
//!
//! Both run the same worker pool and only differ in how results are
//! reassembled. Per-job errors (including worker panics) are recorded in
//! each [`JobResult`]; only a done [`Context`] aborts the batch.
//!
//! # Cancellation
//!
//! Cancelling the context stops workers from taking new jobs and makes the
//! call return [`BatchError::Aborted`] straight away. Worker functions that
//! are already running are not interrupted. A long-running worker function
//! should watch the [`Context`] it is given (e.g. `select!` on
//! [`Context::done`]) if it needs to stop early.

use std::fmt;
use std::future::Future;

use tokio::task::JoinHandle;

use crate::collect::{collect_ordered, collect_unordered};
use crate::context::Context;
use crate::dispatch::{dispatch, effective_concurrency, Dispatch};
use crate::error::BatchError;
use crate::result::JobResult;

/// How results are handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOrder {
    /// Completion order.
    Unordered,
    /// Submission order: `results[i].job == jobs[i]`.
    Ordered,
}

impl fmt::Display for ResultOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unordered => write!(f, "unordered"),
            Self::Ordered => write!(f, "ordered"),
        }
    }
}

/// Run `worker` over every job with at most `concurrency` workers and
/// return the results in completion order.
///
/// A `concurrency` of `0`, or one larger than `jobs.len()`, starts one
/// worker per job. An empty batch returns immediately without calling
/// `worker`.
///
/// ```no_run
/// use jobpool_core::{process, Context};
///
/// # async fn demo() -> Result<(), jobpool_core::BatchError> {
/// let results = process(
///     &Context::new(),
///     &[1_u64, 2, 3],
///     |_ctx, n| async move { Ok::<_, std::convert::Infallible>(n * n) },
///     2,
/// )
/// .await?;
/// assert_eq!(results.len(), 3);
/// # Ok(())
/// # }
/// ```
pub async fn process<T, R, E, F, Fut>(
    ctx: &Context,
    jobs: &[T],
    worker: F,
    concurrency: usize,
) -> Result<Vec<JobResult<T, R, E>>, BatchError>
where
    T: Clone + Send + Sync + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    run_batch(ctx, jobs, worker, concurrency, ResultOrder::Unordered).await
}

/// Like [`process`], but `results[i]` always belongs to `jobs[i]`.
pub async fn process_ordered<T, R, E, F, Fut>(
    ctx: &Context,
    jobs: &[T],
    worker: F,
    concurrency: usize,
) -> Result<Vec<JobResult<T, R, E>>, BatchError>
where
    T: Clone + Send + Sync + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    run_batch(ctx, jobs, worker, concurrency, ResultOrder::Ordered).await
}

/// Run a batch with an explicit [`ResultOrder`].
pub async fn run_batch<T, R, E, F, Fut>(
    ctx: &Context,
    jobs: &[T],
    worker: F,
    concurrency: usize,
    ordering: ResultOrder,
) -> Result<Vec<JobResult<T, R, E>>, BatchError>
where
    T: Clone + Send + Sync + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    let total = jobs.len();
    let workers = effective_concurrency(concurrency, total);
    tracing::debug!(
        total,
        workers,
        requested = concurrency,
        %ordering,
        "Starting batch",
    );

    let Dispatch {
        mut results,
        workers: handles,
    } = dispatch(ctx, jobs, worker, workers);

    let collected = match ordering {
        ResultOrder::Unordered => collect_unordered(ctx, &mut results, total).await,
        ResultOrder::Ordered => collect_ordered(ctx, &mut results, total).await,
    };

    match collected {
        Ok(results) => {
            join_workers(handles).await;
            let failed = results.iter().filter(|r| !r.is_ok()).count();
            tracing::debug!(total, failed, "Batch complete");
            Ok(results)
        }
        Err(e) => {
            // Workers are detached, not aborted: whatever is in flight runs
            // to completion and its result is dropped with the channel.
            tracing::warn!(error = %e, "Batch aborted");
            Err(e)
        }
    }
}

async fn join_workers(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Worker task failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn square(_ctx: Context, n: u32) -> impl Future<Output = Result<u32, Infallible>> {
        async move { Ok(n * n) }
    }

    #[test]
    fn ordering_display() {
        assert_eq!(ResultOrder::Unordered.to_string(), "unordered");
        assert_eq!(ResultOrder::Ordered.to_string(), "ordered");
    }

    #[tokio::test]
    async fn empty_batch_never_calls_worker() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let results = process(
            &Context::new(),
            &[] as &[u32],
            move |_ctx, n: u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<u32, Infallible>(n) }
            },
            4,
        )
        .await
        .unwrap();

        assert!(results.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_batch_ignores_cancelled_context() {
        let ctx = Context::new();
        ctx.cancel();
        let results = process_ordered(&ctx, &[] as &[u32], square, 0).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn ordered_squares_match_input_positions() {
        let jobs = [1_u32, 2, 3, 4, 5];
        let results = process_ordered(&Context::new(), &jobs, square, 2).await.unwrap();

        let pairs: Vec<(u32, u32)> = results
            .iter()
            .map(|r| (r.job, *r.value().expect("square never fails")))
            .collect();
        assert_eq!(pairs, vec![(1, 1), (2, 4), (3, 9), (4, 16), (5, 25)]);
    }

    #[tokio::test]
    async fn run_batch_with_explicit_ordering() {
        let jobs = [3_u32, 1, 2];
        let results = run_batch(&Context::new(), &jobs, square, 1, ResultOrder::Unordered)
            .await
            .unwrap();
        // A single worker drains intake in submission order.
        let order: Vec<u32> = results.iter().map(|r| r.job).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }
}
