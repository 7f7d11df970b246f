//! Result collectors: arrival order and submission order.
//!
//! Both read exactly `total` results off the pool's result channel, or stop
//! as soon as the context is done.

use tokio::sync::mpsc;

use crate::context::Context;
use crate::dispatch::Completed;
use crate::error::BatchError;
use crate::result::JobResult;

/// Collect results in the order workers finish them.
pub(crate) async fn collect_unordered<T, R, E>(
    ctx: &Context,
    results: &mut mpsc::Receiver<Completed<T, R, E>>,
    total: usize,
) -> Result<Vec<JobResult<T, R, E>>, BatchError> {
    let mut collected = Vec::with_capacity(total);
    while collected.len() < total {
        let completed = next_completed(ctx, results, collected.len(), total).await?;
        collected.push(completed.into_result());
    }
    Ok(collected)
}

/// Collect results back into submission order.
///
/// Each result is written straight into its pre-allocated slot, so no
/// sorting pass is needed once the batch is complete.
pub(crate) async fn collect_ordered<T, R, E>(
    ctx: &Context,
    results: &mut mpsc::Receiver<Completed<T, R, E>>,
    total: usize,
) -> Result<Vec<JobResult<T, R, E>>, BatchError> {
    let mut slots: Vec<Option<JobResult<T, R, E>>> =
        std::iter::repeat_with(|| None).take(total).collect();
    let mut collected = 0;

    while collected < total {
        let completed = next_completed(ctx, results, collected, total).await?;
        let index = completed.index;
        slots[index] = Some(completed.into_result());
        collected += 1;
    }

    // Every index is published exactly once, so all slots are filled here.
    slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or(BatchError::WorkersExited { collected, total })
}

/// Wait for the next result, or for the context to finish first.
async fn next_completed<T, R, E>(
    ctx: &Context,
    results: &mut mpsc::Receiver<Completed<T, R, E>>,
    collected: usize,
    total: usize,
) -> Result<Completed<T, R, E>, BatchError> {
    tokio::select! {
        biased;
        reason = ctx.done() => Err(BatchError::Aborted {
            source: reason,
            collected,
            total,
        }),
        received = results.recv() => match received {
            Some(completed) => Ok(completed),
            // Workers only stop early on a done context; anything else means
            // they died without reporting.
            None => Err(match ctx.err() {
                Some(reason) => BatchError::Aborted {
                    source: reason,
                    collected,
                    total,
                },
                None => BatchError::WorkersExited { collected, total },
            }),
        },
    }
}
