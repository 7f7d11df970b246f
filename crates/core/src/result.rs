//! Per-job outcome returned by the processor.

use crate::error::JobError;

/// One entry per submitted job: the job itself plus what the worker made
/// of it.
#[derive(Debug, Clone)]
pub struct JobResult<T, R, E> {
    pub job: T,
    pub outcome: Result<R, JobError<E>>,
}

impl<T, R, E> JobResult<T, R, E> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The worker's value, if the job succeeded.
    pub fn value(&self) -> Option<&R> {
        self.outcome.as_ref().ok()
    }

    /// The per-job error, if the job failed or panicked.
    pub fn error(&self) -> Option<&JobError<E>> {
        self.outcome.as_ref().err()
    }

    pub fn into_parts(self) -> (T, Result<R, JobError<E>>) {
        (self.job, self.outcome)
    }
}
