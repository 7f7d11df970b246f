use std::fmt;

use crate::context::ContextError;

/// Error recorded for a single job. Never aborts the batch.
#[derive(Debug, Clone)]
pub enum JobError<E> {
    /// The worker function returned an error.
    Failed(E),
    /// The worker function panicked; carries the panic message.
    Panicked(String),
}

impl<E> JobError<E> {
    /// The worker's own error, if it returned one rather than panicking.
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Failed(err) => Some(err),
            Self::Panicked(_) => None,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

impl<E: fmt::Display> fmt::Display for JobError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(err) => write!(f, "{err}"),
            Self::Panicked(message) => write!(f, "Worker panicked: {message}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for JobError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Failed(err) => Some(err),
            Self::Panicked(_) => None,
        }
    }
}

/// Batch-fatal error. When returned, no results are handed back and the
/// jobs that were not collected are abandoned.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The shared context was cancelled or hit its deadline before every
    /// job was accounted for.
    #[error("Batch aborted after {collected} of {total} results: {source}")]
    Aborted {
        #[source]
        source: ContextError,
        collected: usize,
        total: usize,
    },

    /// Every worker stopped while results were still outstanding.
    #[error("Workers exited after {collected} of {total} results")]
    WorkersExited { collected: usize, total: usize },
}

impl BatchError {
    /// The context error behind an aborted batch.
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            Self::Aborted { source, .. } => Some(*source),
            Self::WorkersExited { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.context_error() == Some(ContextError::Cancelled)
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        self.context_error() == Some(ContextError::DeadlineExceeded)
    }
}
