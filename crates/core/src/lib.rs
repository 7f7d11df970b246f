//! `jobpool-core`: bounded, cancellable batch job processing.
//!
//! A fixed batch of jobs is fanned out to a bounded set of tokio worker
//! tasks, and exactly one [`JobResult`] comes back per job. Results are
//! handed back in completion order ([`process`]) or submission order
//! ([`process_ordered`]). Per-job failures never abort the batch; only a
//! done [`Context`] does.

pub mod batch;
pub mod context;
pub mod error;
pub mod result;

mod collect;
mod dispatch;

pub use batch::{process, process_ordered, run_batch, ResultOrder};
pub use context::{Context, ContextError};
pub use dispatch::effective_concurrency;
pub use error::{BatchError, JobError};
pub use result::JobResult;
