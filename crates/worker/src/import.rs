//! Bulk record import on top of the batch processor.
//!
//! Records are validated and created concurrently, then folded into a
//! [`BulkSummary`]. A failing record never stops the others; only the batch
//! context (deadline or shutdown) does.

use jobpool_core::{process_ordered, BatchError, Context};

use crate::record::{create_record, RecordRequest};
use crate::summary::BulkSummary;

/// Maximum number of records accepted in a single import.
pub const MAX_BULK_RECORDS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("At most {max} records can be imported at once, got {0}", max = MAX_BULK_RECORDS)]
    TooManyRecords(usize),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Parse a JSON array of record requests.
pub fn parse_requests(input: &str) -> Result<Vec<RecordRequest>, ImportError> {
    Ok(serde_json::from_str(input)?)
}

/// Create every record in `requests` using up to `concurrency` workers.
pub async fn bulk_import(
    ctx: &Context,
    requests: &[RecordRequest],
    concurrency: usize,
) -> Result<BulkSummary, ImportError> {
    if requests.len() > MAX_BULK_RECORDS {
        return Err(ImportError::TooManyRecords(requests.len()));
    }

    let results = process_ordered(ctx, requests, create_record, concurrency).await?;
    let summary = BulkSummary::from_results(results);

    tracing::info!(
        total = summary.total,
        success = summary.success,
        failed = summary.failed,
        "Bulk import finished",
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn request(amount: f64) -> RecordRequest {
        RecordRequest {
            category_id: "office".to_string(),
            amount,
            description: format!("Item costing {amount}"),
            date: Utc::now(),
        }
    }

    #[test]
    fn parse_rejects_malformed_json() {
        assert_matches!(parse_requests("[{"), Err(ImportError::Json(_)));
    }

    #[test]
    fn parse_accepts_empty_array() {
        assert!(parse_requests("[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn over_limit_batch_rejected_before_processing() {
        let requests: Vec<RecordRequest> = (0..=MAX_BULK_RECORDS).map(|_| request(1.0)).collect();
        let err = bulk_import(&Context::new(), &requests, 4).await.unwrap_err();
        assert_matches!(err, ImportError::TooManyRecords(n) if n == MAX_BULK_RECORDS + 1);
    }

    #[tokio::test]
    async fn invalid_records_reported_in_summary() {
        let requests = vec![request(5.0), request(0.0), request(7.5), request(-1.0)];
        let summary = bulk_import(&Context::new(), &requests, 2).await.unwrap();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.success, 2);
        assert_eq!(summary.failed, 2);
        assert!(summary.errors[0].starts_with("record 1:"));
        assert!(summary.errors[1].starts_with("record 3:"));

        let amounts: Vec<f64> = summary.created.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![5.0, 7.5]);
    }

    #[tokio::test]
    async fn cancelled_import_is_a_batch_error() {
        let ctx = Context::new();
        ctx.cancel();
        let err = bulk_import(&ctx, &[request(1.0)], 1).await.unwrap_err();
        assert_matches!(err, ImportError::Batch(e) if e.is_cancelled());
    }
}
