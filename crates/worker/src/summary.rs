//! Partial-success reporting for a bulk import.

use serde::Serialize;

use jobpool_core::JobResult;

use crate::record::{CreatedRecord, RecordError, RecordRequest};

/// Outcome of a bulk import, in submission order.
#[derive(Debug, Clone, Serialize)]
pub struct BulkSummary {
    pub created: Vec<CreatedRecord>,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// One message per failed record, prefixed with its position.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl BulkSummary {
    pub fn from_results(results: Vec<JobResult<RecordRequest, CreatedRecord, RecordError>>) -> Self {
        let total = results.len();
        let mut created = Vec::with_capacity(total);
        let mut errors = Vec::new();

        for (index, result) in results.into_iter().enumerate() {
            match result.outcome {
                Ok(record) => created.push(record),
                Err(e) => errors.push(format!("record {index}: {e}")),
            }
        }

        Self {
            total,
            success: created.len(),
            failed: errors.len(),
            created,
            errors,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use jobpool_core::JobError;
    use uuid::Uuid;

    use super::*;

    fn request(description: &str) -> RecordRequest {
        RecordRequest {
            category_id: "c".to_string(),
            amount: 1.0,
            description: description.to_string(),
            date: Utc::now(),
        }
    }

    fn created(req: &RecordRequest) -> CreatedRecord {
        CreatedRecord {
            id: Uuid::now_v7(),
            category_id: req.category_id.clone(),
            amount: req.amount,
            description: req.description.clone(),
            date: req.date,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn counts_success_and_failures() {
        let ok = request("ok");
        let bad = request("bad");
        let results = vec![
            JobResult {
                outcome: Ok(created(&ok)),
                job: ok,
            },
            JobResult {
                job: bad,
                outcome: Err(JobError::Failed(RecordError::Validation(
                    "amount must be greater than zero, got 0".into(),
                ))),
            },
        ];

        let summary = BulkSummary::from_results(results);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.success, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_succeeded());
        assert_eq!(
            summary.errors,
            vec!["record 1: Validation failed: amount must be greater than zero, got 0"]
        );
    }

    #[test]
    fn errors_omitted_from_json_when_empty() {
        let ok = request("ok");
        let summary = BulkSummary::from_results(vec![JobResult {
            outcome: Ok(created(&ok)),
            job: ok,
        }]);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["success"], 1);
        assert_eq!(json["failed"], 0);
        assert!(json.get("errors").is_none());
        assert_eq!(json["created"][0]["description"], "ok");
    }
}
