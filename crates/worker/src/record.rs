//! Record requests accepted by the bulk importer and the records created
//! from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use jobpool_core::{Context, ContextError};

/// Maximum length of a record description.
const MAX_DESCRIPTION_LEN: usize = 500;

/// One record submitted for creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    pub category_id: String,
    pub amount: f64,
    pub description: String,
    pub date: DateTime<Utc>,
}

/// A record after successful creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRecord {
    pub id: Uuid,
    pub category_id: String,
    pub amount: f64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Record not created: {0}")]
    Interrupted(#[from] ContextError),
}

impl RecordRequest {
    /// Rules:
    /// - `category_id` must not be blank.
    /// - `amount` must be a finite number greater than zero.
    /// - `description` must not be blank nor exceed `MAX_DESCRIPTION_LEN`.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.category_id.trim().is_empty() {
            return Err(RecordError::Validation(
                "categoryId must not be empty".to_string(),
            ));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(RecordError::Validation(format!(
                "amount must be greater than zero, got {}",
                self.amount
            )));
        }
        if self.description.trim().is_empty() {
            return Err(RecordError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        if self.description.len() > MAX_DESCRIPTION_LEN {
            return Err(RecordError::Validation(format!(
                "description must not exceed {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Validate and create a single record.
///
/// Used as the per-job worker function of a bulk import. Refuses to create
/// anything once the batch context is done.
pub async fn create_record(ctx: Context, request: RecordRequest) -> Result<CreatedRecord, RecordError> {
    if let Some(reason) = ctx.err() {
        return Err(reason.into());
    }
    request.validate()?;

    let record = CreatedRecord {
        id: Uuid::now_v7(),
        category_id: request.category_id,
        amount: request.amount,
        description: request.description,
        date: request.date,
        created_at: Utc::now(),
    };
    tracing::debug!(record_id = %record.id, category_id = %record.category_id, "Record created");
    Ok(record)
}
