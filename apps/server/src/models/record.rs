//! Clinical record model.

use chrono::{DateTime, Utc};
use kurier_bundle::RecordContent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A locally held clinical record: one patient's resource graph plus
/// ownership and contact metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Practitioner who authored or ingested the record.
    pub created_by: Uuid,
    /// Denormalized contact for the record subject.
    pub subject_email: String,
    #[serde(flatten)]
    pub content: RecordContent,
}

/// Fields for creating a record; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewClinicalRecord {
    pub created_by: Uuid,
    pub subject_email: String,
    pub content: RecordContent,
}
