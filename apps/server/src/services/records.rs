//! Record authoring and listing.

use std::sync::Arc;

use uuid::Uuid;

use kurier_bundle::RecordContent;

use crate::db::{PractitionerDirectory, RecordStore};
use crate::models::{ClinicalRecord, NewClinicalRecord};

pub struct RecordService {
    records: Arc<dyn RecordStore>,
    practitioners: Arc<dyn PractitionerDirectory>,
}

impl RecordService {
    pub fn new(records: Arc<dyn RecordStore>, practitioners: Arc<dyn PractitionerDirectory>) -> Self {
        Self {
            records,
            practitioners,
        }
    }

    /// Creates a record authored by the acting clinician.
    pub async fn create(
        &self,
        actor_id: Uuid,
        subject_email: String,
        content: RecordContent,
    ) -> crate::Result<ClinicalRecord> {
        let actor = self
            .practitioners
            .find_by_id(actor_id)
            .await?
            .ok_or(crate::Error::ActorNotFound { id: actor_id })?;

        if !content.patient.is_object() {
            return Err(crate::Error::InvalidRecord(
                "a record must carry a patient resource".to_string(),
            ));
        }

        let record = self
            .records
            .create(NewClinicalRecord {
                created_by: actor.id,
                subject_email,
                content,
            })
            .await?;
        tracing::info!(record_id = %record.id, owner = %actor.id, "record created");
        Ok(record)
    }

    /// The acting clinician's records, newest first.
    pub async fn list_own(&self, actor_id: Uuid) -> crate::Result<Vec<ClinicalRecord>> {
        self.records.find_by_owner(actor_id).await
    }
}
