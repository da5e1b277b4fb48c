//! Store contracts.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    ClinicalRecord, Communication, CommunicationDirection, CommunicationStatus, NewClinicalRecord,
    NewCommunication, Practitioner,
};

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> crate::Result<Option<ClinicalRecord>>;

    /// Records authored or ingested by one practitioner, newest first.
    async fn find_by_owner(&self, owner: Uuid) -> crate::Result<Vec<ClinicalRecord>>;

    async fn create(&self, new: NewClinicalRecord) -> crate::Result<ClinicalRecord>;
}

#[async_trait]
pub trait CommunicationStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> crate::Result<Option<Communication>>;

    async fn create(&self, new: NewCommunication) -> crate::Result<Communication>;

    /// Moves one communication from `from` to `to`, linking `record` when
    /// given. Check and set are one guarded write, so two contenders can
    /// never both succeed; `Ok(None)` means the row was no longer in
    /// `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: CommunicationStatus,
        to: CommunicationStatus,
        record: Option<Uuid>,
    ) -> crate::Result<Option<Communication>>;

    /// One page of an actor's communications in one direction, newest
    /// first, plus the total count for that filter.
    async fn list_for_actor(
        &self,
        actor: Uuid,
        direction: CommunicationDirection,
        limit: i64,
        offset: i64,
    ) -> crate::Result<(Vec<Communication>, i64)>;
}

#[async_trait]
pub trait PractitionerDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> crate::Result<Option<Practitioner>>;

    async fn find_by_email(&self, email: &str) -> crate::Result<Option<Practitioner>>;
}
