//! In-memory store implementations.
//!
//! These back integration tests and single-process development runs with
//! the same contracts as the Postgres stores, minus durability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::traits::{CommunicationStore, PractitionerDirectory, RecordStore};
use crate::models::{
    ClinicalRecord, Communication, CommunicationDirection, CommunicationStatus, NewClinicalRecord,
    NewCommunication, Practitioner,
};

/// Wall-clock timestamps can collide inside one test run; an insertion
/// sequence breaks ties so newest-first ordering stays deterministic.
#[derive(Default)]
pub struct InMemoryRecordStore {
    seq: AtomicU64,
    records: Mutex<HashMap<Uuid, (u64, ClinicalRecord)>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_by_id(&self, id: Uuid) -> crate::Result<Option<ClinicalRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(&id).map(|(_, record)| record.clone()))
    }

    async fn find_by_owner(&self, owner: Uuid) -> crate::Result<Vec<ClinicalRecord>> {
        let records = self.records.lock().unwrap();
        let mut owned: Vec<(u64, ClinicalRecord)> = records
            .values()
            .filter(|(_, record)| record.created_by == owner)
            .cloned()
            .collect();
        owned.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        Ok(owned.into_iter().map(|(_, record)| record).collect())
    }

    async fn create(&self, new: NewClinicalRecord) -> crate::Result<ClinicalRecord> {
        let record = ClinicalRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            created_by: new.created_by,
            subject_email: new.subject_email,
            content: new.content,
        };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let mut records = self.records.lock().unwrap();
        records.insert(record.id, (seq, record.clone()));
        Ok(record)
    }
}

#[derive(Default)]
pub struct InMemoryCommunicationStore {
    seq: AtomicU64,
    communications: Mutex<HashMap<Uuid, (u64, Communication)>>,
}

impl InMemoryCommunicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommunicationStore for InMemoryCommunicationStore {
    async fn find_by_id(&self, id: Uuid) -> crate::Result<Option<Communication>> {
        let communications = self.communications.lock().unwrap();
        Ok(communications
            .get(&id)
            .map(|(_, communication)| communication.clone()))
    }

    async fn create(&self, new: NewCommunication) -> crate::Result<Communication> {
        let communication = Communication {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            direction: new.direction,
            status: new.status,
            counterparty: new.counterparty,
            actor: new.actor,
            payload: new.payload,
            record: None,
        };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let mut communications = self.communications.lock().unwrap();
        communications.insert(communication.id, (seq, communication.clone()));
        Ok(communication)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: CommunicationStatus,
        to: CommunicationStatus,
        record: Option<Uuid>,
    ) -> crate::Result<Option<Communication>> {
        let mut communications = self.communications.lock().unwrap();
        match communications.get_mut(&id) {
            Some((_, communication)) if communication.status == from => {
                communication.status = to;
                if record.is_some() {
                    communication.record = record;
                }
                Ok(Some(communication.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_for_actor(
        &self,
        actor: Uuid,
        direction: CommunicationDirection,
        limit: i64,
        offset: i64,
    ) -> crate::Result<(Vec<Communication>, i64)> {
        let communications = self.communications.lock().unwrap();
        let mut matching: Vec<(u64, Communication)> = communications
            .values()
            .filter(|(_, c)| c.actor == actor && c.direction == direction)
            .cloned()
            .collect();
        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .map(|(_, communication)| communication)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((items, total))
    }
}

#[derive(Default)]
pub struct InMemoryPractitionerDirectory {
    practitioners: Mutex<HashMap<Uuid, Practitioner>>,
}

impl InMemoryPractitionerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one practitioner (tests and development runs).
    pub fn insert(&self, practitioner: Practitioner) {
        let mut practitioners = self.practitioners.lock().unwrap();
        practitioners.insert(practitioner.id, practitioner);
    }
}

#[async_trait]
impl PractitionerDirectory for InMemoryPractitionerDirectory {
    async fn find_by_id(&self, id: Uuid) -> crate::Result<Option<Practitioner>> {
        let practitioners = self.practitioners.lock().unwrap();
        Ok(practitioners.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> crate::Result<Option<Practitioner>> {
        let practitioners = self.practitioners.lock().unwrap();
        Ok(practitioners
            .values()
            .find(|p| p.email == email)
            .cloned())
    }
}
