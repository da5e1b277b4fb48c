//! Postgres store implementations.
//!
//! Queries are runtime-checked (`sqlx::query` + `bind`), so the crate
//! builds without a live database. Status and direction are stored as
//! text, record content and payloads as JSONB.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::traits::{CommunicationStore, PractitionerDirectory, RecordStore};
use crate::models::{
    ClinicalRecord, Communication, CommunicationDirection, CommunicationStatus, NewClinicalRecord,
    NewCommunication, Practitioner,
};
use kurier_bundle::RecordContent;

const RECORD_COLUMNS: &str = "id, created_at, created_by, subject_email, content";
const COMMUNICATION_COLUMNS: &str =
    "id, created_at, direction, status, counterparty, actor, payload, record_id";

pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &PgRow) -> crate::Result<ClinicalRecord> {
    let content: serde_json::Value = row.get("content");
    let content: RecordContent = serde_json::from_value(content)
        .map_err(|e| crate::Error::Internal(format!("stored record content is malformed: {e}")))?;
    Ok(ClinicalRecord {
        id: row.get("id"),
        created_at: row.get("created_at"),
        created_by: row.get("created_by"),
        subject_email: row.get("subject_email"),
        content,
    })
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn find_by_id(&self, id: Uuid) -> crate::Result<Option<ClinicalRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::Error::Database)?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn find_by_owner(&self, owner: Uuid) -> crate::Result<Vec<ClinicalRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE created_by = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::Error::Database)?;
        rows.iter().map(row_to_record).collect()
    }

    async fn create(&self, new: NewClinicalRecord) -> crate::Result<ClinicalRecord> {
        let content = serde_json::to_value(&new.content)
            .map_err(|e| crate::Error::Internal(format!("record content not serializable: {e}")))?;
        let row = sqlx::query(&format!(
            "INSERT INTO records (id, created_by, subject_email, content) \
             VALUES ($1, $2, $3, $4) RETURNING {RECORD_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.created_by)
        .bind(&new.subject_email)
        .bind(&content)
        .fetch_one(&self.pool)
        .await
        .map_err(crate::Error::Database)?;
        row_to_record(&row)
    }
}

pub struct PostgresCommunicationStore {
    pool: PgPool,
}

impl PostgresCommunicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_communication(row: &PgRow) -> crate::Result<Communication> {
    let status: String = row.get("status");
    let direction: String = row.get("direction");
    Ok(Communication {
        id: row.get("id"),
        created_at: row.get("created_at"),
        direction: direction.parse().map_err(crate::Error::Internal)?,
        status: status.parse().map_err(crate::Error::Internal)?,
        counterparty: row.get("counterparty"),
        actor: row.get("actor"),
        payload: row.get("payload"),
        record: row.get("record_id"),
    })
}

#[async_trait]
impl CommunicationStore for PostgresCommunicationStore {
    async fn find_by_id(&self, id: Uuid) -> crate::Result<Option<Communication>> {
        let row = sqlx::query(&format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::Error::Database)?;
        row.as_ref().map(row_to_communication).transpose()
    }

    async fn create(&self, new: NewCommunication) -> crate::Result<Communication> {
        let row = sqlx::query(&format!(
            "INSERT INTO communications (id, direction, status, counterparty, actor, payload) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COMMUNICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.direction.as_str())
        .bind(new.status.as_str())
        .bind(&new.counterparty)
        .bind(new.actor)
        .bind(&new.payload)
        .fetch_one(&self.pool)
        .await
        .map_err(crate::Error::Database)?;
        row_to_communication(&row)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: CommunicationStatus,
        to: CommunicationStatus,
        record: Option<Uuid>,
    ) -> crate::Result<Option<Communication>> {
        // Single guarded UPDATE: of two concurrent callers, exactly one
        // matches the `status = from` predicate.
        let row = sqlx::query(&format!(
            "UPDATE communications \
             SET status = $3, record_id = COALESCE($4, record_id) \
             WHERE id = $1 AND status = $2 RETURNING {COMMUNICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(record)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::Error::Database)?;
        row.as_ref().map(row_to_communication).transpose()
    }

    async fn list_for_actor(
        &self,
        actor: Uuid,
        direction: CommunicationDirection,
        limit: i64,
        offset: i64,
    ) -> crate::Result<(Vec<Communication>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM communications WHERE actor = $1 AND direction = $2",
        )
        .bind(actor)
        .bind(direction.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(crate::Error::Database)?;

        let rows = sqlx::query(&format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications \
             WHERE actor = $1 AND direction = $2 \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(actor)
        .bind(direction.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::Error::Database)?;

        let items = rows
            .iter()
            .map(row_to_communication)
            .collect::<crate::Result<Vec<_>>>()?;
        Ok((items, total))
    }
}

pub struct PostgresPractitionerDirectory {
    pool: PgPool,
}

impl PostgresPractitionerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_practitioner(row: &PgRow) -> Practitioner {
    Practitioner {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        organization: row.get("organization"),
    }
}

#[async_trait]
impl PractitionerDirectory for PostgresPractitionerDirectory {
    async fn find_by_id(&self, id: Uuid) -> crate::Result<Option<Practitioner>> {
        let row = sqlx::query("SELECT id, name, email, organization FROM practitioners WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::Error::Database)?;
        Ok(row.as_ref().map(row_to_practitioner))
    }

    async fn find_by_email(&self, email: &str) -> crate::Result<Option<Practitioner>> {
        let row =
            sqlx::query("SELECT id, name, email, organization FROM practitioners WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(crate::Error::Database)?;
        Ok(row.as_ref().map(row_to_practitioner))
    }
}
