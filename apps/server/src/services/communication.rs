//! Inbound communications: receipt, status lifecycle, listing.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use uuid::Uuid;

use kurier_bundle::{contact_email, validate_submission, RecordContent, ValidationIssue};

use crate::db::{CommunicationStore, PractitionerDirectory, RecordStore};
use crate::models::{
    Communication, CommunicationDirection, CommunicationStatus, NewClinicalRecord, NewCommunication,
};

/// Fixed page size for communication listings.
const PAGE_SIZE: i64 = 8;

/// Contact recorded when an ingested patient carries no telecom email.
const UNKNOWN_CONTACT: &str = "unknown";

/// An inbound submission as handed over by the counterparty.
#[derive(Debug, Clone)]
pub struct Submission {
    pub counterparty_email: String,
    pub counterparty_name: String,
    pub document: JsonValue,
}

/// Result of an inbound submission: tracked as pending, or rejected with
/// the full issue list. Rejection is data, not an error.
#[derive(Debug)]
pub enum ReceiveOutcome {
    Accepted(Communication),
    Rejected(Vec<ValidationIssue>),
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub items_per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// One page of an actor's communications.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationPage {
    pub communications: Vec<Communication>,
    pub pagination: PageInfo,
}

pub struct CommunicationService {
    communications: Arc<dyn CommunicationStore>,
    records: Arc<dyn RecordStore>,
    practitioners: Arc<dyn PractitionerDirectory>,
}

impl CommunicationService {
    pub fn new(
        communications: Arc<dyn CommunicationStore>,
        records: Arc<dyn RecordStore>,
        practitioners: Arc<dyn PractitionerDirectory>,
    ) -> Self {
        Self {
            communications,
            records,
            practitioners,
        }
    }

    /// Accepts a document submitted by an external party for a local
    /// practitioner, addressed by email.
    ///
    /// A malformed document is rejected without persisting anything; an
    /// acceptable one is tracked as a pending incoming communication.
    pub async fn receive(&self, submission: Submission) -> crate::Result<ReceiveOutcome> {
        let recipient = self
            .practitioners
            .find_by_email(&submission.counterparty_email)
            .await?
            .ok_or_else(|| crate::Error::RecipientNotFound {
                email: submission.counterparty_email.clone(),
            })?;

        let issues = validate_submission(&submission.document);
        if !issues.is_empty() {
            tracing::debug!(
                recipient = %recipient.id,
                issues = issues.len(),
                "rejected inbound submission"
            );
            return Ok(ReceiveOutcome::Rejected(issues));
        }

        let communication = self
            .communications
            .create(NewCommunication {
                direction: CommunicationDirection::Incoming,
                status: CommunicationStatus::Pending,
                counterparty: submission.counterparty_name,
                actor: recipient.id,
                payload: submission.document,
            })
            .await?;
        tracing::info!(
            communication_id = %communication.id,
            recipient = %recipient.id,
            counterparty = %communication.counterparty,
            "inbound submission accepted"
        );
        Ok(ReceiveOutcome::Accepted(communication))
    }

    /// Resolves one pending communication to `Received` or `Cancelled`.
    ///
    /// `Received` acknowledges the document and nothing else. `Cancelled`
    /// ingests the payload into a new record owned by the acting clinician
    /// and links it to the communication.
    pub async fn update_status(
        &self,
        actor_id: Uuid,
        communication_id: Uuid,
        target: CommunicationStatus,
    ) -> crate::Result<Communication> {
        let communication = self
            .communications
            .find_by_id(communication_id)
            .await?
            .ok_or(crate::Error::CommunicationNotFound {
                id: communication_id,
            })?;

        if !matches!(
            target,
            CommunicationStatus::Received | CommunicationStatus::Cancelled
        ) {
            return Err(crate::Error::InvalidTransition(format!(
                "a communication can only be resolved to received or cancelled, not {target}"
            )));
        }
        if !communication.status.can_transition_to(target) {
            return Err(crate::Error::InvalidTransition(format!(
                "communication {communication_id} is {} and cannot become {target}",
                communication.status
            )));
        }

        let record = if target == CommunicationStatus::Cancelled {
            Some(self.ingest(actor_id, &communication).await?)
        } else {
            None
        };

        // The store performs the check and the write as one guarded update,
        // so a concurrent resolver cannot claim the same pending row.
        let updated = self
            .communications
            .transition(communication_id, CommunicationStatus::Pending, target, record)
            .await?
            .ok_or_else(|| {
                crate::Error::InvalidTransition(format!(
                    "communication {communication_id} left pending concurrently"
                ))
            })?;
        tracing::info!(
            communication_id = %communication_id,
            to = %target,
            record = ?updated.record,
            "communication resolved"
        );
        Ok(updated)
    }

    /// Builds and stores the record for a cancelled communication.
    async fn ingest(&self, actor_id: Uuid, communication: &Communication) -> crate::Result<Uuid> {
        let actor = self
            .practitioners
            .find_by_id(actor_id)
            .await?
            .ok_or(crate::Error::ActorNotFound { id: actor_id })?;

        let content = RecordContent::from_bundle(&communication.payload)?;
        let subject_email =
            contact_email(&content.patient).unwrap_or_else(|| UNKNOWN_CONTACT.to_string());
        let record = self
            .records
            .create(NewClinicalRecord {
                created_by: actor.id,
                subject_email,
                content,
            })
            .await?;
        tracing::info!(
            communication_id = %communication.id,
            record_id = %record.id,
            "ingested inbound document as record"
        );
        Ok(record.id)
    }

    /// One page of the actor's communications, newest first. Pages are
    /// 1-based; a page past the end is empty, not an error.
    pub async fn list(
        &self,
        actor_id: Uuid,
        direction: CommunicationDirection,
        page: u32,
    ) -> crate::Result<CommunicationPage> {
        let page = page.max(1);
        let offset = (page as i64 - 1) * PAGE_SIZE;
        let (communications, total_items) = self
            .communications
            .list_for_actor(actor_id, direction, PAGE_SIZE, offset)
            .await?;

        let total_pages = (total_items + PAGE_SIZE - 1) / PAGE_SIZE;
        let pagination = PageInfo {
            current_page: page,
            items_per_page: PAGE_SIZE,
            total_items,
            total_pages,
            has_next_page: (page as i64) < total_pages,
            has_previous_page: page > 1,
        };
        Ok(CommunicationPage {
            communications,
            pagination,
        })
    }
}

