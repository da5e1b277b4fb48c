//! Outbound exchange: assemble a record and deliver it to the registry.

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::db::{CommunicationStore, PractitionerDirectory, RecordStore};
use crate::models::{CommunicationDirection, CommunicationStatus, NewCommunication};
use crate::services::dispatch::DispatchClient;

/// Summary of a delivered document, surfaced to the caller.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub http_status: u16,
    pub outcome: JsonValue,
}

pub struct ExchangeService {
    records: Arc<dyn RecordStore>,
    practitioners: Arc<dyn PractitionerDirectory>,
    communications: Arc<dyn CommunicationStore>,
    dispatch: Arc<DispatchClient>,
}

impl ExchangeService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        practitioners: Arc<dyn PractitionerDirectory>,
        communications: Arc<dyn CommunicationStore>,
        dispatch: Arc<DispatchClient>,
    ) -> Self {
        Self {
            records,
            practitioners,
            communications,
            dispatch,
        }
    }

    /// Sends one record to the named counterparty via the registry.
    ///
    /// The attempt is always persisted before this returns: a delivered
    /// document as a `Delivered` communication carrying the registry's
    /// answer, a transport failure as `Failed` carrying an outcome document
    /// that describes the failure. Transport errors then propagate.
    pub async fn send(
        &self,
        actor_id: Uuid,
        record_id: Uuid,
        counterparty: &str,
    ) -> crate::Result<SendOutcome> {
        let record = self
            .records
            .find_by_id(record_id)
            .await?
            .ok_or(crate::Error::RecordNotFound { id: record_id })?;
        let actor = self
            .practitioners
            .find_by_id(actor_id)
            .await?
            .ok_or(crate::Error::ActorNotFound { id: actor_id })?;

        let bundle = kurier_bundle::assemble(&record.content)?;
        let document = serde_json::to_value(&bundle).map_err(|e| {
            crate::Error::Internal(format!("assembled document not serializable: {e}"))
        })?;
        tracing::debug!(
            record_id = %record.id,
            entries = bundle.entry.len(),
            "assembled transaction document"
        );

        match self.dispatch.submit(&document).await {
            Ok(response) => {
                self.communications
                    .create(NewCommunication {
                        direction: CommunicationDirection::Outgoing,
                        status: CommunicationStatus::Delivered,
                        counterparty: counterparty.to_string(),
                        actor: actor.id,
                        payload: response.body.clone(),
                    })
                    .await?;
                tracing::info!(
                    record_id = %record.id,
                    counterparty,
                    status = response.status,
                    "document delivered"
                );
                Ok(SendOutcome {
                    http_status: response.status,
                    outcome: response.body,
                })
            }
            Err(err @ crate::Error::Transport(_)) => {
                self.communications
                    .create(NewCommunication {
                        direction: CommunicationDirection::Outgoing,
                        status: CommunicationStatus::Failed,
                        counterparty: counterparty.to_string(),
                        actor: actor.id,
                        payload: failure_outcome(&err),
                    })
                    .await?;
                tracing::warn!(
                    record_id = %record.id,
                    counterparty,
                    error = %err,
                    "dispatch failed"
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

/// Outcome document persisted on a failed delivery.
fn failure_outcome(err: &crate::Error) -> JsonValue {
    json!({
        "resourceType": "OperationOutcome",
        "issue": [{
            "severity": "error",
            "code": "transient",
            "diagnostics": err.to_string(),
        }]
    })
}
