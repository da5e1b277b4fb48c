//! Inbound communication handlers

use crate::{
    api::extract::ActorId,
    models::{CommunicationDirection, CommunicationStatus},
    services::{ReceiveOutcome, Submission},
    state::AppState,
    Result,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use kurier_bundle::issues_to_operation_outcome;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveBody {
    #[validate(email)]
    pub counterparty_email: String,
    #[validate(length(min = 1))]
    pub counterparty_name: String,
    pub document: JsonValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusBody {
    pub status: CommunicationStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommunicationsQuery {
    pub direction: CommunicationDirection,
    pub page: Option<u32>,
}

/// Accept a document submitted by an external organization
///
/// The recipient practitioner is addressed by email. A structurally
/// unacceptable document comes back as 422 with the full issue list; an
/// accepted one is tracked as a pending incoming communication.
pub async fn receive_communication(
    State(state): State<AppState>,
    Json(body): Json<ReceiveBody>,
) -> Result<Response> {
    body.validate()
        .map_err(|e| crate::Error::Validation(e.to_string()))?;

    let outcome = state
        .communications
        .receive(Submission {
            counterparty_email: body.counterparty_email,
            counterparty_name: body.counterparty_name,
            document: body.document,
        })
        .await?;

    match outcome {
        ReceiveOutcome::Accepted(communication) => {
            Ok((StatusCode::CREATED, Json(communication)).into_response())
        }
        ReceiveOutcome::Rejected(issues) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(issues_to_operation_outcome(&issues)),
        )
            .into_response()),
    }
}

/// Resolve a pending communication to received or cancelled
pub async fn update_communication_status(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Path(communication_id): Path<Uuid>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Response> {
    let updated = state
        .communications
        .update_status(actor_id, communication_id, body.status)
        .await?;
    Ok((StatusCode::OK, Json(updated)).into_response())
}

/// One page of the caller's communications, newest first
pub async fn list_communications(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Query(q): Query<ListCommunicationsQuery>,
) -> Result<Response> {
    let page = state
        .communications
        .list(actor_id, q.direction, q.page.unwrap_or(1))
        .await?;
    Ok((StatusCode::OK, Json(page)).into_response())
}
