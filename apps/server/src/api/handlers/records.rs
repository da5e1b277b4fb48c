//! Record authoring and exchange handlers

use crate::{api::extract::ActorId, state::AppState, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use kurier_bundle::RecordContent;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordBody {
    pub subject_email: String,
    #[serde(flatten)]
    pub content: RecordContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRecordBody {
    pub counterparty: String,
}

/// Create a clinical record owned by the calling practitioner
pub async fn create_record(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Json(body): Json<CreateRecordBody>,
) -> Result<Response> {
    let record = state
        .records
        .create(actor_id, body.subject_email, body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

/// List the calling practitioner's records, newest first
pub async fn list_records(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
) -> Result<Response> {
    let records = state.records.list_own(actor_id).await?;
    let total = records.len();
    Ok((
        StatusCode::OK,
        Json(json!({
            "records": records,
            "total": total,
        })),
    )
        .into_response())
}

/// Assemble a record into a transaction document and deliver it
pub async fn send_record(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Path(record_id): Path<Uuid>,
    Json(body): Json<SendRecordBody>,
) -> Result<Response> {
    if body.counterparty.trim().is_empty() {
        return Err(crate::Error::Validation(
            "counterparty must not be empty".to_string(),
        ));
    }

    let outcome = state
        .exchange
        .send(actor_id, record_id, &body.counterparty)
        .await?;
    Ok((StatusCode::OK, Json(outcome)).into_response())
}
