//! Communication model and status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Lifecycle state of one exchanged document.
///
/// Outbound communications are born terminal (`Delivered` or `Failed`).
/// Inbound ones start `Pending` and are resolved by a clinician to either
/// `Received` or `Cancelled`; every state but `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationStatus {
    Pending,
    Received,
    Delivered,
    Cancelled,
    Failed,
}

impl CommunicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Received => "received",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The complete transition relation: pending → received and
    /// pending → cancelled, nothing else.
    pub fn can_transition_to(&self, target: CommunicationStatus) -> bool {
        matches!(
            (*self, target),
            (Self::Pending, Self::Received) | (Self::Pending, Self::Cancelled)
        )
    }
}

impl std::str::FromStr for CommunicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "received" => Ok(Self::Received),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown communication status: {other}")),
        }
    }
}

impl std::fmt::Display for CommunicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the local side sent or received the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationDirection {
    Outgoing,
    Incoming,
}

impl CommunicationDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outgoing => "outgoing",
            Self::Incoming => "incoming",
        }
    }
}

impl std::str::FromStr for CommunicationDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outgoing" => Ok(Self::Outgoing),
            "incoming" => Ok(Self::Incoming),
            other => Err(format!("unknown communication direction: {other}")),
        }
    }
}

impl std::fmt::Display for CommunicationDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exchanged document and its lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub direction: CommunicationDirection,
    pub status: CommunicationStatus,
    /// Name of the external organization on the other side.
    pub counterparty: String,
    /// Local practitioner associated with the exchange.
    pub actor: Uuid,
    /// Outbound: the registry response, or the failure outcome.
    /// Inbound: the raw submission.
    pub payload: JsonValue,
    /// Record created by cancelled-path ingestion, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<Uuid>,
}

/// Fields for creating a communication; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewCommunication {
    pub direction: CommunicationDirection,
    pub status: CommunicationStatus,
    pub counterparty: String,
    pub actor: Uuid,
    pub payload: JsonValue,
}
