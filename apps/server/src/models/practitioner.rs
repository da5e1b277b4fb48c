//! Practitioner directory model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A local clinician known to the exchange.
///
/// Rows are managed by the surrounding identity system; the exchange only
/// reads them, to attribute communications and to resolve inbound
/// recipients by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Practitioner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Organization the practitioner acts for.
    pub organization: String,
}
