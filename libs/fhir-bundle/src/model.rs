//! Wire models for transaction documents and the record content graph.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The resource graph stored on one clinical record.
///
/// The patient slot is mandatory. Encounter, condition and procedure are
/// optional singletons; allergies, observations and medications are ordered
/// collections whose element order is preserved end to end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordContent {
    /// Subject of care. `Null` when absent from the input; every consumer
    /// checks for an object before acting.
    #[serde(default)]
    pub patient: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<JsonValue>,
    #[serde(default)]
    pub allergies: Vec<JsonValue>,
    #[serde(default)]
    pub observations: Vec<JsonValue>,
    #[serde(default)]
    pub medications: Vec<JsonValue>,
}

impl RecordContent {
    /// Number of resources present across all slots.
    pub fn resource_count(&self) -> usize {
        1 + self.encounter.is_some() as usize
            + self.condition.is_some() as usize
            + self.procedure.is_some() as usize
            + self.allergies.len()
            + self.observations.len()
            + self.medications.len()
    }
}

/// A transaction document ready for submission to an external registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,
    #[serde(rename = "type")]
    pub bundle_type: String,
    pub entry: Vec<BundleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,
    pub resource: JsonValue,
    pub request: BundleRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleRequest {
    pub method: String,
    pub url: String,
}

/// Returns the `resourceType` of a JSON resource when present and non-empty.
pub fn resource_type_of(resource: &JsonValue) -> Option<&str> {
    resource
        .get("resourceType")
        .and_then(|v| v.as_str())
        .filter(|t| !t.is_empty())
}
