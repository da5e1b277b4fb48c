//! Content extraction from received documents.

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::model::{resource_type_of, RecordContent};

/// Extraction failures that make a document unusable as a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("document contains no patient resource")]
    NoPatient,
}

impl RecordContent {
    /// Builds record content out of a received document.
    ///
    /// The first Patient, Encounter, Condition and Procedure fill the
    /// singleton slots; every AllergyIntolerance, Observation and
    /// MedicationRequest is collected in document order. Other resource
    /// types are skipped. The document itself is never modified.
    pub fn from_bundle(document: &JsonValue) -> Result<Self, ExtractError> {
        let mut content = RecordContent::default();
        let mut patient = None;

        let entries = document
            .get("entry")
            .and_then(|e| e.as_array())
            .map(|e| e.as_slice())
            .unwrap_or(&[]);

        for entry in entries {
            let Some(resource) = entry.get("resource") else {
                continue;
            };
            match resource_type_of(resource) {
                Some("Patient") => {
                    if patient.is_none() {
                        patient = Some(resource.clone());
                    }
                }
                Some("Encounter") => {
                    if content.encounter.is_none() {
                        content.encounter = Some(resource.clone());
                    }
                }
                Some("Condition") => {
                    if content.condition.is_none() {
                        content.condition = Some(resource.clone());
                    }
                }
                Some("Procedure") => {
                    if content.procedure.is_none() {
                        content.procedure = Some(resource.clone());
                    }
                }
                Some("AllergyIntolerance") => content.allergies.push(resource.clone()),
                Some("Observation") => content.observations.push(resource.clone()),
                Some("MedicationRequest") => content.medications.push(resource.clone()),
                _ => {}
            }
        }

        content.patient = patient.ok_or(ExtractError::NoPatient)?;
        Ok(content)
    }
}

/// First email address found in a patient's telecom entries.
pub fn contact_email(patient: &JsonValue) -> Option<String> {
    patient
        .get("telecom")
        .and_then(|t| t.as_array())
        .into_iter()
        .flatten()
        .find(|point| {
            point.get("system").and_then(|v| v.as_str()) == Some("email")
                && point
                    .get("value")
                    .and_then(|v| v.as_str())
                    .is_some_and(|v| !v.is_empty())
        })
        .and_then(|point| point.get("value").and_then(|v| v.as_str()))
        .map(|v| v.to_string())
}
