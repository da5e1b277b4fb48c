//! Transaction bundle assembly.
//!
//! Turns one stored clinical record into a self-contained transaction
//! document. Every resource is copied, normalized and keyed by a symbolic
//! `urn:uuid:` identifier, internal references are rewritten to those
//! symbols, and the mandatory clinical associations (subject, encounter) are
//! enforced so the receiving side can resolve the whole graph without access
//! to local ids.

use std::collections::HashMap;

use serde_json::{json, Value as JsonValue};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{resource_type_of, Bundle, BundleEntry, BundleRequest, RecordContent};
use crate::normalize::prepare_resource;
use crate::rewrite::rewrite_references;

/// Assembly failures. A record without an identified patient cannot anchor
/// the document graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("record has no patient resource")]
    MissingPatient,
    #[error("patient resource has no identifier")]
    MissingPatientId,
}

/// Which structural associations are forced onto a slot's resource after
/// rewriting. Allergies are deliberately absent: they carry no forced
/// linkage, only map-based rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Linkage {
    None,
    Subject,
    SubjectAndEncounter,
}

struct Slot<'a> {
    /// Fallback type name when the stored resource lacks `resourceType`.
    nominal_type: &'static str,
    linkage: Linkage,
    resource: &'a JsonValue,
}

/// Assembles the transaction document for one record.
///
/// Slot order is fixed: patient, encounter, condition, procedure, then the
/// allergy, observation and medication collections in element order. Each
/// call mints fresh symbols, so repeated assembly of the same record yields
/// structurally equal documents that differ only in the urns. The record is
/// never modified.
pub fn assemble(content: &RecordContent) -> Result<Bundle, AssembleError> {
    if !content.patient.is_object() {
        return Err(AssembleError::MissingPatient);
    }
    if local_id(&content.patient).is_none() {
        return Err(AssembleError::MissingPatientId);
    }

    let slots = ordered_slots(content);
    let symbols: Vec<String> = slots.iter().map(|_| mint_symbol()).collect();

    // Map every local `Type/id` spelling to its symbol. Resources without a
    // stored id are still emitted under a symbol but cannot be referenced.
    let mut mapping = HashMap::new();
    for (slot, symbol) in slots.iter().zip(&symbols) {
        if let Some(id) = local_id(slot.resource) {
            let type_name = resource_type_of(slot.resource).unwrap_or(slot.nominal_type);
            mapping.insert(format!("{type_name}/{id}"), symbol.clone());
        }
    }

    let patient_urn = symbols[0].as_str();
    let encounter_urn = content.encounter.as_ref().map(|_| symbols[1].as_str());

    let mut entries = Vec::with_capacity(slots.len());
    for (slot, symbol) in slots.iter().zip(&symbols) {
        let mut resource = prepare_resource(slot.resource);
        rewrite_references(&mut resource, &mapping);
        apply_linkage(&mut resource, slot.linkage, patient_urn, encounter_urn);

        let url = resource_type_of(&resource)
            .unwrap_or(slot.nominal_type)
            .to_string();
        entries.push(BundleEntry {
            full_url: symbol.clone(),
            resource,
            request: BundleRequest {
                method: "POST".to_string(),
                url,
            },
        });
    }

    Ok(Bundle {
        resource_type: "Bundle".to_string(),
        bundle_type: "transaction".to_string(),
        entry: entries,
    })
}

/// The deterministic slot order the document is emitted in.
fn ordered_slots(content: &RecordContent) -> Vec<Slot<'_>> {
    let mut slots = vec![Slot {
        nominal_type: "Patient",
        linkage: Linkage::None,
        resource: &content.patient,
    }];
    if let Some(encounter) = &content.encounter {
        slots.push(Slot {
            nominal_type: "Encounter",
            linkage: Linkage::Subject,
            resource: encounter,
        });
    }
    if let Some(condition) = &content.condition {
        slots.push(Slot {
            nominal_type: "Condition",
            linkage: Linkage::SubjectAndEncounter,
            resource: condition,
        });
    }
    if let Some(procedure) = &content.procedure {
        slots.push(Slot {
            nominal_type: "Procedure",
            linkage: Linkage::SubjectAndEncounter,
            resource: procedure,
        });
    }
    for allergy in &content.allergies {
        slots.push(Slot {
            nominal_type: "AllergyIntolerance",
            linkage: Linkage::None,
            resource: allergy,
        });
    }
    for observation in &content.observations {
        slots.push(Slot {
            nominal_type: "Observation",
            linkage: Linkage::SubjectAndEncounter,
            resource: observation,
        });
    }
    for medication in &content.medications {
        slots.push(Slot {
            nominal_type: "MedicationRequest",
            linkage: Linkage::SubjectAndEncounter,
            resource: medication,
        });
    }
    slots
}

fn mint_symbol() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}

/// The resource's stored id, when it is a non-empty string.
fn local_id(resource: &JsonValue) -> Option<&str> {
    resource
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|id| !id.is_empty())
}

/// Forces the clinical context onto a rewritten resource. The subject always
/// points at the patient symbol; the encounter link is only forced when the
/// record actually has an encounter.
fn apply_linkage(
    resource: &mut JsonValue,
    linkage: Linkage,
    patient_urn: &str,
    encounter_urn: Option<&str>,
) {
    if matches!(linkage, Linkage::Subject | Linkage::SubjectAndEncounter) {
        set_reference(resource, "subject", patient_urn);
    }
    if linkage == Linkage::SubjectAndEncounter {
        if let Some(urn) = encounter_urn {
            set_reference(resource, "encounter", urn);
        }
    }
}

/// Overwrites `resource.<field>` with `{ "reference": <urn> }`.
fn set_reference(resource: &mut JsonValue, field: &str, urn: &str) {
    if let JsonValue::Object(obj) = resource {
        obj.insert(field.to_string(), json!({ "reference": urn }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient(id: &str) -> JsonValue {
        json!({"resourceType": "Patient", "id": id, "name": [{"family": "Verdi"}]})
    }

    fn content_with_observation() -> RecordContent {
        RecordContent {
            patient: patient("P1"),
            observations: vec![json!({
                "resourceType": "Observation",
                "id": "O1",
                "status": "final",
                "subject": {"reference": "Patient/P1"}
            })],
            ..Default::default()
        }
    }

    /// Replaces every urn symbol with a stable placeholder so two assemblies
    /// of the same record can be compared structurally.
    fn canonicalize(bundle: &Bundle) -> JsonValue {
        let mut wire = serde_json::to_value(bundle).unwrap();
        let replacements: HashMap<String, String> = bundle
            .entry
            .iter()
            .enumerate()
            .map(|(i, e)| (e.full_url.clone(), format!("urn:slot:{i}")))
            .collect();
        fn walk(value: &mut JsonValue, replacements: &HashMap<String, String>) {
            match value {
                JsonValue::String(s) => {
                    if let Some(stable) = replacements.get(s.as_str()) {
                        *s = stable.clone();
                    }
                }
                JsonValue::Array(items) => items.iter_mut().for_each(|v| walk(v, replacements)),
                JsonValue::Object(obj) => obj.values_mut().for_each(|v| walk(v, replacements)),
                _ => {}
            }
        }
        walk(&mut wire, &replacements);
        wire
    }

    #[test]
    fn test_patient_only_record_yields_single_entry() {
        let bundle = assemble(&RecordContent {
            patient: patient("P1"),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(bundle.resource_type, "Bundle");
        assert_eq!(bundle.bundle_type, "transaction");
        assert_eq!(bundle.entry.len(), 1);
        let entry = &bundle.entry[0];
        assert!(entry.full_url.starts_with("urn:uuid:"));
        assert_eq!(entry.request.method, "POST");
        assert_eq!(entry.request.url, "Patient");
        assert!(entry.resource.get("id").is_none());
    }

    #[test]
    fn test_observation_subject_is_rewritten_to_patient_symbol() {
        let bundle = assemble(&content_with_observation()).unwrap();

        assert_eq!(bundle.entry.len(), 2);
        let patient_urn = &bundle.entry[0].full_url;
        let observation = &bundle.entry[1].resource;
        assert_eq!(observation["subject"]["reference"], *patient_urn);
        assert_ne!(observation["subject"]["reference"], "Patient/P1");
    }

    #[test]
    fn test_missing_patient_is_rejected() {
        let err = assemble(&RecordContent::default()).unwrap_err();
        assert_eq!(err, AssembleError::MissingPatient);

        let err = assemble(&RecordContent {
            patient: json!({"resourceType": "Patient"}),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, AssembleError::MissingPatientId);
    }

    #[test]
    fn test_slot_order_is_deterministic() {
        let content = RecordContent {
            patient: patient("P1"),
            encounter: Some(json!({"resourceType": "Encounter", "id": "E1"})),
            condition: Some(json!({"resourceType": "Condition", "id": "C1"})),
            procedure: Some(json!({"resourceType": "Procedure", "id": "R1"})),
            allergies: vec![json!({"resourceType": "AllergyIntolerance", "id": "A1"})],
            observations: vec![
                json!({"resourceType": "Observation", "id": "O1"}),
                json!({"resourceType": "Observation", "id": "O2"}),
            ],
            medications: vec![json!({"resourceType": "MedicationRequest", "id": "M1"})],
        };

        let bundle = assemble(&content).unwrap();
        let order: Vec<&str> = bundle
            .entry
            .iter()
            .map(|e| e.request.url.as_str())
            .collect();
        assert_eq!(
            order,
            vec![
                "Patient",
                "Encounter",
                "Condition",
                "Procedure",
                "AllergyIntolerance",
                "Observation",
                "Observation",
                "MedicationRequest"
            ]
        );
        assert_eq!(bundle.entry.len(), content.resource_count());
    }

    #[test]
    fn test_structural_linkage_is_forced() {
        let content = RecordContent {
            patient: patient("P1"),
            encounter: Some(json!({"resourceType": "Encounter", "id": "E1"})),
            condition: Some(json!({"resourceType": "Condition", "id": "C1"})),
            allergies: vec![json!({"resourceType": "AllergyIntolerance", "id": "A1"})],
            // No subject stored on the medication at all.
            medications: vec![json!({"resourceType": "MedicationRequest", "id": "M1"})],
            ..Default::default()
        };

        let bundle = assemble(&content).unwrap();
        let patient_urn = &bundle.entry[0].full_url;
        let encounter_urn = &bundle.entry[1].full_url;

        let encounter = &bundle.entry[1].resource;
        assert_eq!(encounter["subject"]["reference"], *patient_urn);

        let condition = &bundle.entry[2].resource;
        assert_eq!(condition["subject"]["reference"], *patient_urn);
        assert_eq!(condition["encounter"]["reference"], *encounter_urn);

        let allergy = &bundle.entry[3].resource;
        assert!(allergy.get("subject").is_none());
        assert!(allergy.get("encounter").is_none());

        let medication = &bundle.entry[4].resource;
        assert_eq!(medication["subject"]["reference"], *patient_urn);
        assert_eq!(medication["encounter"]["reference"], *encounter_urn);
    }

    #[test]
    fn test_no_encounter_link_without_an_encounter_slot() {
        let bundle = assemble(&content_with_observation()).unwrap();
        let observation = &bundle.entry[1].resource;
        assert!(observation.get("encounter").is_none());
    }

    #[test]
    fn test_no_local_reference_survives_for_mapped_resources() {
        let content = RecordContent {
            patient: patient("P1"),
            encounter: Some(json!({
                "resourceType": "Encounter",
                "id": "E1",
                "subject": {"reference": "Patient/P1"}
            })),
            observations: vec![json!({
                "resourceType": "Observation",
                "id": "O1",
                "subject": {"reference": "Patient/P1"},
                "encounter": {"reference": "Encounter/E1"},
                "derivedFrom": [{"reference": "Observation/O1"}]
            })],
            ..Default::default()
        };

        let bundle = assemble(&content).unwrap();
        let wire = serde_json::to_string(&bundle).unwrap();
        assert!(!wire.contains("Patient/P1"));
        assert!(!wire.contains("Encounter/E1"));
        assert!(!wire.contains("Observation/O1"));
    }

    #[test]
    fn test_assembly_never_mutates_the_record() {
        let content = RecordContent {
            patient: json!({"resourceType": "Patient", "id": "P1", "gender": ""}),
            observations: vec![json!({
                "resourceType": "Observation",
                "id": "O1",
                "subject": {"reference": "Patient/P1"}
            })],
            ..Default::default()
        };
        let before = content.clone();
        let _ = assemble(&content).unwrap();
        assert_eq!(content, before);
    }

    #[test]
    fn test_repeated_assembly_is_structurally_equal() {
        let content = RecordContent {
            patient: patient("P1"),
            encounter: Some(json!({"resourceType": "Encounter", "id": "E1"})),
            observations: vec![json!({
                "resourceType": "Observation",
                "id": "O1",
                "subject": {"reference": "Patient/P1"}
            })],
            ..Default::default()
        };

        let first = assemble(&content).unwrap();
        let second = assemble(&content).unwrap();
        assert_ne!(first.entry[0].full_url, second.entry[0].full_url);
        assert_eq!(canonicalize(&first), canonicalize(&second));
    }

    #[test]
    fn test_resource_without_id_gets_symbol_but_no_mapping() {
        let content = RecordContent {
            patient: patient("P1"),
            observations: vec![json!({
                "resourceType": "Observation",
                "derivedFrom": [{"reference": "Observation/unknowable"}]
            })],
            ..Default::default()
        };

        let bundle = assemble(&content).unwrap();
        let observation = &bundle.entry[1].resource;
        assert!(bundle.entry[1].full_url.starts_with("urn:uuid:"));
        // Nothing maps the stored reference, so it passes through; the
        // forced subject linkage applies regardless.
        assert_eq!(
            observation["derivedFrom"][0]["reference"],
            "Observation/unknowable"
        );
        assert_eq!(observation["subject"]["reference"], bundle.entry[0].full_url);
    }

    #[test]
    fn test_symbols_are_unique_within_the_document() {
        let content = RecordContent {
            patient: patient("P1"),
            allergies: vec![
                json!({"resourceType": "AllergyIntolerance", "id": "A1"}),
                json!({"resourceType": "AllergyIntolerance", "id": "A2"}),
            ],
            ..Default::default()
        };
        let bundle = assemble(&content).unwrap();
        let mut urns: Vec<&String> = bundle.entry.iter().map(|e| &e.full_url).collect();
        urns.sort();
        urns.dedup();
        assert_eq!(urns.len(), bundle.entry.len());
    }
}
