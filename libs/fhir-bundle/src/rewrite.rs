//! Reference rewriting for assembled documents.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

/// The only fields whose string values may be rewritten. FHIR expresses
/// linkage through `Reference.reference`; display text, narrative and
/// identifier values can contain the same `Type/id` spelling and must
/// survive untouched.
const REFERENCE_FIELDS: &[&str] = &["reference"];

/// Replaces local `ResourceType/id` references with their symbolic urns.
///
/// Walks the whole tree. Only allow-listed fields are candidates, and only
/// values present in `mapping` change; unknown references pass through.
pub fn rewrite_references(value: &mut JsonValue, mapping: &HashMap<String, String>) {
    match value {
        JsonValue::Object(obj) => {
            for (key, child) in obj.iter_mut() {
                if REFERENCE_FIELDS.contains(&key.as_str()) {
                    if let JsonValue::String(reference) = child {
                        if let Some(target) = mapping.get(reference.as_str()) {
                            *reference = target.clone();
                        }
                        continue;
                    }
                }
                rewrite_references(child, mapping);
            }
        }
        JsonValue::Array(items) => {
            for item in items.iter_mut() {
                rewrite_references(item, mapping);
            }
        }
        _ => {}
    }
}
