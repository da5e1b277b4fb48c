//! Resource normalization for outbound assembly.

use serde_json::Value as JsonValue;

/// Produces the submission copy of a stored resource.
///
/// The copy loses its top-level `id` (the receiving registry assigns its own
/// identity) and every object field holding an empty string, at any depth.
/// The stored resource itself is never modified.
pub fn prepare_resource(resource: &JsonValue) -> JsonValue {
    let mut copy = resource.clone();
    if let JsonValue::Object(obj) = &mut copy {
        obj.remove("id");
    }
    strip_empty_strings(&mut copy);
    copy
}

/// Removes object fields whose value is `""`, recursing through nested
/// objects and arrays. Array elements are visited but never removed, so
/// positional data keeps its shape.
fn strip_empty_strings(value: &mut JsonValue) {
    match value {
        JsonValue::Object(obj) => {
            obj.retain(|_, v| !matches!(v, JsonValue::String(s) if s.is_empty()));
            for child in obj.values_mut() {
                strip_empty_strings(child);
            }
        }
        JsonValue::Array(items) => {
            for item in items.iter_mut() {
                strip_empty_strings(item);
            }
        }
        _ => {}
    }
}
