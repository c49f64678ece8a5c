//! Display names from free-form feature attributes.

use crate::source::Attributes;

/// Attribute keys probed for a stop name, most specific first.
pub const STOP_NAME_KEYS: [&str; 6] = [
    "մետրո_կայան",
    "station_name",
    "stop_name",
    "անվանում",
    "name",
    "layer",
];

/// Attribute keys probed for a line name, most specific first.
pub const LINE_NAME_KEYS: [&str; 5] = ["անվանում", "layer", "name", "route_name", "line_name"];

fn usable(value: Option<&String>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(value.to_string())
    }
}

/// First usable value among `keys`.
///
/// All keys are tried by exact name before any is tried case-insensitively.
/// Blank values and the literal string `null` are skipped.
pub fn find_name(attributes: &Attributes, keys: &[&str]) -> Option<String> {
    let exact = keys
        .iter()
        .find_map(|key| usable(attributes.get(*key).and_then(Option::as_ref)));
    if exact.is_some() {
        return exact;
    }

    keys.iter().find_map(|key| {
        let key = key.to_lowercase();
        attributes
            .iter()
            .filter(|(k, _)| k.to_lowercase() == key)
            .find_map(|(_, v)| usable(v.as_ref()))
    })
}

/// Name used when no attribute yields one.
pub fn fallback_name(layer_title: &str, object_id: &str) -> String {
    format!("{layer_title} #{object_id}")
}

/// Name of a stop feature.
pub fn stop_name(attributes: &Attributes, layer_title: &str, object_id: &str) -> String {
    find_name(attributes, &STOP_NAME_KEYS).unwrap_or_else(|| fallback_name(layer_title, object_id))
}

/// Name of a line feature.
pub fn line_name(attributes: &Attributes, layer_title: &str, object_id: &str) -> String {
    find_name(attributes, &LINE_NAME_KEYS).unwrap_or_else(|| fallback_name(layer_title, object_id))
}
