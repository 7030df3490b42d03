//! Removing inline payloads from structures kept for storage.

use crate::model::InlinePayload;
use serde_json::Value;

/// Placeholder written where a payload was removed.
pub const REMOVED_PLACEHOLDER: &str = "[BASE64_DATA_REMOVED]";

/// Copy `value` with every inline payload replaced by
/// [`REMOVED_PLACEHOLDER`].
pub fn strip_payloads(value: &Value) -> Value {
    let mut copy = value.clone();
    strip_in_place(&mut copy);
    copy
}

/// Replace every inline payload in place. Returns how many were removed.
pub fn strip_in_place(value: &mut Value) -> usize {
    match value {
        Value::Object(obj) => {
            let keys: Vec<String> = obj
                .iter()
                .filter(|(key, field)| InlinePayload::detect(key, field, obj).is_some())
                .map(|(key, _)| key.clone())
                .collect();
            let mut removed = keys.len();
            for key in keys {
                obj.insert(key, Value::String(REMOVED_PLACEHOLDER.to_string()));
            }
            for child in obj.values_mut() {
                removed += strip_in_place(child);
            }
            removed
        }
        Value::Array(items) => items.iter_mut().map(strip_in_place).sum(),
        _ => 0,
    }
}
