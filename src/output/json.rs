//! JSON serialization of normalization artifacts.

use crate::error::{Error, Result};
use serde::Serialize;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any artifact (element map, sequence, annotations, a whole
/// normalized document) to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;
    use crate::sequence::FlattenedSequence;
    use serde_json::json;

    fn sequence() -> FlattenedSequence {
        let attrs = json!({"self_ref": "#/texts/0", "text": "Hello"});
        let attrs = attrs.as_object().unwrap().clone();
        FlattenedSequence::new(vec![Element::new("#/texts/0", "texts", attrs)])
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sequence(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"self_ref\""));
        assert!(json.contains("Hello"));
        assert!(json.contains('\n')); // Pretty has newlines
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sequence(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n')); // Compact has no newlines
        assert!(json.starts_with('['));
    }
}
