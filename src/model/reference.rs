//! Reference markers and identifier conventions.
//!
//! Element identifiers are path-like strings such as `#/texts/12`. The same
//! element may be addressed with or without the leading `#/` fragment
//! prefix, so all lookups go through [`canonical_ref`].

use serde_json::Value;

/// Fragment prefix used by path-style identifiers.
pub const REF_PREFIX: &str = "#/";

/// Key added to a marker that could not be substituted.
pub const UNRESOLVED_KEY: &str = "$unresolved";

/// Strip the fragment prefix from an identifier.
///
/// ```
/// use unfold::model::canonical_ref;
///
/// assert_eq!(canonical_ref("#/texts/0"), "texts/0");
/// assert_eq!(canonical_ref("texts/0"), "texts/0");
/// ```
pub fn canonical_ref(id: &str) -> &str {
    id.strip_prefix(REF_PREFIX)
        .or_else(|| id.strip_prefix('#'))
        .unwrap_or(id)
        .trim_start_matches('/')
}

/// Why a marker was left in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// Target id is absent from the element map
    Missing,
    /// Target is already in the active resolution chain
    Cycle,
    /// Resolution stopped at the pass limit before reaching the marker
    PassLimit,
}

impl UnresolvedReason {
    /// Tag value written under [`UNRESOLVED_KEY`].
    pub fn as_str(&self) -> &'static str {
        match self {
            UnresolvedReason::Missing => "missing",
            UnresolvedReason::Cycle => "cycle",
            UnresolvedReason::PassLimit => "pass_limit",
        }
    }
}

/// How reference markers and element identifiers are spelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSyntax {
    /// Keys whose string value marks an object as a pointer
    pub marker_keys: Vec<String>,

    /// Keys holding an element's own identifier, in priority order
    pub id_keys: Vec<String>,
}

impl ReferenceSyntax {
    /// Create the default syntax (`$ref`/`cref` markers, `self_ref`/`id` ids).
    pub fn new() -> Self {
        Self {
            marker_keys: vec!["$ref".to_string(), "cref".to_string()],
            id_keys: vec!["self_ref".to_string(), "id".to_string()],
        }
    }

    /// Replace the marker keys.
    pub fn with_marker_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.marker_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the identifier keys.
    pub fn with_id_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Target of a reference marker, if `value` is one.
    pub fn marker_target<'a>(&self, value: &'a Value) -> Option<&'a str> {
        let obj = value.as_object()?;
        self.marker_keys
            .iter()
            .find_map(|key| obj.get(key).and_then(Value::as_str))
    }

    /// Whether `value` is a marker already tagged as unresolvable.
    pub fn is_tagged(&self, value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|obj| obj.contains_key(UNRESOLVED_KEY))
    }

    /// Identifier of an element record or resolved snapshot.
    pub fn identifier<'a>(&self, value: &'a Value) -> Option<&'a str> {
        let obj = value.as_object()?;
        self.id_keys
            .iter()
            .find_map(|key| obj.get(key).and_then(Value::as_str))
            .filter(|id| !id.is_empty())
    }

    /// Element a value points at, whether it is still a marker or has
    /// already been replaced by a snapshot of its target.
    pub fn reference_target<'a>(&self, value: &'a Value) -> Option<&'a str> {
        match value {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => self
                .marker_target(value)
                .or_else(|| self.identifier(value)),
        }
    }
}

impl Default for ReferenceSyntax {
    fn default() -> Self {
        Self::new()
    }
}

/// Append one segment to a JSON pointer, escaping per RFC 6901.
pub(crate) fn push_pointer(pointer: &str, segment: &str) -> String {
    let escaped = segment.replace('~', "~0").replace('/', "~1");
    format!("{}/{}", pointer, escaped)
}
