//! Document-level types.

use super::{canonical_ref, Element, ReferenceSyntax};
use crate::detect::detect_schema;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Tree roots that may carry their own identifier.
const TREE_ROOTS: &[&str] = &["body", "furniture"];

/// A named collection of element records.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Collection name (e.g. `texts`, `pictures`)
    pub name: String,

    /// Raw element records in source order
    pub entries: Vec<Value>,
}

/// The engine's output for one input file.
///
/// A `RawDocument` is immutable input to the normalization pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Document name as declared by the engine
    pub name: Option<String>,

    /// Schema name (e.g., "DoclingDocument")
    pub schema: Option<String>,

    /// Schema version
    pub version: Option<String>,

    /// Element collections in source order
    pub collections: Vec<Collection>,

    /// Containment tree listing top-level children by reference
    pub body: Option<Value>,

    /// Separate tree for page furniture, when the engine emits one
    pub furniture: Option<Value>,
}

impl RawDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            name: None,
            schema: None,
            version: None,
            collections: Vec::new(),
            body: None,
            furniture: None,
        }
    }

    /// Set the document name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a collection.
    pub fn with_collection(mut self, name: impl Into<String>, entries: Vec<Value>) -> Self {
        self.collections.push(Collection {
            name: name.into(),
            entries,
        });
        self
    }

    /// Set the containment tree.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Build a document from a parsed engine JSON value.
    ///
    /// Every top-level array of objects becomes a collection. A `pages`
    /// object keyed by page number becomes the `pages` collection, with
    /// `#/pages/<n>` identifiers synthesized where missing.
    pub fn from_value(value: Value) -> Result<Self> {
        let info = detect_schema(&value)?;
        let Value::Object(mut obj) = value else {
            return Err(Error::UnknownFormat);
        };

        let mut doc = Self {
            name: obj.get("name").and_then(Value::as_str).map(str::to_string),
            schema: info.name,
            version: info.version,
            collections: Vec::new(),
            body: None,
            furniture: None,
        };

        for name in info.collections {
            let Some(raw) = obj.remove(&name) else {
                continue;
            };
            let entries = if name == "pages" {
                page_entries(raw)
            } else {
                match raw {
                    Value::Array(items) => items,
                    _ => continue,
                }
            };
            doc.collections.push(Collection { name, entries });
        }

        doc.body = obj.remove("body").filter(is_tree);
        doc.furniture = obj.remove("furniture").filter(is_tree);

        Ok(doc)
    }

    /// Parse a document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Parse a document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_value(serde_json::from_reader(reader)?)
    }

    /// Parse a document from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut doc = Self::from_reader(BufReader::new(file))?;
        if doc.name.is_none() {
            doc.name = path
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned());
        }
        Ok(doc)
    }

    /// Get a collection by name.
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Total number of collection entries.
    pub fn entry_count(&self) -> usize {
        self.collections.iter().map(|c| c.entries.len()).sum()
    }

    /// Number of page records.
    pub fn page_count(&self) -> usize {
        self.collection("pages").map_or(0, |c| c.entries.len())
    }

    /// Tree roots that carry an identifier, as `(collection, node)` pairs.
    ///
    /// These are addressable like elements so that `parent` markers
    /// pointing at `#/body` resolve.
    pub fn tree_roots<'a>(
        &'a self,
        syntax: &'a ReferenceSyntax,
    ) -> impl Iterator<Item = (&'static str, &'a Value)> + 'a {
        TREE_ROOTS
            .iter()
            .zip([self.body.as_ref(), self.furniture.as_ref()])
            .filter_map(move |(name, node)| {
                let node = node?;
                syntax.identifier(node).map(|_| (*name, node))
            })
    }

    /// Whether `id` names one of the tree roots.
    pub fn is_tree_root(&self, id: &str, syntax: &ReferenceSyntax) -> bool {
        let id = canonical_ref(id);
        self.tree_roots(syntax)
            .filter_map(|(_, node)| syntax.identifier(node))
            .any(|root| canonical_ref(root) == id)
    }

    /// Document title: the first `title`-labeled text, else the name.
    pub fn title(&self, syntax: &ReferenceSyntax) -> Option<String> {
        self.collections
            .iter()
            .flat_map(|c| c.entries.iter().map(move |e| (c.name.as_str(), e)))
            .filter_map(|(name, entry)| Element::from_value(entry, name, syntax))
            .find(|el| el.is_labeled(&["title"]))
            .and_then(|el| el.text().map(str::to_string))
            .or_else(|| self.name.clone())
    }
}

impl Default for RawDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary information about a processed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Document name
    pub name: Option<String>,

    /// Document title, if one could be found
    pub title: Option<String>,

    /// Schema name and version (e.g., "DoclingDocument 1.0.0")
    pub schema: Option<String>,

    /// Number of page records
    pub page_count: usize,

    /// Number of collection entries
    pub entry_count: usize,

    /// When normalization ran
    pub processed_at: DateTime<Utc>,
}

impl DocumentInfo {
    /// Collect info from a raw document.
    pub fn from_document(doc: &RawDocument, syntax: &ReferenceSyntax) -> Self {
        let schema = match (&doc.schema, &doc.version) {
            (Some(name), Some(version)) => Some(format!("{} {}", name, version)),
            (Some(name), None) => Some(name.clone()),
            _ => None,
        };

        Self {
            name: doc.name.clone(),
            title: doc.title(syntax),
            schema,
            page_count: doc.page_count(),
            entry_count: doc.entry_count(),
            processed_at: Utc::now(),
        }
    }
}

fn is_tree(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Flatten the engine's page map (or array) into identified records.
fn page_entries(raw: Value) -> Vec<Value> {
    let keyed: Vec<(Option<String>, Value)> = match raw {
        Value::Object(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
        Value::Array(items) => items.into_iter().map(|v| (None, v)).collect(),
        _ => return Vec::new(),
    };

    keyed
        .into_iter()
        .enumerate()
        .filter_map(|(index, (key, value))| {
            let Value::Object(mut page) = value else {
                return None;
            };
            let page_no = page
                .get("page_no")
                .and_then(Value::as_u64)
                .or_else(|| key.as_deref().and_then(|k| k.parse().ok()))
                .unwrap_or(index as u64 + 1);

            page.entry("page_no").or_insert(Value::from(page_no));
            if !page.contains_key("self_ref") && !page.contains_key("id") {
                page.insert(
                    "self_ref".to_string(),
                    Value::String(format!("#/pages/{}", page_no)),
                );
            }
            Some(Value::Object(page))
        })
        .collect()
}

/// Build an element record from loose attributes; used by tests and tools
/// that synthesize documents.
pub fn element_record(id: &str, attrs: Value) -> Value {
    let mut record = Map::new();
    record.insert("self_ref".to_string(), Value::String(id.to_string()));
    if let Value::Object(extra) = attrs {
        record.extend(extra);
    }
    Value::Object(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_collections_in_order() {
        let doc = RawDocument::from_value(json!({
            "schema_name": "DoclingDocument",
            "name": "report",
            "texts": [{"self_ref": "#/texts/0", "text": "a"}],
            "pictures": [{"self_ref": "#/pictures/0"}],
            "body": {"self_ref": "#/body", "children": [{"$ref": "#/texts/0"}]}
        }))
        .unwrap();

        let names: Vec<_> = doc.collections.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["texts", "pictures"]);
        assert_eq!(doc.name.as_deref(), Some("report"));
        assert!(doc.body.is_some());
        assert_eq!(doc.entry_count(), 2);
    }

    #[test]
    fn test_page_map_gets_identifiers() {
        let doc = RawDocument::from_value(json!({
            "pages": {"1": {"size": {"width": 10}}, "2": {"page_no": 2}},
            "texts": [{"self_ref": "#/texts/0"}]
        }))
        .unwrap();

        let pages = doc.collection("pages").unwrap();
        assert_eq!(pages.entries.len(), 2);
        assert_eq!(pages.entries[0]["self_ref"], "#/pages/1");
        assert_eq!(pages.entries[0]["page_no"], 1);
        assert_eq!(pages.entries[1]["self_ref"], "#/pages/2");
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_scalar_body_is_dropped() {
        let doc = RawDocument::from_value(json!({
            "texts": [{"self_ref": "#/texts/0"}],
            "body": 42
        }))
        .unwrap();
        assert!(doc.body.is_none());
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            RawDocument::from_value(json!({"hello": "world"})),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_tree_roots() {
        let syntax = ReferenceSyntax::default();
        let doc = RawDocument::new()
            .with_collection("texts", vec![json!({"self_ref": "#/texts/0"})])
            .with_body(json!({"self_ref": "#/body", "children": []}));

        let roots: Vec<_> = doc.tree_roots(&syntax).map(|(name, _)| name).collect();
        assert_eq!(roots, vec!["body"]);
        assert!(doc.is_tree_root("body", &syntax));
        assert!(!doc.is_tree_root("#/texts/0", &syntax));
    }

    #[test]
    fn test_title_prefers_title_label() {
        let syntax = ReferenceSyntax::default();
        let doc = RawDocument::new().with_name("file").with_collection(
            "texts",
            vec![
                json!({"self_ref": "#/texts/0", "label": "text", "text": "Body"}),
                json!({"self_ref": "#/texts/1", "label": "title", "text": "Annual Report"}),
            ],
        );
        assert_eq!(doc.title(&syntax).as_deref(), Some("Annual Report"));

        let untitled = RawDocument::new().with_name("file");
        assert_eq!(untitled.title(&syntax).as_deref(), Some("file"));
    }

    #[test]
    fn test_element_record() {
        let record = element_record("#/texts/0", json!({"text": "Hi"}));
        assert_eq!(record, json!({"self_ref": "#/texts/0", "text": "Hi"}));
    }
}
