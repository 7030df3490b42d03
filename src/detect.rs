//! Document-model format detection.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Top-level keys that are never element collections.
pub(crate) const RESERVED_KEYS: &[&str] = &[
    "body",
    "furniture",
    "schema_name",
    "version",
    "name",
    "origin",
    "metadata",
];

/// Document-model format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaInfo {
    /// Schema name declared by the engine (e.g., "DoclingDocument")
    pub name: Option<String>,
    /// Schema version (e.g., "1.0.0")
    pub version: Option<String>,
    /// Names of the element collections found
    pub collections: Vec<String>,
    /// Whether a containment tree is present
    pub has_body: bool,
}

impl std::fmt::Display for SchemaInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.name.as_deref().unwrap_or("document model");
        match &self.version {
            Some(version) => write!(f, "{} {}", name, version),
            None => write!(f, "{}", name),
        }
    }
}

/// Detect the document-model schema of a parsed JSON value.
///
/// # Returns
/// * `Ok(SchemaInfo)` if the value looks like an engine document model
/// * `Err(Error::UnknownFormat)` if it carries neither element collections
///   nor a containment tree
///
/// # Example
/// ```
/// use unfold::detect::detect_schema;
/// use serde_json::json;
///
/// let doc = json!({"schema_name": "DoclingDocument", "texts": [{"self_ref": "#/texts/0"}]});
/// let info = detect_schema(&doc).unwrap();
/// assert_eq!(info.collections, vec!["texts"]);
/// ```
pub fn detect_schema(value: &Value) -> Result<SchemaInfo> {
    let obj = value.as_object().ok_or(Error::UnknownFormat)?;

    let collections: Vec<String> = obj
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .filter(|(key, value)| is_collection(key, value))
        .map(|(key, _)| key.clone())
        .collect();

    let has_body = matches!(obj.get("body"), Some(Value::Object(_)) | Some(Value::Array(_)));

    if collections.is_empty() && !has_body {
        return Err(Error::UnknownFormat);
    }

    let text_field = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

    Ok(SchemaInfo {
        name: text_field("schema_name"),
        version: text_field("version"),
        collections,
        has_body,
    })
}

/// Detect the schema of a JSON string.
pub fn detect_schema_from_str(json: &str) -> Result<SchemaInfo> {
    let value: Value = serde_json::from_str(json)?;
    detect_schema(&value)
}

/// Detect the schema of a JSON file.
///
/// # Example
/// ```no_run
/// use unfold::detect::detect_schema_from_path;
///
/// let info = detect_schema_from_path("report.json").unwrap();
/// println!("Schema: {}", info);
/// ```
pub fn detect_schema_from_path<P: AsRef<Path>>(path: P) -> Result<SchemaInfo> {
    let reader = BufReader::new(File::open(path)?);
    let value: Value = serde_json::from_reader(reader)?;
    detect_schema(&value)
}

/// Check if a file holds a recognizable document model.
pub fn is_document_model<P: AsRef<Path>>(path: P) -> bool {
    detect_schema_from_path(path).is_ok()
}

/// Whether a top-level entry is an element collection.
///
/// Arrays of objects qualify, as does the engine's `pages` map keyed by
/// page number.
pub(crate) fn is_collection(key: &str, value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_object),
        Value::Object(map) if key == "pages" => map.values().all(Value::is_object),
        _ => false,
    }
}
