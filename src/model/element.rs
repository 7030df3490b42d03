//! Document elements and typed access to their attribute trees.

use super::{BoundingBox, ReferenceSyntax};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Labels that mark repeating page boilerplate when no explicit content
/// layer is present.
pub const FURNITURE_LABELS: &[&str] = &[
    "page_header",
    "page_footer",
    "footnote",
    "page_number",
    "running_header",
    "running_footer",
    "watermark",
    "background",
];

const PICTURE_LABELS: &[&str] = &["picture", "image", "figure", "chart"];
const GROUP_LABELS: &[&str] = &[
    "group",
    "list",
    "ordered_list",
    "unordered_list",
    "inline",
    "key_value_area",
    "form_area",
];

/// Broad category of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A page record
    Page,
    /// Text-bearing element (paragraph, heading, caption, list item)
    Text,
    /// Table
    Table,
    /// Picture or figure
    Picture,
    /// Structural grouping with children only
    Group,
    /// Anything else
    Other,
}

/// Content layer of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentLayer {
    /// Primary document content
    Body,
    /// Repeating boilerplate such as running headers and footers
    Furniture,
}

/// A document element: identifier plus its attribute tree.
///
/// Attributes are kept as raw JSON because element metadata is arbitrarily
/// nested and may carry reference markers at any depth.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Identifier exactly as spelled in the source
    pub id: String,

    /// Collection the element came from (e.g. `texts`)
    pub collection: String,

    /// Attribute tree
    pub attrs: Map<String, Value>,
}

impl Element {
    /// Create a new element.
    pub fn new(
        id: impl Into<String>,
        collection: impl Into<String>,
        attrs: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            collection: collection.into(),
            attrs,
        }
    }

    /// Build an element from a collection entry, reading its identifier
    /// with the given syntax.
    pub fn from_value(value: &Value, collection: &str, syntax: &ReferenceSyntax) -> Option<Self> {
        let id = syntax.identifier(value)?;
        let attrs = value.as_object()?.clone();
        Some(Self::new(id, collection, attrs))
    }

    /// Attribute tree as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.attrs.clone())
    }

    /// Look up a nested attribute by key path.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.attrs.get(*first)?, |value, key| value.get(key))
    }

    fn metadata(&self, key: &str) -> Option<&Value> {
        self.get_path(&["metadata", key])
    }

    /// Lowercased `label` attribute.
    pub fn label(&self) -> Option<String> {
        self.attrs
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_lowercase)
    }

    /// Lowercased type token (`metadata.type`, then `type`).
    pub fn type_token(&self) -> Option<String> {
        self.metadata("type")
            .or_else(|| self.attrs.get("type"))
            .and_then(Value::as_str)
            .map(str::to_lowercase)
    }

    /// Whether the label or type token equals any of `names`.
    pub fn is_labeled(&self, names: &[&str]) -> bool {
        let label = self.label();
        let ty = self.type_token();
        let matched = [label.as_deref(), ty.as_deref()]
            .into_iter()
            .flatten()
            .any(|token| names.contains(&token));
        matched
    }

    /// Trimmed text content (`text`, then `content`, then `value`).
    pub fn text(&self) -> Option<&str> {
        ["text", "content", "value"]
            .iter()
            .filter_map(|key| self.attrs.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    /// Text recognized inside an image, if any.
    pub fn ocr_text(&self) -> Option<&str> {
        self.attrs
            .get("ocr_text")
            .or_else(|| self.metadata("ocr_text"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                (self.kind() == ElementKind::Picture)
                    .then(|| self.text())
                    .flatten()
            })
    }

    /// Broad category from collection name, label, and type.
    pub fn kind(&self) -> ElementKind {
        let label = self.label().unwrap_or_default();
        let ty = self.type_token().unwrap_or_default();
        let is = |name: &str| label == name || ty == name;

        if self.collection == "pages" || is("page") {
            ElementKind::Page
        } else if self.collection == "tables" || is("table") {
            ElementKind::Table
        } else if self.collection == "pictures" || PICTURE_LABELS.iter().any(|l| is(*l)) {
            ElementKind::Picture
        } else if self.collection == "groups" || GROUP_LABELS.iter().any(|l| is(*l)) {
            ElementKind::Group
        } else if self.text().is_some() {
            ElementKind::Text
        } else {
            ElementKind::Other
        }
    }

    /// Page number from provenance, metadata, or the top level.
    pub fn page_no(&self) -> Option<u32> {
        let prov = self.attrs.get("prov").and_then(|prov| match prov {
            Value::Array(items) => items.first(),
            other => Some(other),
        });

        let candidates = [
            prov.and_then(|p| p.get("page_no")),
            prov.and_then(|p| p.get("page")),
            self.metadata("page_no"),
            self.metadata("page"),
            self.attrs.get("page_no"),
            self.attrs.get("page"),
        ];

        candidates.into_iter().flatten().find_map(as_u32)
    }

    /// Bounding box from `bbox`/`bounds`, metadata, or provenance.
    pub fn bbox(&self) -> Option<BoundingBox> {
        let prov_bbox = match self.attrs.get("prov") {
            Some(Value::Array(items)) => items.first().and_then(|p| p.get("bbox")),
            Some(other) => other.get("bbox"),
            None => None,
        };

        [
            self.attrs.get("bbox"),
            self.attrs.get("bounds"),
            self.metadata("bounds"),
            self.metadata("bbox"),
            prov_bbox,
        ]
        .into_iter()
        .flatten()
        .find_map(BoundingBox::from_value)
    }

    /// Explicit content layer, if declared.
    pub fn content_layer(&self) -> Option<ContentLayer> {
        let layer = self
            .attrs
            .get("content_layer")
            .or_else(|| self.attrs.get("layer"))
            .or_else(|| self.metadata("content_layer"))
            .and_then(Value::as_str)?;

        Some(if layer.eq_ignore_ascii_case("furniture") {
            ContentLayer::Furniture
        } else {
            ContentLayer::Body
        })
    }

    /// Whether the element is repeating boilerplate.
    ///
    /// An explicit content layer wins; otherwise furniture labels decide.
    pub fn is_furniture(&self) -> bool {
        match self.content_layer() {
            Some(layer) => layer == ContentLayer::Furniture,
            None => self.is_labeled(FURNITURE_LABELS),
        }
    }

    /// Explicit heading level (`metadata.level`, then `level`).
    ///
    /// Accepts integers and digit strings; anything else is ignored.
    pub fn level_hint(&self) -> Option<u8> {
        self.metadata("level")
            .or_else(|| self.attrs.get("level"))
            .and_then(as_u32)
            .and_then(|n| u8::try_from(n).ok())
    }

    /// Font size from metadata or the top level.
    pub fn font_size(&self) -> Option<f64> {
        self.metadata("font_size")
            .or_else(|| self.attrs.get("font_size"))
            .and_then(|v| match v {
                Value::String(s) => s.trim().parse().ok(),
                other => other.as_f64(),
            })
    }

    /// Whether the font weight is bold.
    pub fn is_bold(&self) -> bool {
        self.metadata("font_weight")
            .or_else(|| self.attrs.get("font_weight"))
            .is_some_and(|v| match v {
                Value::String(s) => s.eq_ignore_ascii_case("bold"),
                Value::Number(n) => n.as_f64().is_some_and(|w| w >= 700.0),
                Value::Bool(b) => *b,
                _ => false,
            })
    }

    /// Texts of resolved caption snapshots.
    pub fn captions(&self) -> Vec<&str> {
        let entries = match self.attrs.get("captions") {
            Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
            Some(single) => vec![single],
            None => self.attrs.get("caption").into_iter().collect(),
        };

        entries
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.as_str()),
                Value::Object(obj) => ["text", "content", "value"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(Value::as_str)),
                _ => None,
            })
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Ordered child entries (markers or resolved snapshots).
    pub fn children(&self) -> &[Value] {
        match self.attrs.get("children") {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Declared parent entry (marker or resolved snapshot).
    pub fn parent(&self) -> Option<&Value> {
        self.attrs.get("parent").filter(|v| !v.is_null())
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attrs.serialize(serializer)
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
