//! Document model types.
//!
//! This module defines the input side of normalization: the engine's
//! [`RawDocument`] with its named element collections, the [`Element`]
//! records inside them, and helpers for the reference markers, bounding
//! boxes, table cells, and inline payloads found in element attributes.

mod bbox;
mod document;
mod element;
mod payload;
mod reference;
mod table;

pub use bbox::{BoundingBox, Coords};
pub use document::{element_record, Collection, DocumentInfo, RawDocument};
pub use element::{ContentLayer, Element, ElementKind, FURNITURE_LABELS};
pub use payload::{
    content_hash, content_hash_of_bytes, detect_mime_type, extension_for_mime, parse_data_uri,
    DataUri, InlinePayload, HASH_LEN, MIME_FIELDS, PAYLOAD_FIELDS,
};
pub use reference::{canonical_ref, ReferenceSyntax, UnresolvedReason, REF_PREFIX, UNRESOLVED_KEY};
pub use table::{TableCell, TableGrid, MAX_TABLE_COLUMNS, MAX_TABLE_ROWS};

pub(crate) use reference::push_pointer;
