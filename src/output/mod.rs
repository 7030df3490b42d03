//! Artifacts handed to formatting collaborators.
//!
//! - [`annotation`] builds per-element breadcrumb, context, and search text
//! - [`stats`] counts what normalization did
//! - [`json`] serializes any artifact

pub mod annotation;
mod json;
mod stats;

pub use annotation::{find_caption, image_search_text, Annotator, ElementAnnotation};
pub use json::{to_json, JsonFormat};
pub use stats::NormalizeStats;
