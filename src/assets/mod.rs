//! Binary asset externalization.
//!
//! Inline base64 payloads are written once per distinct content hash under
//! `<output_dir>/<doc_id>/images/`, and replaced by relative paths. The
//! [`AssetCache`] is passed in explicitly, so documents share deduplication
//! state only when the caller hands them the same cache.

mod cache;
mod externalizer;
mod strip;

pub use cache::{relative_path, AssetCache, PRIMARY_PREFIX, PRIMARY_SCAN_LIMIT};
pub use externalizer::{
    AssetExternalizer, AssetOptions, AssetReport, WrittenAsset, DEFAULT_PRIMARY_NAMES,
};
pub use strip::{strip_in_place, strip_payloads, REMOVED_PLACEHOLDER};
