//! Content-hash deduplication cache for externalized assets.

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::model::content_hash_of_bytes;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Prefix of the conventional names given to the first assets.
pub const PRIMARY_PREFIX: &str = "picture_";

/// Highest `picture_<n>` index looked for on disk.
pub const PRIMARY_SCAN_LIMIT: usize = 9;

/// Extensions checked when scanning for existing primary files.
const SCAN_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "tiff", "bmp"];

/// Hash to path mapping shared by every payload of one run.
///
/// The cache lives as long as the caller keeps it. Pass one cache per
/// document to keep documents independent, or share one to deduplicate
/// across documents.
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    by_hash: HashMap<String, String>,
    taken: HashSet<String>,
    counter: usize,
}

impl AssetCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `picture_1` … `picture_9` files already present in
    /// `images_dir`, hashing each the same way inline payloads are hashed.
    ///
    /// Returns how many files were registered. A missing directory is not
    /// an error.
    pub fn scan_existing(
        &mut self,
        images_dir: &Path,
        doc_id: &str,
        diagnostics: &mut Diagnostics,
    ) -> usize {
        if !images_dir.is_dir() {
            return 0;
        }

        let mut found = 0;
        for index in 1..=PRIMARY_SCAN_LIMIT {
            let stem = format!("{}{}", PRIMARY_PREFIX, index);
            for ext in SCAN_EXTENSIONS {
                let file_name = format!("{}.{}", stem, ext);
                let path = images_dir.join(&file_name);
                if !path.is_file() {
                    continue;
                }

                match fs::read(&path) {
                    Ok(bytes) => {
                        let hash = content_hash_of_bytes(&bytes);
                        log::info!("Found existing asset {} with hash {}", file_name, hash);
                        self.by_hash
                            .entry(hash)
                            .or_insert_with(|| relative_path(doc_id, &file_name));
                        self.taken.insert(stem.clone());
                        found += 1;
                    }
                    Err(e) => diagnostics.report(
                        DiagnosticCode::AssetScanFailed,
                        None,
                        format!("cannot read {}: {}", path.display(), e),
                    ),
                }
            }
        }
        found
    }

    /// Path recorded for a content hash.
    pub fn lookup(&self, hash: &str) -> Option<&str> {
        self.by_hash.get(hash).map(String::as_str)
    }

    /// Record the path written for a content hash.
    pub fn record(&mut self, hash: impl Into<String>, relative_path: impl Into<String>) {
        self.by_hash.insert(hash.into(), relative_path.into());
    }

    /// Advance and return the asset counter (starts at 1).
    pub fn next_counter(&mut self) -> usize {
        self.counter += 1;
        self.counter
    }

    /// Claim the primary stem `picture_<counter>` if it is free.
    pub fn claim_primary(&mut self, counter: usize) -> Option<String> {
        let stem = format!("{}{}", PRIMARY_PREFIX, counter);
        self.taken.insert(stem.clone()).then_some(stem)
    }

    /// Whether a primary stem is already in use.
    pub fn is_taken(&self, stem: &str) -> bool {
        self.taken.contains(stem)
    }

    /// Number of known hashes.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    /// Whether no hash is known.
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

/// Relative path of an asset file: `<doc_id>/images/<file>`.
pub fn relative_path(doc_id: &str, file_name: &str) -> String {
    format!("{}/images/{}", doc_id, file_name)
}
