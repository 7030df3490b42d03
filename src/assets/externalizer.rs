//! Writing inline payloads to files and substituting relative paths.

use super::cache::{relative_path, AssetCache};
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::error::{Error, Result};
use crate::model::InlinePayload;
use crate::resolve::ElementMap;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of assets given conventional `picture_<n>` names.
pub const DEFAULT_PRIMARY_NAMES: usize = 2;

/// Options for asset externalization.
#[derive(Debug, Clone)]
pub struct AssetOptions {
    /// Root output directory
    pub output_dir: PathBuf,

    /// Document identifier used in paths and file names
    pub doc_id: String,

    /// Sibling field that also receives the path (e.g. `external_file`)
    pub link_field: Option<String>,

    /// How many new assets get `picture_<n>` names
    pub primary_names: usize,
}

impl AssetOptions {
    /// Create options for one document.
    pub fn new(output_dir: impl Into<PathBuf>, doc_id: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            doc_id: doc_id.into(),
            link_field: None,
            primary_names: DEFAULT_PRIMARY_NAMES,
        }
    }

    /// Also write the path to a sibling field.
    pub fn with_link_field(mut self, field: impl Into<String>) -> Self {
        self.link_field = Some(field.into());
        self
    }

    /// Set how many assets get conventional names.
    pub fn with_primary_names(mut self, count: usize) -> Self {
        self.primary_names = count;
        self
    }

    /// Directory receiving asset files: `<output_dir>/<doc_id>/images`.
    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join(&self.doc_id).join("images")
    }
}

/// A file written by the externalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenAsset {
    /// Content hash of the encoded payload
    pub hash: String,

    /// Path relative to the output directory
    pub relative_path: String,

    /// Decoded size in bytes
    pub size: usize,
}

/// Outcome of externalizing one structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetReport {
    /// Files written, in discovery order
    pub written: Vec<WrittenAsset>,

    /// Payloads replaced by an already known path
    pub reused: usize,

    /// Payloads left inline after a decode or write failure
    pub failed: usize,
}

impl AssetReport {
    /// Number of payloads replaced by a path.
    pub fn replaced(&self) -> usize {
        self.written.len() + self.reused
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: AssetReport) {
        self.written.extend(other.written);
        self.reused += other.reused;
        self.failed += other.failed;
    }
}

/// Replaces inline payloads with relative file paths.
///
/// A payload whose content hash is already in the [`AssetCache`] reuses the
/// recorded path. Otherwise it is decoded and written under
/// `<output_dir>/<doc_id>/images/`. Payloads that fail to decode or write
/// stay inline and produce a diagnostic.
#[derive(Debug, Clone)]
pub struct AssetExternalizer {
    options: AssetOptions,
}

impl AssetExternalizer {
    /// Create an externalizer.
    pub fn new(options: AssetOptions) -> Self {
        Self { options }
    }

    /// Get the options.
    pub fn options(&self) -> &AssetOptions {
        &self.options
    }

    /// Register primary files already on disk with the cache.
    pub fn prepare(&self, cache: &mut AssetCache, diagnostics: &mut Diagnostics) -> usize {
        cache.scan_existing(&self.options.images_dir(), &self.options.doc_id, diagnostics)
    }

    /// Externalize a copy of `value`, leaving the input untouched.
    pub fn externalize_value(
        &self,
        value: &Value,
        cache: &mut AssetCache,
        diagnostics: &mut Diagnostics,
    ) -> (Value, AssetReport) {
        let mut copy = value.clone();
        let mut report = AssetReport::default();
        self.walk(&mut copy, None, cache, &mut report, diagnostics);
        (copy, report)
    }

    /// Externalize every element of a map in place.
    pub fn externalize_map(
        &self,
        map: &mut ElementMap,
        cache: &mut AssetCache,
        diagnostics: &mut Diagnostics,
    ) -> AssetReport {
        let mut report = AssetReport::default();
        for index in 0..map.len() {
            let Some(element) = map.get_index_mut(index) else {
                continue;
            };
            let owner = element.id.clone();
            let mut tree = Value::Object(std::mem::take(&mut element.attrs));
            self.walk(&mut tree, Some(&owner), cache, &mut report, diagnostics);
            if let Value::Object(attrs) = tree {
                element.attrs = attrs;
            }
        }

        if !report.written.is_empty() || report.reused > 0 {
            log::info!(
                "Externalized {} assets ({} reused) for '{}'",
                report.written.len(),
                report.reused,
                self.options.doc_id
            );
        }
        report
    }

    fn walk(
        &self,
        value: &mut Value,
        owner: Option<&str>,
        cache: &mut AssetCache,
        report: &mut AssetReport,
        diagnostics: &mut Diagnostics,
    ) {
        match value {
            Value::Object(obj) => {
                let mut replaced = Vec::new();
                for (key, field) in obj.iter() {
                    let Some(payload) = InlinePayload::detect(key, field, obj) else {
                        continue;
                    };
                    if let Some(path) = self.store(&payload, owner, cache, report, diagnostics) {
                        replaced.push((key.clone(), path));
                    }
                }

                for (key, path) in replaced {
                    if let Some(link) = &self.options.link_field {
                        obj.insert(link.clone(), Value::String(path.clone()));
                    }
                    obj.insert(key, Value::String(path));
                }

                for child in obj.values_mut() {
                    self.walk(child, owner, cache, report, diagnostics);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item, owner, cache, report, diagnostics);
                }
            }
            _ => {}
        }
    }

    /// Store one payload and return its relative path.
    fn store(
        &self,
        payload: &InlinePayload<'_>,
        owner: Option<&str>,
        cache: &mut AssetCache,
        report: &mut AssetReport,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        let hash = payload.hash();
        if let Some(path) = cache.lookup(&hash) {
            log::debug!("Reusing asset {} for hash {}", path, hash);
            report.reused += 1;
            return Some(path.to_string());
        }

        let bytes = match payload.decode() {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                diagnostics.report(DiagnosticCode::AssetDecodeFailed, owner, "empty payload");
                report.failed += 1;
                return None;
            }
            Err(e) => {
                diagnostics.report(
                    DiagnosticCode::AssetDecodeFailed,
                    owner,
                    format!("invalid base64 payload: {}", e),
                );
                report.failed += 1;
                return None;
            }
        };

        let ext = payload.extension(&bytes);
        let counter = cache.next_counter();
        let primary = if counter <= self.options.primary_names {
            cache.claim_primary(counter)
        } else {
            None
        };
        let file_name = match primary {
            Some(stem) => format!("{}.{}", stem, ext),
            None => format!("{}_img_{}_{}.{}", self.options.doc_id, counter, hash, ext),
        };

        let images_dir = self.options.images_dir();
        if let Err(e) = write_asset(&images_dir, &file_name, &bytes) {
            diagnostics.report(DiagnosticCode::AssetWriteFailed, owner, e.to_string());
            report.failed += 1;
            return None;
        }

        let path = relative_path(&self.options.doc_id, &file_name);
        log::debug!("Saved asset {} ({} bytes)", path, bytes.len());
        cache.record(hash.clone(), path.clone());
        report.written.push(WrittenAsset {
            hash,
            relative_path: path.clone(),
            size: bytes.len(),
        });
        Some(path)
    }
}

fn write_asset(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<()> {
    let path = dir.join(file_name);
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, bytes))
        .map_err(|e| Error::Asset(format!("cannot write {}: {}", path.display(), e)))
}
