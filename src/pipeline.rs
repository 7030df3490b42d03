//! End-to-end normalization of one document, and batches of them.
//!
//! Runs Resolver → Externalizer (optional) → Flattener → position sort
//! (optional) → breadcrumbs → annotations. Nothing here fails on document
//! anomalies; they end up in [`NormalizedDocument::diagnostics`].

use crate::assets::{AssetCache, AssetExternalizer, AssetOptions, AssetReport};
use crate::context::{ContextOptions, FurnitureSet};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::error::Result;
use crate::model::{DocumentInfo, ElementKind, RawDocument, MAX_TABLE_COLUMNS, MAX_TABLE_ROWS};
use crate::output::{to_json, Annotator, ElementAnnotation, JsonFormat, NormalizeStats};
use crate::resolve::{ElementMap, ResolveOptions, Resolver};
use crate::sequence::{flatten, FlattenedSequence};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// File names written by [`NormalizedDocument::write_to`].
pub const ELEMENT_MAP_FILE: &str = "element_map.json";
/// Reading-order sequence file.
pub const SEQUENCE_FILE: &str = "sequence.json";
/// Per-element annotation file.
pub const ANNOTATIONS_FILE: &str = "annotations.json";
/// Diagnostics file.
pub const DIAGNOSTICS_FILE: &str = "diagnostics.json";

/// Options for the whole pipeline.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Reference resolution
    pub resolve: ResolveOptions,

    /// Breadcrumbs and context windows
    pub context: ContextOptions,

    /// Asset externalization (disabled when `None`)
    pub assets: Option<AssetOptions>,

    /// Reorder the sequence by position on the page
    pub sort_by_position: bool,

    /// Build per-element annotations
    pub annotate: bool,
}

impl NormalizeOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set resolve options.
    pub fn with_resolve(mut self, options: ResolveOptions) -> Self {
        self.resolve = options;
        self
    }

    /// Set context options.
    pub fn with_context(mut self, options: ContextOptions) -> Self {
        self.context = options;
        self
    }

    /// Enable asset externalization.
    pub fn with_assets(mut self, options: AssetOptions) -> Self {
        self.assets = Some(options);
        self
    }

    /// Enable or disable position sorting.
    pub fn with_position_sort(mut self, enabled: bool) -> Self {
        self.sort_by_position = enabled;
        self
    }

    /// Enable or disable annotations.
    pub fn with_annotations(mut self, enabled: bool) -> Self {
        self.annotate = enabled;
        self
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            resolve: ResolveOptions::default(),
            context: ContextOptions::default(),
            assets: None,
            sort_by_position: false,
            annotate: true,
        }
    }
}

/// Everything normalization produced for one document.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedDocument {
    /// Document summary
    pub info: DocumentInfo,

    /// Resolved elements by identifier
    pub elements: ElementMap,

    /// Elements in reading order
    pub sequence: FlattenedSequence,

    /// Breadcrumb per sequence position
    pub breadcrumbs: Vec<String>,

    /// Annotation per sequence position (empty if disabled)
    pub annotations: Vec<ElementAnnotation>,

    /// Externalized assets
    pub assets: AssetReport,

    /// Anomalies found along the way
    pub diagnostics: Diagnostics,

    /// Counters
    pub stats: NormalizeStats,
}

impl NormalizedDocument {
    /// Breadcrumb of the first sequence entry with the given id.
    pub fn breadcrumb_of(&self, id: &str) -> Option<&str> {
        let position = self.sequence.position_of(id)?;
        self.breadcrumbs.get(position).map(String::as_str)
    }

    /// Annotation of the first sequence entry with the given id.
    pub fn annotation_of(&self, id: &str) -> Option<&ElementAnnotation> {
        let position = self.sequence.position_of(id)?;
        self.annotations.get(position)
    }

    /// Diagnostics meant for a user-facing summary.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.user_visible()
    }

    /// Serialize the whole result.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        to_json(self, format)
    }

    /// Write the artifacts as separate JSON files into `dir`.
    ///
    /// Returns the paths written.
    pub fn write_to(&self, dir: &Path, format: JsonFormat) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;

        let artifacts = [
            (ELEMENT_MAP_FILE, to_json(&self.elements, format)?),
            (SEQUENCE_FILE, to_json(&self.sequence, format)?),
            (ANNOTATIONS_FILE, to_json(&self.annotations, format)?),
            (DIAGNOSTICS_FILE, to_json(&self.diagnostics, format)?),
        ];

        let mut written = Vec::with_capacity(artifacts.len());
        for (name, json) in artifacts {
            let path = dir.join(name);
            fs::write(&path, json)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Normalize a document with a fresh asset cache.
pub fn normalize(doc: &RawDocument, options: &NormalizeOptions) -> NormalizedDocument {
    let mut cache = AssetCache::new();
    normalize_with_cache(doc, options, &mut cache)
}

/// Normalize a document, deduplicating assets through `cache`.
pub fn normalize_with_cache(
    doc: &RawDocument,
    options: &NormalizeOptions,
    cache: &mut AssetCache,
) -> NormalizedDocument {
    let syntax = &options.resolve.syntax;
    let mut diagnostics = Diagnostics::new();
    let mut stats = NormalizeStats::new();

    let mut elements = ElementMap::from_document(doc, syntax, &mut diagnostics);
    let resolver = Resolver::new(options.resolve.clone());
    let report = resolver.resolve_map(&mut elements, &mut diagnostics);
    stats.record_resolution(&report);

    let assets = match &options.assets {
        Some(asset_options) => {
            let externalizer = AssetExternalizer::new(asset_options.clone());
            externalizer.prepare(cache, &mut diagnostics);
            externalizer.externalize_map(&mut elements, cache, &mut diagnostics)
        }
        None => AssetReport::default(),
    };
    stats.record_assets(&assets);

    let mut sequence = flatten(&elements, doc.body.as_ref(), &mut diagnostics);
    if options.sort_by_position {
        sequence.sort_by_position();
    }

    let breadcrumbs = options.context.strategy().breadcrumbs(&sequence);
    let info = DocumentInfo::from_document(doc, syntax);

    let annotations = if options.annotate {
        Annotator::new(&options.context, FurnitureSet::from_map(&elements))
            .with_title(info.title.clone())
            .annotate(&sequence)
    } else {
        Vec::new()
    };
    for annotation in &annotations {
        let skipped = annotation.table.as_ref().map_or(0, |grid| grid.skipped_cells());
        if skipped > 0 {
            diagnostics.report(
                DiagnosticCode::TableCellOutOfRange,
                Some(&annotation.element_id),
                format!(
                    "{} cells beyond {} rows or {} columns dropped",
                    skipped, MAX_TABLE_ROWS, MAX_TABLE_COLUMNS
                ),
            );
        }
    }

    stats.document_count = 1;
    stats.element_count = elements.len();
    stats.sequence_length = sequence.len();
    stats.page_count = doc.page_count();
    stats.fallback_count = usize::from(sequence.is_fallback());
    for element in sequence.iter() {
        if options.context.classifier.is_heading(element) {
            stats.add_heading();
        }
        match element.kind() {
            ElementKind::Table => stats.add_table(),
            ElementKind::Picture => stats.add_picture(),
            _ => {}
        }
    }
    stats.furniture_count = elements.iter().filter(|e| e.is_furniture()).count();

    log::debug!(
        "Normalized '{}': {} elements, {} in sequence, {} diagnostics",
        info.name.as_deref().unwrap_or("document"),
        stats.element_count,
        stats.sequence_length,
        diagnostics.len()
    );

    NormalizedDocument {
        info,
        elements,
        sequence,
        breadcrumbs,
        annotations,
        assets,
        diagnostics,
        stats,
    }
}

/// Load and normalize a document file.
pub fn normalize_path<P: AsRef<Path>>(
    path: P,
    options: &NormalizeOptions,
) -> Result<NormalizedDocument> {
    let doc = RawDocument::from_path(path)?;
    Ok(normalize(&doc, options))
}

/// Normalize many files in parallel.
///
/// Each document runs in isolation with its own diagnostics and asset
/// cache. When assets are enabled, each document's id is derived from its
/// file name.
pub fn process_batch<P>(
    paths: &[P],
    options: &NormalizeOptions,
) -> Vec<(PathBuf, Result<NormalizedDocument>)>
where
    P: AsRef<Path> + Sync,
{
    paths
        .par_iter()
        .map(|path| {
            let path = path.as_ref();
            let mut options = options.clone();
            if let Some(assets) = options.assets.as_mut() {
                assets.doc_id = doc_id_from_path(path);
            }
            (path.to_path_buf(), normalize_path(path, &options))
        })
        .collect()
}

static UNSAFE_ID_CHARS: OnceLock<Option<Regex>> = OnceLock::new();

fn unsafe_id_chars() -> Option<&'static Regex> {
    UNSAFE_ID_CHARS
        .get_or_init(|| Regex::new(r"[^\w\-]").ok())
        .as_ref()
}

/// Document id derived from a file name: the stem with every character
/// other than letters, digits, `_` and `-` replaced by `_`.
pub fn doc_id_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    match unsafe_id_chars() {
        Some(re) => re.replace_all(&stem, "_").into_owned(),
        None => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RawDocument {
        RawDocument::from_value(json!({
            "schema_name": "DoclingDocument",
            "version": "1.0.0",
            "name": "sample",
            "body": {
                "self_ref": "#/body",
                "children": [
                    {"$ref": "#/texts/0"},
                    {"$ref": "#/texts/1"},
                    {"$ref": "#/tables/0"}
                ]
            },
            "texts": [
                {"self_ref": "#/texts/0", "parent": {"$ref": "#/body"}, "label": "section_header", "level": 1, "text": "Overview"},
                {"self_ref": "#/texts/1", "parent": {"$ref": "#/body"}, "label": "text", "text": "Table 2 lists totals."},
                {"self_ref": "#/texts/2", "label": "page_footer", "content_layer": "furniture", "text": "ACME"}
            ],
            "tables": [
                {"self_ref": "#/tables/0", "parent": {"$ref": "#/body"}, "label": "table",
                 "data": {"table_cells": [
                    {"start_row_offset_idx": 0, "end_row_offset_idx": 1, "start_col_offset_idx": 0, "end_col_offset_idx": 1, "text": "a"}
                 ]}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_normalize_sample() {
        let options = NormalizeOptions::new().with_resolve(ResolveOptions::structural());
        let result = normalize(&sample(), &options);

        assert_eq!(result.sequence.ids(), vec!["#/texts/0", "#/texts/1", "#/tables/0"]);
        assert_eq!(result.breadcrumbs, vec!["", "Overview", "Overview"]);
        assert_eq!(result.stats.heading_count, 1);
        assert_eq!(result.stats.table_count, 1);
        assert_eq!(result.stats.furniture_count, 1);
        assert_eq!(result.stats.fallback_count, 0);
        assert!(result.warnings().next().is_none());

        let table = result.annotation_of("#/tables/0").unwrap();
        assert_eq!(table.caption.as_deref(), Some("Table 2 lists totals."));
        assert_eq!(table.table.as_ref().map(|t| t.row_count()), Some(1));
    }

    #[test]
    fn test_normalize_without_annotations() {
        let options = NormalizeOptions::new().with_annotations(false);
        let result = normalize(&sample(), &options);
        assert!(result.annotations.is_empty());
        assert_eq!(result.breadcrumb_of("texts/1"), Some("Overview"));
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = normalize(&sample(), &NormalizeOptions::default());
        let written = result.write_to(dir.path(), JsonFormat::Compact).unwrap();

        assert_eq!(written.len(), 4);
        for path in written {
            assert!(path.exists());
        }
        let map: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join(ELEMENT_MAP_FILE)).unwrap(),
        )
        .unwrap();
        assert!(map.get("#/texts/0").is_some());
    }

    #[test]
    fn test_doc_id_from_path() {
        assert_eq!(doc_id_from_path(Path::new("/tmp/My Report (v2).json")), "My_Report__v2_");
        assert_eq!(doc_id_from_path(Path::new("plain-name_1.json")), "plain-name_1");
    }
}
