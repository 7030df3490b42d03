//! # unfold
//!
//! Normalization of document-understanding engine output for Rust.
//!
//! The engine describes a parsed file as a graph of typed elements (headings,
//! paragraphs, tables, pictures) connected by internal references. This
//! library turns that graph into artifacts that renderers can consume
//! directly: a resolved element map, one reading-order sequence, and
//! per-element breadcrumbs and text context.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unfold::{normalize_file, NormalizeOptions};
//!
//! fn main() -> unfold::Result<()> {
//!     let result = normalize_file("document.json", &NormalizeOptions::default())?;
//!
//!     for (element, crumb) in result.sequence.iter().zip(&result.breadcrumbs) {
//!         println!("{} [{}]", element.id, crumb);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Reference resolution**: fixed-point substitution that survives
//!   missing targets and cycles
//! - **Reading order**: depth-first flattening with a page-grouped fallback
//! - **Breadcrumbs**: backward-scan and forward-pass heading tracking
//! - **Context windows**: bounded neighbouring text with furniture removed
//! - **Asset externalization**: inline base64 images written once per hash
//! - **Parallel batches**: uses Rayon across independent documents

pub mod assets;
pub mod context;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod sequence;

// Re-export commonly used types
pub use assets::{strip_payloads, AssetCache, AssetExternalizer, AssetOptions, AssetReport};
pub use context::{
    breadcrumb, breadcrumbs, context_window, BackwardScan, BreadcrumbScan, BreadcrumbStrategy,
    ContextOptions, ContextWindow, ForwardPass, HeadingClassifier, LevelHeuristic,
};
pub use detect::{detect_schema, detect_schema_from_path, is_document_model, SchemaInfo};
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use error::{Error, Result};
pub use model::{
    BoundingBox, ContentLayer, DocumentInfo, Element, ElementKind, RawDocument, ReferenceSyntax,
    TableGrid,
};
pub use output::{ElementAnnotation, JsonFormat, NormalizeStats};
pub use pipeline::{
    doc_id_from_path, normalize, normalize_with_cache, process_batch, NormalizeOptions,
    NormalizedDocument,
};
pub use resolve::{ElementMap, Resolution, ResolveOptions, ResolveReport, Resolver};
pub use sequence::{flatten, FlattenedSequence};

use resolve::TREE_EDGE_KEYS;
use std::path::Path;

/// Load a document model file and normalize it.
///
/// # Arguments
///
/// * `path` - Path to the engine's JSON output
/// * `options` - Pipeline options
///
/// # Example
///
/// ```no_run
/// use unfold::{normalize_file, NormalizeOptions};
///
/// let result = normalize_file("document.json", &NormalizeOptions::default()).unwrap();
/// println!("Elements: {}", result.elements.len());
/// ```
pub fn normalize_file<P: AsRef<Path>>(
    path: P,
    options: &NormalizeOptions,
) -> Result<NormalizedDocument> {
    pipeline::normalize_path(path, options)
}

/// Normalize a document model given as a JSON string.
///
/// # Example
///
/// ```
/// use unfold::{normalize_str, NormalizeOptions};
///
/// let json = r##"{
///     "body": {"children": [{"$ref": "#/texts/0"}]},
///     "texts": [{"self_ref": "#/texts/0", "text": "Hello"}]
/// }"##;
/// let result = normalize_str(json, &NormalizeOptions::default()).unwrap();
/// assert_eq!(result.sequence.len(), 1);
/// ```
pub fn normalize_str(json: &str, options: &NormalizeOptions) -> Result<NormalizedDocument> {
    let doc = RawDocument::from_json_str(json)?;
    Ok(normalize(&doc, options))
}

/// Load a document model file and resolve its references only.
///
/// # Example
///
/// ```no_run
/// use unfold::{resolve_file, ResolveOptions};
///
/// let resolution = resolve_file("document.json", &ResolveOptions::structural()).unwrap();
/// println!("Substitutions: {}", resolution.report.substitutions);
/// ```
pub fn resolve_file<P: AsRef<Path>>(path: P, options: &ResolveOptions) -> Result<Resolution> {
    let doc = RawDocument::from_path(path)?;
    Ok(Resolver::new(options.clone()).resolve(&doc))
}

/// Builder for normalizing documents.
///
/// # Example
///
/// ```no_run
/// use unfold::Unfold;
///
/// let json = Unfold::new()
///     .structural()
///     .with_context_chars(200)
///     .with_assets("./out", "manual")
///     .normalize("document.json")?
///     .to_json(unfold::JsonFormat::Pretty)?;
/// # Ok::<(), unfold::Error>(())
/// ```
pub struct Unfold {
    options: NormalizeOptions,
}

impl Unfold {
    /// Create a new Unfold builder.
    pub fn new() -> Self {
        Self {
            options: NormalizeOptions::default(),
        }
    }

    /// Keep `parent` and `children` edges as markers (the default).
    pub fn structural(mut self) -> Self {
        self.options.resolve = self
            .options
            .resolve
            .with_preserved_keys(TREE_EDGE_KEYS.iter().copied());
        self
    }

    /// Substitute `parent` and `children` edges too.
    pub fn full_resolution(mut self) -> Self {
        self.options.resolve = self.options.resolve.with_preserved_keys(Vec::<String>::new());
        self
    }

    /// Set the resolution pass limit.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.options.resolve = self.options.resolve.with_max_passes(passes);
        self
    }

    /// Set the context budget per side.
    pub fn with_context_chars(mut self, max_chars: usize) -> Self {
        self.options.context = self.options.context.with_max_chars(max_chars);
        self
    }

    /// Set the breadcrumb strategy.
    pub fn with_scan(mut self, scan: BreadcrumbScan) -> Self {
        self.options.context = self.options.context.with_scan(scan);
        self
    }

    /// Set the breadcrumb separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.options.context = self.options.context.with_separator(separator);
        self
    }

    /// Externalize inline images under `<output_dir>/<doc_id>/images/`.
    pub fn with_assets(mut self, output_dir: impl Into<std::path::PathBuf>, doc_id: &str) -> Self {
        self.options.assets = Some(AssetOptions::new(output_dir, doc_id));
        self
    }

    /// Also write asset paths to a sibling field of each payload.
    ///
    /// Has no effect unless assets are enabled first.
    pub fn with_link_field(mut self, field: impl Into<String>) -> Self {
        if let Some(assets) = self.options.assets.take() {
            self.options.assets = Some(assets.with_link_field(field));
        }
        self
    }

    /// Sort the sequence by position on the page.
    pub fn sorted_by_position(mut self) -> Self {
        self.options.sort_by_position = true;
        self
    }

    /// Skip per-element annotations.
    pub fn without_annotations(mut self) -> Self {
        self.options.annotate = false;
        self
    }

    /// Get the options built so far.
    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Load and normalize a file.
    pub fn normalize<P: AsRef<Path>>(self, path: P) -> Result<UnfoldResult> {
        let doc = RawDocument::from_path(path)?;
        Ok(self.normalize_document(&doc))
    }

    /// Normalize a document model given as a JSON string.
    pub fn normalize_str(self, json: &str) -> Result<UnfoldResult> {
        let doc = RawDocument::from_json_str(json)?;
        Ok(self.normalize_document(&doc))
    }

    /// Normalize an already loaded document.
    pub fn normalize_document(self, doc: &RawDocument) -> UnfoldResult {
        UnfoldResult {
            document: normalize(doc, &self.options),
        }
    }
}

impl Default for Unfold {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of normalizing a document.
pub struct UnfoldResult {
    /// The normalized document
    pub document: NormalizedDocument,
}

impl UnfoldResult {
    /// Convert the whole result to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        self.document.to_json(format)
    }

    /// Convert the element map to JSON.
    pub fn element_map_json(&self, format: JsonFormat) -> Result<String> {
        output::to_json(&self.document.elements, format)
    }

    /// Convert the reading-order sequence to JSON.
    pub fn sequence_json(&self, format: JsonFormat) -> Result<String> {
        output::to_json(&self.document.sequence, format)
    }

    /// Breadcrumb per sequence position.
    pub fn breadcrumbs(&self) -> &[String] {
        &self.document.breadcrumbs
    }

    /// Get the normalized document.
    pub fn document(&self) -> &NormalizedDocument {
        &self.document
    }
}
