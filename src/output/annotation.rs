//! Per-element metadata handed to renderers.

use crate::context::{
    breadcrumb_with_fallback, BreadcrumbStrategy, ContextOptions, ContextText, ContextWindow,
    FurnitureSet,
};
use crate::model::{BoundingBox, Coords, Element, ElementKind, TableGrid};
use crate::sequence::FlattenedSequence;
use serde::Serialize;

/// How far from a table or picture a caption is looked for.
pub const CAPTION_DISTANCE: usize = 2;

/// Words that mark a short neighbouring text as a caption.
const CAPTION_INDICATORS: &[&str] = &["caption", "figure", "fig", "table", "tbl"];

/// Captions longer than this are taken for body text.
const CAPTION_MAX_CHARS: usize = 200;

/// Location, context, and search text of one element of the sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementAnnotation {
    /// Element identifier
    pub element_id: String,

    /// Position in the reading-order sequence
    pub position: usize,

    /// Broad category
    pub kind: ElementKind,

    /// Lowercased label, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Enclosing headings joined by the separator
    pub breadcrumb: String,

    /// Page number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_no: Option<u32>,

    /// Bounding box
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,

    /// Integer coordinates derived from the bounding box
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coords>,

    /// Caption of a table or picture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Preceding paragraph text
    pub context_before: String,

    /// Following paragraph text
    pub context_after: String,

    /// Text suitable for a search index
    pub search_text: String,

    /// Table content as a row-major grid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableGrid>,
}

/// Builds [`ElementAnnotation`]s for a whole sequence.
pub struct Annotator {
    strategy: Box<dyn BreadcrumbStrategy>,
    window: ContextWindow,
    title: Option<String>,
}

impl Annotator {
    /// Create an annotator from context options and the document's
    /// furniture strings.
    pub fn new(options: &ContextOptions, furniture: FurnitureSet) -> Self {
        Self {
            strategy: options.strategy(),
            window: options.window(furniture),
            title: None,
        }
    }

    /// Use the document title as breadcrumb when no heading encloses an
    /// element.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Annotate every element of the sequence.
    pub fn annotate(&self, sequence: &FlattenedSequence) -> Vec<ElementAnnotation> {
        let breadcrumbs = self.strategy.breadcrumbs(sequence);
        sequence
            .iter()
            .zip(breadcrumbs)
            .enumerate()
            .map(|(position, (element, breadcrumb))| {
                let breadcrumb = match &self.title {
                    Some(title) if breadcrumb.is_empty() => title.clone(),
                    _ => breadcrumb,
                };
                self.build(position, element, breadcrumb, sequence)
            })
            .collect()
    }

    /// Annotate one element, located by identifier.
    pub fn annotate_one(
        &self,
        element: &Element,
        sequence: &FlattenedSequence,
    ) -> Option<ElementAnnotation> {
        let position = sequence.position_of(&element.id)?;
        let breadcrumb = breadcrumb_with_fallback(
            self.strategy.as_ref(),
            Some(element),
            sequence,
            self.title.as_deref(),
        );
        Some(self.build(position, element, breadcrumb, sequence))
    }

    fn build(
        &self,
        position: usize,
        element: &Element,
        breadcrumb: String,
        sequence: &FlattenedSequence,
    ) -> ElementAnnotation {
        let kind = element.kind();
        let bbox = element.bbox();
        let caption = find_caption(position, sequence);
        let ContextText { before, after } = self.window.around_index(position, sequence);
        let table = (kind == ElementKind::Table)
            .then(|| TableGrid::from_element(element))
            .flatten();

        let search_text = match kind {
            ElementKind::Picture => image_search_text(&before, element.ocr_text(), &after),
            _ => caption
                .clone()
                .or_else(|| table.as_ref().map(TableGrid::plain_text))
                .or_else(|| element.text().map(str::to_string))
                .unwrap_or_default(),
        };

        ElementAnnotation {
            element_id: element.id.clone(),
            position,
            kind,
            label: element.label(),
            breadcrumb,
            page_no: element.page_no(),
            bbox,
            coords: bbox.map(|b| b.to_coords()),
            caption,
            context_before: before,
            context_after: after,
            search_text,
            table,
        }
    }
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("window", &self.window)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

/// Search text for a picture: `<before> [Image Text: <ocr>] <after>`.
///
/// Empty parts are left out.
pub fn image_search_text(before: &str, ocr_text: Option<&str>, after: &str) -> String {
    let ocr = ocr_text.map(|text| format!("[Image Text: {}]", text));
    [Some(before.to_string()), ocr, Some(after.to_string())]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Caption of the table or picture at `position`.
///
/// Resolved `captions` win. Otherwise the nearest caption-like text within
/// [`CAPTION_DISTANCE`] positions is used, preceding entries first.
pub fn find_caption(position: usize, sequence: &FlattenedSequence) -> Option<String> {
    let element = sequence.get(position)?;
    let declared = element.captions();
    if !declared.is_empty() {
        return Some(declared.join(" "));
    }

    if !matches!(element.kind(), ElementKind::Table | ElementKind::Picture) {
        return None;
    }

    let start = position.saturating_sub(CAPTION_DISTANCE);
    let end = (position + CAPTION_DISTANCE + 1).min(sequence.len());
    (start..position)
        .chain(position + 1..end)
        .filter_map(|i| sequence.get(i))
        .find(|candidate| is_caption_like(candidate))
        .and_then(Element::text)
        .map(str::to_string)
}

fn is_caption_like(element: &Element) -> bool {
    if element.kind() != ElementKind::Text || element.is_furniture() {
        return false;
    }

    let labeled = [element.label(), element.type_token()]
        .into_iter()
        .flatten()
        .any(|token| token.contains("caption"));
    if labeled {
        return true;
    }

    element.text().is_some_and(|text| {
        let lower = text.to_lowercase();
        lower.chars().count() < CAPTION_MAX_CHARS
            && CAPTION_INDICATORS.iter().any(|word| lower.contains(word))
    })
}
