//! Hierarchical context: breadcrumbs and text windows.
//!
//! Works on a [`FlattenedSequence`]. Headings are recognized by
//! [`HeadingClassifier`], whose level inference can be swapped through
//! [`LevelHeuristic`]. Breadcrumbs come from either [`BackwardScan`] or
//! [`ForwardPass`]; context windows come from [`ContextWindow`].

mod breadcrumb;
mod furniture;
mod heading;
mod options;
mod window;

pub use breadcrumb::{
    breadcrumb_with_fallback, BackwardScan, BreadcrumbScan, BreadcrumbStrategy, ForwardPass,
    DEFAULT_SEPARATOR,
};
pub use furniture::{normalize_whitespace, FurnitureSet};
pub use heading::{
    FontHeuristic, Heading, HeadingClassifier, LevelHeuristic, DEFAULT_LEVEL, SECTION_HEADER,
};
pub use options::ContextOptions;
pub use window::{ContextText, ContextWindow, DEFAULT_MAX_CHARS};

use crate::model::Element;
use crate::sequence::FlattenedSequence;

/// Breadcrumb of one element, by backward scan with default settings.
pub fn breadcrumb(element: Option<&Element>, sequence: &FlattenedSequence) -> String {
    BackwardScan::new().breadcrumb(element, sequence)
}

/// Breadcrumbs of every element, by forward pass with default settings.
pub fn breadcrumbs(sequence: &FlattenedSequence) -> Vec<String> {
    ForwardPass::new().breadcrumbs(sequence)
}

/// Context before and after an element, with furniture taken from the
/// sequence itself.
pub fn context_window(
    element: &Element,
    sequence: &FlattenedSequence,
    max_chars: usize,
) -> (String, String) {
    ContextWindow::new(max_chars)
        .with_furniture(FurnitureSet::from_elements(sequence.iter()))
        .around(element, sequence)
        .into()
}
