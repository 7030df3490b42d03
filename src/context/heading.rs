//! Heading classification and level inference.
//!
//! An element is a heading when its type token looks like `h1`…`hN`, or when
//! its label or type names a section header. Levels come from the type token,
//! an explicit level attribute, a font heuristic, or default to 1.

use crate::model::Element;
use std::fmt;
use std::sync::Arc;

/// Generic section-header token that triggers the font heuristic.
pub const SECTION_HEADER: &str = "section_header";

/// Exact-match synonyms for a section header.
const HEADER_SYNONYMS: &[&str] = &["header", "heading", "section_title"];

/// Level used when nothing else decides.
pub const DEFAULT_LEVEL: u8 = 1;

/// Scoring function that infers a heading level from presentation hints.
///
/// Implementations are consulted only for generic section headers that carry
/// no explicit level.
pub trait LevelHeuristic: Send + Sync {
    /// Heading level for the element (1 is the outermost).
    fn infer_level(&self, element: &Element) -> u8;
}

/// Font-size and weight heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontHeuristic {
    /// Sizes above this are level 1
    pub primary_size: f64,

    /// Sizes above this are level 2
    pub secondary_size: f64,
}

impl FontHeuristic {
    /// Create the heuristic with its default thresholds (18 and 16 points).
    pub fn new() -> Self {
        Self {
            primary_size: 18.0,
            secondary_size: 16.0,
        }
    }
}

impl Default for FontHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelHeuristic for FontHeuristic {
    fn infer_level(&self, element: &Element) -> u8 {
        let size = element.font_size().unwrap_or(0.0);
        if size > self.primary_size || element.is_bold() {
            1
        } else if size > self.secondary_size {
            2
        } else {
            3
        }
    }
}

/// A heading found in a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading<'a> {
    /// Level, 1 being the outermost
    pub level: u8,

    /// Trimmed heading text
    pub text: &'a str,
}

/// Decides whether an element is a heading, and at which level.
#[derive(Clone)]
pub struct HeadingClassifier {
    heuristic: Arc<dyn LevelHeuristic>,
}

impl HeadingClassifier {
    /// Create a classifier using [`FontHeuristic`].
    pub fn new() -> Self {
        Self {
            heuristic: Arc::new(FontHeuristic::new()),
        }
    }

    /// Replace the level heuristic.
    pub fn with_heuristic(mut self, heuristic: impl LevelHeuristic + 'static) -> Self {
        self.heuristic = Arc::new(heuristic);
        self
    }

    /// Classify an element. Returns `None` for non-headings.
    ///
    /// Headings without text and furniture elements never qualify.
    pub fn classify<'a>(&self, element: &'a Element) -> Option<Heading<'a>> {
        if element.is_furniture() {
            return None;
        }
        let text = element.text()?;
        let level = self.level(element)?;
        Some(Heading { level, text })
    }

    /// Whether the element is a heading.
    pub fn is_heading(&self, element: &Element) -> bool {
        self.classify(element).is_some()
    }

    fn level(&self, element: &Element) -> Option<u8> {
        let ty = element.type_token();
        if let Some(level) = ty.as_deref().and_then(numbered_level) {
            return Some(level);
        }

        let label = element.label();
        let is_header = [label.as_deref(), ty.as_deref()]
            .into_iter()
            .flatten()
            .any(|token| token.contains(SECTION_HEADER) || HEADER_SYNONYMS.contains(&token));
        if !is_header {
            return None;
        }

        if let Some(level) = element.level_hint() {
            return Some(level);
        }
        if ty.as_deref() == Some(SECTION_HEADER) {
            return Some(self.heuristic.infer_level(element));
        }
        Some(DEFAULT_LEVEL)
    }
}

impl Default for HeadingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeadingClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadingClassifier").finish_non_exhaustive()
    }
}

/// Level of an `h<digits>` type token.
fn numbered_level(token: &str) -> Option<u8> {
    let digits = token.strip_prefix('h')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
