//! Context engine options.

use super::breadcrumb::{BreadcrumbScan, BreadcrumbStrategy, DEFAULT_SEPARATOR};
use super::furniture::FurnitureSet;
use super::heading::HeadingClassifier;
use super::window::{ContextWindow, DEFAULT_MAX_CHARS};

/// Options for breadcrumbs and context windows.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Character budget on each side of a context window
    pub max_chars: usize,

    /// Separator between breadcrumb levels
    pub separator: String,

    /// Breadcrumb strategy for whole-document annotation
    pub scan: BreadcrumbScan,

    /// Heading classifier
    pub classifier: HeadingClassifier,
}

impl ContextOptions {
    /// Create new context options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the context budget per side.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Set the breadcrumb separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the breadcrumb strategy.
    pub fn with_scan(mut self, scan: BreadcrumbScan) -> Self {
        self.scan = scan;
        self
    }

    /// Set the heading classifier.
    pub fn with_classifier(mut self, classifier: HeadingClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Breadcrumb strategy configured by these options.
    pub fn strategy(&self) -> Box<dyn BreadcrumbStrategy> {
        self.scan
            .strategy(self.classifier.clone(), self.separator.clone())
    }

    /// Context window configured by these options.
    pub fn window(&self, furniture: FurnitureSet) -> ContextWindow {
        ContextWindow::new(self.max_chars).with_furniture(furniture)
    }
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            separator: DEFAULT_SEPARATOR.to_string(),
            scan: BreadcrumbScan::default(),
            classifier: HeadingClassifier::default(),
        }
    }
}
