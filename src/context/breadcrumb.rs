//! Breadcrumbs: the chain of enclosing heading texts for an element.
//!
//! Two strategies produce the same result on well-formed input:
//!
//! - [`BackwardScan`] answers a single query by walking backward from the
//!   element to the start of the sequence.
//! - [`ForwardPass`] computes every breadcrumb in one pass over the sequence.
//!
//! Both treat a heading as an ancestor only when no heading between it and
//! the element is at the same or a shallower level. An element never counts
//! as its own ancestor.

use super::heading::{Heading, HeadingClassifier};
use crate::model::Element;
use crate::sequence::FlattenedSequence;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default separator between breadcrumb levels.
pub const DEFAULT_SEPARATOR: &str = " > ";

/// Which breadcrumb strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbScan {
    /// Single forward pass, suited to whole-document annotation
    #[default]
    Forward,
    /// Backward scan per element
    Backward,
}

impl BreadcrumbScan {
    /// Build the strategy.
    pub fn strategy(
        self,
        classifier: HeadingClassifier,
        separator: impl Into<String>,
    ) -> Box<dyn BreadcrumbStrategy> {
        match self {
            BreadcrumbScan::Forward => Box::new(
                ForwardPass::new()
                    .with_classifier(classifier)
                    .with_separator(separator),
            ),
            BreadcrumbScan::Backward => Box::new(
                BackwardScan::new()
                    .with_classifier(classifier)
                    .with_separator(separator),
            ),
        }
    }
}

impl std::str::FromStr for BreadcrumbScan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forward" => Ok(BreadcrumbScan::Forward),
            "backward" => Ok(BreadcrumbScan::Backward),
            other => Err(format!("unknown breadcrumb scan: {}", other)),
        }
    }
}

/// Computes breadcrumbs over a flattened sequence.
pub trait BreadcrumbStrategy: Send + Sync {
    /// Breadcrumb of the element at `index`. Empty when out of range.
    fn breadcrumb_at(&self, index: usize, sequence: &FlattenedSequence) -> String;

    /// Breadcrumb of an element located by identifier.
    ///
    /// Empty when the element is `None`, absent from the sequence, or the
    /// sequence is empty.
    fn breadcrumb(&self, element: Option<&Element>, sequence: &FlattenedSequence) -> String {
        element
            .and_then(|e| sequence.position_of(&e.id))
            .map(|index| self.breadcrumb_at(index, sequence))
            .unwrap_or_default()
    }

    /// Breadcrumbs for every position of the sequence.
    fn breadcrumbs(&self, sequence: &FlattenedSequence) -> Vec<String> {
        (0..sequence.len())
            .map(|index| self.breadcrumb_at(index, sequence))
            .collect()
    }
}

/// Recorded heading texts by level.
#[derive(Debug, Default)]
struct Trail<'a> {
    levels: BTreeMap<u8, &'a str>,
}

impl<'a> Trail<'a> {
    /// Enter a heading in document order: it replaces its own level and
    /// closes every deeper one.
    fn enter(&mut self, heading: Heading<'a>) {
        self.levels.retain(|level, _| *level < heading.level);
        self.levels.insert(heading.level, heading.text);
    }

    /// Record a heading met while scanning backward. Accepted only when
    /// shallower than everything recorded so far.
    fn record_backward(&mut self, heading: Heading<'a>) {
        let shallower = self
            .levels
            .keys()
            .next()
            .map_or(true, |min| heading.level < *min);
        if shallower {
            self.levels.insert(heading.level, heading.text);
        }
    }

    fn join(&self, separator: &str) -> String {
        self.levels
            .values()
            .copied()
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Per-element backward scan.
#[derive(Debug, Clone)]
pub struct BackwardScan {
    classifier: HeadingClassifier,
    separator: String,
}

impl BackwardScan {
    /// Create a backward scan with the default classifier and separator.
    pub fn new() -> Self {
        Self {
            classifier: HeadingClassifier::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Set the heading classifier.
    pub fn with_classifier(mut self, classifier: HeadingClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the level separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl Default for BackwardScan {
    fn default() -> Self {
        Self::new()
    }
}

impl BreadcrumbStrategy for BackwardScan {
    fn breadcrumb_at(&self, index: usize, sequence: &FlattenedSequence) -> String {
        let elements = sequence.elements();
        if index >= elements.len() {
            return String::new();
        }

        let mut trail = Trail::default();
        for element in elements[..index].iter().rev() {
            if let Some(heading) = self.classifier.classify(element) {
                trail.record_backward(heading);
            }
        }
        trail.join(&self.separator)
    }
}

/// Whole-document forward pass.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    classifier: HeadingClassifier,
    separator: String,
}

impl ForwardPass {
    /// Create a forward pass with the default classifier and separator.
    pub fn new() -> Self {
        Self {
            classifier: HeadingClassifier::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Set the heading classifier.
    pub fn with_classifier(mut self, classifier: HeadingClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the level separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Headings in document order as (position, heading).
    pub fn headings<'a>(&self, sequence: &'a FlattenedSequence) -> Vec<(usize, Heading<'a>)> {
        sequence
            .iter()
            .enumerate()
            .filter_map(|(i, e)| self.classifier.classify(e).map(|h| (i, h)))
            .collect()
    }
}

impl Default for ForwardPass {
    fn default() -> Self {
        Self::new()
    }
}

impl BreadcrumbStrategy for ForwardPass {
    fn breadcrumb_at(&self, index: usize, sequence: &FlattenedSequence) -> String {
        if index >= sequence.len() {
            return String::new();
        }

        let mut trail = Trail::default();
        for (_, heading) in self
            .headings(sequence)
            .into_iter()
            .take_while(|(position, _)| *position < index)
        {
            trail.enter(heading);
        }
        trail.join(&self.separator)
    }

    fn breadcrumbs(&self, sequence: &FlattenedSequence) -> Vec<String> {
        let mut trail = Trail::default();
        let mut current = String::new();
        let mut result = Vec::with_capacity(sequence.len());

        for element in sequence.iter() {
            result.push(current.clone());
            if let Some(heading) = self.classifier.classify(element) {
                trail.enter(heading);
                current = trail.join(&self.separator);
            }
        }
        result
    }
}

/// Breadcrumb, or the document title when no heading encloses the element.
pub fn breadcrumb_with_fallback(
    strategy: &dyn BreadcrumbStrategy,
    element: Option<&Element>,
    sequence: &FlattenedSequence,
    title: Option<&str>,
) -> String {
    let crumb = strategy.breadcrumb(element, sequence);
    match title {
        Some(title) if crumb.is_empty() && element.is_some() => title.trim().to_string(),
        _ => crumb,
    }
}
