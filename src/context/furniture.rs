//! Known furniture strings and their removal from text.

use crate::model::Element;
use crate::resolve::ElementMap;

/// Texts of furniture elements (running headers, footers, page numbers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FurnitureSet {
    /// Normalized texts, longest first
    texts: Vec<String>,
}

impl FurnitureSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the texts of every furniture element in the map.
    pub fn from_map(map: &ElementMap) -> Self {
        Self::from_elements(map.iter())
    }

    /// Collect the texts of every furniture element.
    pub fn from_elements<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Self {
        let mut set = Self::new();
        for element in elements {
            if element.is_furniture() {
                if let Some(text) = element.text() {
                    set.insert(text);
                }
            }
        }
        set
    }

    /// Add a furniture text. Blank texts are ignored.
    pub fn insert(&mut self, text: &str) {
        let text = normalize_whitespace(text);
        if text.is_empty() || self.texts.contains(&text) {
            return;
        }
        self.texts.push(text);
        self.texts
            .sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    }

    /// Whether `text` is exactly a furniture string.
    pub fn matches(&self, text: &str) -> bool {
        let text = normalize_whitespace(text);
        self.texts.iter().any(|t| *t == text)
    }

    /// Delete every furniture substring, then normalize whitespace.
    ///
    /// Repeats until no furniture string remains, since a deletion can join
    /// the pieces around it into a new occurrence.
    pub fn clean(&self, text: &str) -> String {
        let mut current = normalize_whitespace(text);
        loop {
            let mut changed = false;
            for furniture in &self.texts {
                if current.contains(furniture.as_str()) {
                    current = current.replace(furniture.as_str(), " ");
                    changed = true;
                }
            }
            current = normalize_whitespace(&current);
            if !changed {
                return current;
            }
        }
    }

    /// Whether any furniture string occurs in `text`.
    pub fn occurs_in(&self, text: &str) -> bool {
        self.texts.iter().any(|t| text.contains(t.as_str()))
    }

    /// Iterate over the known strings.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.texts.iter().map(String::as_str)
    }

    /// Number of known strings.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether no furniture is known.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
