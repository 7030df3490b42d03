//! Identifier-addressable element storage.

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::model::{canonical_ref, Element, RawDocument, ReferenceSyntax};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Elements keyed by identifier, in extraction order.
///
/// Lookups accept identifiers with or without the `#/` prefix. Elements
/// live in one arena and refer to each other only by id, so no cyclic
/// object graph exists in memory even when the document's references are
/// cyclic.
#[derive(Debug, Clone, Default)]
pub struct ElementMap {
    elements: Vec<Element>,
    index: HashMap<String, usize>,
    syntax: ReferenceSyntax,
}

impl ElementMap {
    /// Create an empty map.
    pub fn new(syntax: ReferenceSyntax) -> Self {
        Self {
            elements: Vec::new(),
            index: HashMap::new(),
            syntax,
        }
    }

    /// Extract every identified element from every collection.
    ///
    /// Tree roots that carry an identifier are added last so that markers
    /// pointing at them resolve. The first entry for an id wins; later
    /// duplicates are reported and dropped.
    pub fn from_document(
        doc: &RawDocument,
        syntax: &ReferenceSyntax,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut map = Self::new(syntax.clone());

        for collection in &doc.collections {
            for (position, entry) in collection.entries.iter().enumerate() {
                match Element::from_value(entry, &collection.name, syntax) {
                    Some(element) => map.insert_reporting(element, diagnostics),
                    None => log::debug!(
                        "Skipping unidentified entry {} in '{}'",
                        position,
                        collection.name
                    ),
                }
            }
        }

        for (name, node) in doc.tree_roots(syntax) {
            if let Some(element) = Element::from_value(node, name, syntax) {
                map.insert_reporting(element, diagnostics);
            }
        }

        map
    }

    fn insert_reporting(&mut self, element: Element, diagnostics: &mut Diagnostics) {
        let id = element.id.clone();
        if !self.insert(element) {
            diagnostics.report(
                DiagnosticCode::DuplicateElement,
                Some(&id),
                "identifier already present; later entry ignored",
            );
        }
    }

    /// Insert an element. Returns `false` if its id is already present.
    pub fn insert(&mut self, element: Element) -> bool {
        let key = canonical_ref(&element.id).to_string();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.elements.len());
        self.elements.push(element);
        true
    }

    /// Position of an element in extraction order.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(canonical_ref(id)).copied()
    }

    /// Get an element by identifier (prefix-insensitive).
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.index_of(id).map(|i| &self.elements[i])
    }

    /// Get an element by position.
    pub fn get_index(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub(crate) fn get_index_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.elements.get_mut(index)
    }

    /// Whether an identifier is present.
    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    /// Iterate over elements in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Elements belonging to one collection.
    pub fn in_collection<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| e.collection == name)
    }

    /// Reference syntax the map was built with.
    pub fn syntax(&self) -> &ReferenceSyntax {
        &self.syntax
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Rebuild a raw document from the map, so resolved output can be fed
    /// back through the resolver.
    pub fn to_raw_document(&self) -> RawDocument {
        let mut doc = RawDocument::new();
        for element in &self.elements {
            let record = element.to_value();
            match element.collection.as_str() {
                "body" => doc.body = Some(record),
                "furniture" => doc.furniture = Some(record),
                name => match doc.collections.iter_mut().find(|c| c.name == name) {
                    Some(collection) => collection.entries.push(record),
                    None => doc = doc.with_collection(name, vec![record]),
                },
            }
        }
        doc
    }
}

impl Serialize for ElementMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.elements.len()))?;
        for element in &self.elements {
            map.serialize_entry(&element.id, element)?;
        }
        map.end()
    }
}
