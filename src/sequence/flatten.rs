//! Reading-order flattening of the containment tree.

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::model::{canonical_ref, Element, ElementKind, ReferenceSyntax};
use crate::resolve::ElementMap;
use serde::Serialize;
use serde_json::Value;

/// Collections that hold tree roots rather than content.
const ROOT_COLLECTIONS: &[&str] = &["body", "furniture"];

/// Elements in reading order.
///
/// The same element may appear more than once if the tree visits it twice;
/// order reflects reading, not uniqueness.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlattenedSequence {
    elements: Vec<Element>,

    #[serde(skip)]
    fallback: bool,
}

impl FlattenedSequence {
    /// Create a sequence from elements already in order.
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            fallback: false,
        }
    }

    /// Get the elements.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Iterate over elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Get an element by position.
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Position of the first element with the given id (prefix-insensitive).
    pub fn position_of(&self, id: &str) -> Option<usize> {
        let id = canonical_ref(id);
        self.elements
            .iter()
            .position(|e| canonical_ref(&e.id) == id)
    }

    /// Identifiers in order.
    pub fn ids(&self) -> Vec<&str> {
        self.elements.iter().map(|e| e.id.as_str()).collect()
    }

    /// Whether the page-grouped fallback produced this sequence.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Reorder by position on the page.
    pub fn sort_by_position(&mut self) {
        super::sort_by_position(&mut self.elements);
    }

    /// Consume into the element list.
    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }
}

/// One level of the depth-first walk.
struct Frame<'a> {
    children: &'a [Value],
    next: usize,
    owner: Option<String>,
}

/// Flatten a containment tree over a resolved map.
///
/// `tree` may be an object with ordered `children` (or `elements`), or a
/// bare array of child references. Children that cannot be found are
/// skipped with a diagnostic. A child that is one of its own ancestors is
/// skipped as well, so a cyclic tree still terminates.
///
/// When the tree is absent or yields nothing, falls back to
/// [`page_fallback`].
pub fn flatten(
    map: &ElementMap,
    tree: Option<&Value>,
    diagnostics: &mut Diagnostics,
) -> FlattenedSequence {
    let elements = match tree {
        Some(tree) => walk_tree(map, tree, diagnostics),
        None => Vec::new(),
    };

    if !elements.is_empty() {
        return FlattenedSequence::new(elements);
    }

    diagnostics.report(
        DiagnosticCode::EmptyTree,
        None,
        "containment tree absent or empty; grouping by page",
    );
    page_fallback(map)
}

fn walk_tree(map: &ElementMap, tree: &Value, diagnostics: &mut Diagnostics) -> Vec<Element> {
    let syntax = map.syntax();
    let root_children = tree_children(tree);
    let root_id = syntax
        .identifier(tree)
        .map(|id| canonical_ref(id).to_string());

    let mut output = Vec::new();
    let mut stack = vec![Frame {
        children: root_children,
        next: 0,
        owner: root_id,
    }];

    while let Some(frame) = stack.last_mut() {
        let children = frame.children;
        let Some(child) = children.get(frame.next) else {
            stack.pop();
            continue;
        };
        let position = frame.next;
        frame.next += 1;
        let parent = frame.owner.clone();

        let Some(target) = syntax.reference_target(child) else {
            diagnostics.report(
                DiagnosticCode::MissingChild,
                parent.as_deref(),
                format!("child {} is not a reference", position),
            );
            continue;
        };

        let Some(element) = map.get(target) else {
            diagnostics.report(
                DiagnosticCode::MissingChild,
                Some(target),
                format!(
                    "child {} of {} not found in element map",
                    position,
                    parent.as_deref().unwrap_or("tree root")
                ),
            );
            continue;
        };

        let key = canonical_ref(&element.id);
        if stack.iter().any(|f| f.owner.as_deref() == Some(key)) {
            diagnostics.report(
                DiagnosticCode::CyclicChild,
                Some(&element.id),
                "element is its own ancestor; subtree skipped",
            );
            continue;
        }

        output.push(element.clone());

        let children = element.children();
        if !children.is_empty() {
            stack.push(Frame {
                children,
                next: 0,
                owner: Some(key.to_string()),
            });
        }
    }

    output
}

fn tree_children(tree: &Value) -> &[Value] {
    match tree {
        Value::Array(items) => items,
        Value::Object(obj) => obj
            .get("children")
            .or_else(|| obj.get("elements"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    }
}

/// Page-grouped reading order for documents without a usable tree.
///
/// Pages are emitted in ascending page number. Each page is followed, in
/// map order, by the elements whose declared parent is that page, and by
/// elements with no page parent that carry its page number. Without any
/// page elements, every content element is emitted in map order.
pub fn page_fallback(map: &ElementMap) -> FlattenedSequence {
    let syntax = map.syntax();

    let mut pages: Vec<&Element> = map
        .iter()
        .filter(|e| e.kind() == ElementKind::Page)
        .collect();
    pages.sort_by_key(|p| p.page_no().unwrap_or(u32::MAX));

    let content = map
        .iter()
        .filter(|e| e.kind() != ElementKind::Page)
        .filter(|e| !ROOT_COLLECTIONS.contains(&e.collection.as_str()));

    if pages.is_empty() {
        log::info!("No page elements; using map order for {} elements", map.len());
        let elements = content.cloned().collect();
        return FlattenedSequence {
            elements,
            fallback: true,
        };
    }

    let page_ids: Vec<&str> = pages.iter().map(|p| canonical_ref(&p.id)).collect();
    let content: Vec<(&Element, Option<&str>)> = content
        .map(|el| (el, declared_page(el, syntax, &page_ids)))
        .collect();
    let mut elements = Vec::new();
    for page in &pages {
        let page_id = canonical_ref(&page.id);
        elements.push((*page).clone());
        for (el, parent) in &content {
            let belongs = match parent {
                Some(parent) => *parent == page_id,
                None => el.page_no().is_some() && el.page_no() == page.page_no(),
            };
            if belongs {
                elements.push((*el).clone());
            }
        }
    }

    FlattenedSequence {
        elements,
        fallback: true,
    }
}

/// The page an element's `parent` points at, if it points at one.
fn declared_page<'e>(
    el: &'e Element,
    syntax: &ReferenceSyntax,
    page_ids: &[&str],
) -> Option<&'e str> {
    el.parent()
        .and_then(|p| syntax.reference_target(p))
        .map(canonical_ref)
        .filter(|id| page_ids.contains(id))
}
