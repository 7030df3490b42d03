//! Bounded text context around an element.

use super::furniture::{normalize_whitespace, FurnitureSet};
use crate::model::{Element, ElementKind};
use crate::sequence::FlattenedSequence;
use serde::Serialize;

/// Default character budget on each side.
pub const DEFAULT_MAX_CHARS: usize = 100;

/// Text before and after an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextText {
    /// Text preceding the element
    pub before: String,

    /// Text following the element
    pub after: String,
}

impl ContextText {
    /// Whether both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

impl From<ContextText> for (String, String) {
    fn from(context: ContextText) -> Self {
        (context.before, context.after)
    }
}

/// Collects neighbouring paragraph text up to a character budget.
///
/// Only text elements take part. Furniture elements and texts that exactly
/// match a furniture string are skipped, and furniture substrings are
/// deleted from what remains. Budgets count characters, not bytes.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    max_chars: usize,
    furniture: FurnitureSet,
}

impl ContextWindow {
    /// Create a window with the given budget per side.
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            furniture: FurnitureSet::new(),
        }
    }

    /// Set the known furniture strings.
    pub fn with_furniture(mut self, furniture: FurnitureSet) -> Self {
        self.furniture = furniture;
        self
    }

    /// Character budget per side.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Context around an element located by identifier.
    ///
    /// Empty when the element is absent from the sequence.
    pub fn around(&self, element: &Element, sequence: &FlattenedSequence) -> ContextText {
        sequence
            .position_of(&element.id)
            .map(|index| self.around_index(index, sequence))
            .unwrap_or_default()
    }

    /// Context around the element at `index`.
    pub fn around_index(&self, index: usize, sequence: &FlattenedSequence) -> ContextText {
        let elements = sequence.elements();
        if index >= elements.len() || self.max_chars == 0 {
            return ContextText::default();
        }

        let before = self.collect(elements[..index].iter().rev(), Side::Before);
        let after = self.collect(elements[index + 1..].iter(), Side::After);
        ContextText { before, after }
    }

    fn collect<'a>(&self, neighbours: impl Iterator<Item = &'a Element>, side: Side) -> String {
        let mut pieces: Vec<String> = Vec::new();
        let mut used = 0;

        for text in neighbours.filter_map(|e| self.eligible_text(e)) {
            let separator = usize::from(!pieces.is_empty());
            let len = text.chars().count();

            if used + separator + len <= self.max_chars {
                pieces.push(text);
                used += separator + len;
                if used == self.max_chars {
                    break;
                }
                continue;
            }

            let room = self.max_chars - used;
            if room > separator {
                let keep = room - separator;
                pieces.push(match side {
                    Side::Before => suffix(&text, keep),
                    Side::After => prefix(&text, keep),
                });
            }
            break;
        }

        if side == Side::Before {
            pieces.reverse();
        }
        let joined = pieces.join(" ");
        if self.furniture.occurs_in(&joined) {
            self.furniture.clean(&joined)
        } else {
            joined
        }
    }

    /// Cleaned text of a neighbour that may contribute context.
    fn eligible_text(&self, element: &Element) -> Option<String> {
        if element.kind() != ElementKind::Text || element.is_furniture() {
            return None;
        }
        let text = element.text()?;
        if self.furniture.matches(text) {
            return None;
        }
        let cleaned = if self.furniture.is_empty() {
            normalize_whitespace(text)
        } else {
            self.furniture.clean(text)
        };
        (!cleaned.is_empty()).then_some(cleaned)
    }
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

fn suffix(text: &str, chars: usize) -> String {
    let skip = text.chars().count().saturating_sub(chars);
    text.chars().skip(skip).collect()
}

fn prefix(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn element(id: &str, attrs: Value) -> Element {
        let attrs = match attrs {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        Element::new(id, "texts", attrs)
    }

    fn para(id: &str, text: &str) -> Element {
        element(id, json!({"label": "text", "text": text}))
    }

    fn picture(id: &str) -> Element {
        Element::new(id, "pictures", serde_json::Map::new())
    }

    #[test]
    fn test_truncates_before_to_suffix() {
        let seq = FlattenedSequence::new(vec![
            para("p", "abcdefghijKLMNOPQRST"),
            picture("img"),
        ]);
        let context = ContextWindow::new(10).around_index(1, &seq);
        assert_eq!(context.before, "KLMNOPQRST");
        assert_eq!(context.after, "");
    }

    #[test]
    fn test_truncates_after_to_prefix() {
        let seq = FlattenedSequence::new(vec![
            picture("img"),
            para("p", "abcdefghijKLMNOPQRST"),
        ]);
        let context = ContextWindow::new(10).around_index(0, &seq);
        assert_eq!(context.after, "abcdefghij");
    }

    #[test]
    fn test_accumulates_whole_texts() {
        let seq = FlattenedSequence::new(vec![
            para("a", "one"),
            para("b", "two"),
            picture("img"),
            para("c", "three"),
            para("d", "four"),
        ]);
        let context = ContextWindow::new(100).around_index(2, &seq);
        assert_eq!(context.before, "one two");
        assert_eq!(context.after, "three four");
    }

    #[test]
    fn test_boundary_element_fills_budget() {
        let seq = FlattenedSequence::new(vec![
            para("a", "0123456789"),
            para("b", "abcd"),
            picture("img"),
        ]);
        // "abcd" (4) + separator (1) leaves 5 characters of "0123456789".
        let context = ContextWindow::new(10).around_index(2, &seq);
        assert_eq!(context.before, "56789 abcd");
        assert_eq!(context.before.chars().count(), 10);
    }

    #[test]
    fn test_skips_non_text_and_furniture() {
        let seq = FlattenedSequence::new(vec![
            para("a", "Real text"),
            element("f", json!({"label": "page_footer", "text": "Page 3"})),
            element("t", json!({"label": "table"})),
            picture("img"),
        ]);
        let context = ContextWindow::new(100).around_index(3, &seq);
        assert_eq!(context.before, "Real text");
    }

    #[test]
    fn test_removes_furniture_substrings() {
        let mut furniture = FurnitureSet::new();
        furniture.insert("ACME Confidential");
        let seq = FlattenedSequence::new(vec![
            para("a", "ACME Confidential"),
            para("b", "Results ACME Confidential were good"),
            picture("img"),
        ]);
        let context = ContextWindow::new(100)
            .with_furniture(furniture.clone())
            .around_index(2, &seq);
        assert_eq!(context.before, "Results were good");
        assert!(!furniture.occurs_in(&context.before));
    }

    #[test]
    fn test_empty_when_not_found() {
        let seq = FlattenedSequence::new(vec![para("a", "text")]);
        let stranger = picture("zz");
        let window = ContextWindow::default();

        assert!(window.around(&stranger, &seq).is_empty());
        assert!(window.around_index(5, &seq).is_empty());
        assert!(ContextWindow::new(0).around_index(0, &seq).is_empty());
    }

    #[test]
    fn test_counts_characters() {
        let seq = FlattenedSequence::new(vec![para("a", "가나다라마바사"), picture("img")]);
        let context = ContextWindow::new(3).around_index(1, &seq);
        assert_eq!(context.before, "마바사");
    }
}
