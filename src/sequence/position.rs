//! Position-based ordering.

use crate::model::Element;
use std::cmp::Ordering;

/// Stable sort by top edge, then left edge.
///
/// Elements without a bounding box sort last and keep their relative
/// order.
pub fn sort_by_position(elements: &mut [Element]) {
    elements.sort_by(compare_position);
}

/// Compare two elements by (top, left), treating a missing box as +inf.
pub fn compare_position(a: &Element, b: &Element) -> Ordering {
    let key = |el: &Element| {
        el.bbox()
            .map(|b| (b.t, b.l))
            .unwrap_or((f64::INFINITY, f64::INFINITY))
    };
    let (at, al) = key(a);
    let (bt, bl) = key(b);
    at.total_cmp(&bt).then(al.total_cmp(&bl))
}
