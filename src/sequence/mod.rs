//! Reading-order sequencing.
//!
//! Walks the containment tree depth-first over a resolved
//! [`ElementMap`](crate::resolve::ElementMap) to produce one linear
//! [`FlattenedSequence`], with a page-grouped fallback when the tree is
//! missing.

mod flatten;
mod position;

pub use flatten::{flatten, page_fallback, FlattenedSequence};
pub use position::{compare_position, sort_by_position};
