//! Reference resolution.
//!
//! Turns a [`RawDocument`](crate::model::RawDocument)'s element collections
//! into one [`ElementMap`] in which every reference marker has been replaced,
//! where possible, by a snapshot of its target. Resolution never fails;
//! dangling and cyclic references are tagged in place and reported as
//! diagnostics.

mod element_map;
mod options;
mod resolver;

pub use element_map::ElementMap;
pub use options::{is_tree_edge, ResolveOptions, DEFAULT_MAX_PASSES, TREE_EDGE_KEYS};
pub use resolver::{Resolution, ResolveReport, Resolver};
