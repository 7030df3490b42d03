//! Resolution options and configuration.

use crate::model::ReferenceSyntax;

/// Default number of discovery and substitution passes.
pub const DEFAULT_MAX_PASSES: usize = 4;

/// Keys holding containment-tree edges.
pub const TREE_EDGE_KEYS: &[&str] = &["parent", "children"];

/// Options for resolving reference markers.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Maximum discovery and substitution passes (at least 1)
    pub max_passes: usize,

    /// How markers and identifiers are spelled
    pub syntax: ReferenceSyntax,

    /// Attribute keys whose markers are left untouched
    pub preserved_keys: Vec<String>,
}

impl ResolveOptions {
    /// Create new resolve options with defaults.
    ///
    /// The defaults are [`structural`](Self::structural).
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `parent` and `children` edges as markers.
    ///
    /// Tree edges then stay cheap to follow, and element copies do not
    /// embed snapshots of their whole subtree.
    pub fn structural() -> Self {
        Self::full().with_preserved_keys(TREE_EDGE_KEYS.iter().copied())
    }

    /// Substitute every marker, tree edges included.
    ///
    /// Tree edges carried inside a substituted copy stay markers, so each
    /// element embeds at most one level of its neighbours.
    pub fn full() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            syntax: ReferenceSyntax::default(),
            preserved_keys: Vec::new(),
        }
    }

    /// Set the pass limit.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes.max(1);
        self
    }

    /// Set the reference syntax.
    pub fn with_syntax(mut self, syntax: ReferenceSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// Set keys whose markers are not substituted.
    pub fn with_preserved_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preserved_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Whether markers under `key` are left as-is.
    pub fn is_preserved(&self, key: &str) -> bool {
        self.preserved_keys.iter().any(|k| k == key)
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::structural()
    }
}

/// Whether `key` holds a containment-tree edge.
pub fn is_tree_edge(key: &str) -> bool {
    TREE_EDGE_KEYS.contains(&key)
}
