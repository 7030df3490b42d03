//! Fixed-point reference resolution.
//!
//! Each pass walks every element's attribute tree, records the position of
//! every reference marker, and then replaces each marker with a copy of
//! its target's attributes as they stood at the start of the pass. Copies
//! are not resolved further within the same pass; the next pass picks up
//! the markers they carry. Passes repeat until nothing is left to
//! substitute or the pass limit is hit.
//!
//! Every marker site remembers the chain of element ids enclosing it. A
//! marker whose target is already in that chain would re-enter the chain,
//! so it is tagged as a cycle instead of substituted. Markers whose target
//! is missing are tagged likewise. Tagged markers are never revisited,
//! which makes the output a fixed point of the resolver.
//!
//! `parent` and `children` markers inside a substituted copy are never
//! followed. Following them would copy the whole tree into every element.

use super::{is_tree_edge, ElementMap, ResolveOptions};
use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::model::{canonical_ref, push_pointer, RawDocument, UnresolvedReason, UNRESOLVED_KEY};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A marker found during discovery.
#[derive(Debug, Clone)]
struct MarkerSite {
    /// Position of the owning element in the map
    owner: usize,
    /// JSON pointer from the element's attribute root to the marker
    pointer: String,
    /// Identifier the marker points at
    target: String,
    /// Canonical ids of the element and every snapshot enclosing the marker
    chain: Vec<String>,
}

/// What to do with one marker site.
#[derive(Debug)]
enum Action {
    Substitute(Value),
    Tag(UnresolvedReason),
}

/// Counters describing one resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveReport {
    /// Passes that performed work
    pub passes: usize,

    /// Marker sites discovered across all passes
    pub markers_found: usize,

    /// Markers replaced by a target snapshot
    pub substitutions: usize,

    /// Markers whose target was absent
    pub missing: usize,

    /// Markers left in place to break a cycle
    pub cycles_broken: usize,

    /// Markers left in place because the pass limit was reached
    pub pass_limited: usize,
}

impl ResolveReport {
    /// Markers that remain unresolved for any reason.
    pub fn unresolved(&self) -> usize {
        self.missing + self.cycles_broken + self.pass_limited
    }

    /// Whether resolution ended with nothing left to substitute.
    pub fn reached_fixed_point(&self) -> bool {
        self.pass_limited == 0
    }
}

/// Output of the resolver.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Elements with markers substituted where possible
    pub elements: ElementMap,

    /// Counters for the run
    pub report: ResolveReport,

    /// Anomalies found along the way
    pub diagnostics: Diagnostics,
}

/// Resolves reference markers across a document's collections.
///
/// # Example
///
/// ```
/// use unfold::model::RawDocument;
/// use unfold::resolve::{Resolver, ResolveOptions};
/// use serde_json::json;
///
/// let doc = RawDocument::new().with_collection("texts", vec![
///     json!({"self_ref": "#/texts/0", "text": "Intro"}),
///     json!({"self_ref": "#/texts/1", "see": {"$ref": "#/texts/0"}}),
/// ]);
///
/// let resolution = Resolver::new(ResolveOptions::default()).resolve(&doc);
/// let el = resolution.elements.get("#/texts/1").unwrap();
/// assert_eq!(el.attrs["see"]["text"], "Intro");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolveOptions,
}

impl Resolver {
    /// Create a resolver with the given options.
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    /// Get the options.
    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Extract all collections into a map and resolve it.
    ///
    /// Never fails: missing targets and cycles become diagnostics.
    pub fn resolve(&self, doc: &RawDocument) -> Resolution {
        let mut diagnostics = Diagnostics::new();
        let mut elements = ElementMap::from_document(doc, &self.options.syntax, &mut diagnostics);
        let report = self.resolve_map(&mut elements, &mut diagnostics);

        log::debug!(
            "Resolved {} elements: {} substitutions, {} unresolved in {} passes",
            elements.len(),
            report.substitutions,
            report.unresolved(),
            report.passes
        );

        Resolution {
            elements,
            report,
            diagnostics,
        }
    }

    /// Run the fixed-point loop over an existing map in place.
    pub fn resolve_map(
        &self,
        map: &mut ElementMap,
        diagnostics: &mut Diagnostics,
    ) -> ResolveReport {
        let mut report = ResolveReport::default();

        loop {
            let sites = self.discover(map);
            if sites.is_empty() {
                break;
            }
            report.markers_found += sites.len();

            if report.passes >= self.options.max_passes {
                diagnostics.report(
                    DiagnosticCode::PassLimitReached,
                    None,
                    format!(
                        "{} markers still unresolved after {} passes",
                        sites.len(),
                        report.passes
                    ),
                );
                let actions = sites
                    .into_iter()
                    .map(|site| (site, Action::Tag(UnresolvedReason::PassLimit)))
                    .collect::<Vec<_>>();
                report.pass_limited += actions.len();
                apply(map, actions);
                break;
            }

            report.passes += 1;
            let actions = self.plan(map, sites, &mut report, diagnostics);
            apply(map, actions);
        }

        report
    }

    /// Record every untagged marker in every element.
    fn discover(&self, map: &ElementMap) -> Vec<MarkerSite> {
        let mut sites = Vec::new();
        for (owner, element) in map.iter().enumerate() {
            let mut chain = vec![canonical_ref(&element.id).to_string()];
            for (key, child) in &element.attrs {
                if self.options.is_preserved(key) {
                    continue;
                }
                let pointer = push_pointer("", key);
                self.walk(child, owner, pointer, &mut chain, &mut sites);
            }
        }
        sites
    }

    fn walk(
        &self,
        value: &Value,
        owner: usize,
        pointer: String,
        chain: &mut Vec<String>,
        sites: &mut Vec<MarkerSite>,
    ) {
        let syntax = &self.options.syntax;
        match value {
            Value::Object(obj) => {
                if let Some(target) = syntax.marker_target(value) {
                    if !syntax.is_tagged(value) {
                        sites.push(MarkerSite {
                            owner,
                            pointer,
                            target: target.to_string(),
                            chain: chain.clone(),
                        });
                    }
                    return;
                }

                let entered = match syntax.identifier(value) {
                    Some(id) => {
                        chain.push(canonical_ref(id).to_string());
                        true
                    }
                    None => false,
                };

                let in_snapshot = chain.len() > 1;
                for (key, child) in obj {
                    if self.options.is_preserved(key) || (in_snapshot && is_tree_edge(key)) {
                        continue;
                    }
                    let child_pointer = push_pointer(&pointer, key);
                    self.walk(child, owner, child_pointer, chain, sites);
                }

                if entered {
                    chain.pop();
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    let child_pointer = push_pointer(&pointer, &i.to_string());
                    self.walk(child, owner, child_pointer, chain, sites);
                }
            }
            _ => {}
        }
    }

    /// Decide each site's fate against the map as it stands before the pass.
    fn plan(
        &self,
        map: &ElementMap,
        sites: Vec<MarkerSite>,
        report: &mut ResolveReport,
        diagnostics: &mut Diagnostics,
    ) -> Vec<(MarkerSite, Action)> {
        sites
            .into_iter()
            .map(|site| {
                let owner_id = map.get_index(site.owner).map(|e| e.id.as_str());
                let target = canonical_ref(&site.target);

                let action = if site.chain.iter().any(|id| id == target) {
                    report.cycles_broken += 1;
                    diagnostics.report(
                        DiagnosticCode::CyclicReference,
                        owner_id,
                        format!(
                            "reference to {} at {} re-enters its chain",
                            site.target, site.pointer
                        ),
                    );
                    Action::Tag(UnresolvedReason::Cycle)
                } else if let Some(element) = map.get(target) {
                    report.substitutions += 1;
                    Action::Substitute(element.to_value())
                } else {
                    report.missing += 1;
                    diagnostics.report(
                        DiagnosticCode::UnresolvedReference,
                        owner_id,
                        format!("reference to {} at {} not found", site.target, site.pointer),
                    );
                    Action::Tag(UnresolvedReason::Missing)
                };

                (site, action)
            })
            .collect()
    }
}

/// Apply planned actions; sites never nest, so pointers stay valid.
fn apply(map: &mut ElementMap, actions: Vec<(MarkerSite, Action)>) {
    for (site, action) in actions {
        let Some(element) = map.get_index_mut(site.owner) else {
            continue;
        };

        let mut root = Value::Object(std::mem::take(&mut element.attrs));
        match (root.pointer_mut(&site.pointer), action) {
            (Some(slot), Action::Substitute(snapshot)) => *slot = snapshot,
            (Some(Value::Object(marker)), Action::Tag(reason)) => {
                marker.insert(UNRESOLVED_KEY.to_string(), Value::from(reason.as_str()));
            }
            _ => log::debug!("Marker at {} vanished before apply", site.pointer),
        }

        if let Value::Object(attrs) = root {
            element.attrs = attrs;
        }
    }
}
