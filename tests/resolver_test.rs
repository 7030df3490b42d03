//! Integration tests for reference resolution.

use serde_json::json;
use unfold::model::{RawDocument, UNRESOLVED_KEY};
use unfold::{resolve_file, DiagnosticCode, Diagnostics, ResolveOptions, Resolver};

fn texts(entries: Vec<serde_json::Value>) -> RawDocument {
    RawDocument::new().with_collection("texts", entries)
}

fn chain_document() -> RawDocument {
    texts(vec![
        json!({"self_ref": "#/texts/0", "text": "start", "next": {"$ref": "#/texts/1"}}),
        json!({"self_ref": "#/texts/1", "text": "middle", "next": {"$ref": "#/texts/2"}}),
        json!({"self_ref": "#/texts/2", "text": "end"}),
    ])
}

#[test]
fn test_chain_resolves_transitively() {
    let resolution = Resolver::default().resolve(&chain_document());
    let start = resolution.elements.get("#/texts/0").unwrap();

    assert_eq!(start.attrs["next"]["text"], "middle");
    assert_eq!(start.attrs["next"]["next"]["text"], "end");
    assert_eq!(resolution.report.passes, 2);
    assert_eq!(resolution.report.substitutions, 3);
    assert!(resolution.report.reached_fixed_point());
    assert!(resolution.diagnostics.is_empty());
}

#[test]
fn test_two_element_cycle_terminates() {
    let doc = texts(vec![
        json!({"self_ref": "#/texts/0", "text": "a", "next": {"$ref": "#/texts/1"}}),
        json!({"self_ref": "#/texts/1", "text": "b", "next": {"$ref": "#/texts/0"}}),
    ]);
    let resolution = Resolver::default().resolve(&doc);

    let a = resolution.elements.get("#/texts/0").unwrap();
    assert_eq!(a.attrs["next"]["text"], "b");
    assert_eq!(a.attrs["next"]["next"][UNRESOLVED_KEY], "cycle");
    assert_eq!(a.attrs["next"]["next"]["$ref"], "#/texts/0");

    assert_eq!(resolution.report.cycles_broken, 2);
    assert_eq!(resolution.diagnostics.count(DiagnosticCode::CyclicReference), 2);
}

#[test]
fn test_self_reference_is_tagged() {
    let doc = texts(vec![json!({"self_ref": "#/texts/0", "me": {"$ref": "#/texts/0"}})]);
    let resolution = Resolver::default().resolve(&doc);

    let el = resolution.elements.get("#/texts/0").unwrap();
    assert_eq!(el.attrs["me"][UNRESOLVED_KEY], "cycle");
    assert_eq!(resolution.report.substitutions, 0);
}

#[test]
fn test_missing_target_keeps_marker() {
    let doc = texts(vec![json!({"self_ref": "#/texts/0", "see": {"$ref": "#/texts/99"}})]);
    let resolution = Resolver::default().resolve(&doc);

    let el = resolution.elements.get("#/texts/0").unwrap();
    assert_eq!(el.attrs["see"]["$ref"], "#/texts/99");
    assert_eq!(el.attrs["see"][UNRESOLVED_KEY], "missing");
    assert_eq!(resolution.report.missing, 1);

    let diagnostic = resolution.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.code, DiagnosticCode::UnresolvedReference);
    assert_eq!(diagnostic.element_id.as_deref(), Some("#/texts/0"));
}

#[test]
fn test_resolution_is_idempotent() {
    let doc = texts(vec![
        json!({"self_ref": "#/texts/0", "next": {"$ref": "#/texts/1"}}),
        json!({"self_ref": "#/texts/1", "back": {"$ref": "#/texts/0"}}),
        json!({"self_ref": "#/texts/2", "gone": {"$ref": "#/texts/7"}}),
    ]);
    let resolver = Resolver::default();
    let mut resolution = resolver.resolve(&doc);
    let before = serde_json::to_value(&resolution.elements).unwrap();

    let mut diagnostics = Diagnostics::new();
    let report = resolver.resolve_map(&mut resolution.elements, &mut diagnostics);

    assert_eq!(report.passes, 0);
    assert_eq!(report.substitutions, 0);
    assert!(diagnostics.is_empty());
    assert_eq!(serde_json::to_value(&resolution.elements).unwrap(), before);
}

#[test]
fn test_pass_limit_tags_remaining_markers() {
    let resolver = Resolver::new(ResolveOptions::new().with_max_passes(1));
    let resolution = resolver.resolve(&chain_document());

    let start = resolution.elements.get("#/texts/0").unwrap();
    assert_eq!(start.attrs["next"]["text"], "middle");
    assert_eq!(start.attrs["next"]["next"][UNRESOLVED_KEY], "pass_limit");
    assert_eq!(resolution.report.passes, 1);
    assert_eq!(resolution.report.pass_limited, 1);
    assert!(!resolution.report.reached_fixed_point());
    assert!(resolution.diagnostics.contains(DiagnosticCode::PassLimitReached));
}

#[test]
fn test_identifier_prefix_is_optional() {
    let doc = texts(vec![
        json!({"self_ref": "#/texts/0", "text": "target"}),
        json!({"self_ref": "#/texts/1", "a": {"$ref": "texts/0"}, "b": {"cref": "#/texts/0"}}),
    ]);
    let resolution = Resolver::default().resolve(&doc);

    let el = resolution.elements.get("texts/1").unwrap();
    assert_eq!(el.attrs["a"]["text"], "target");
    assert_eq!(el.attrs["b"]["text"], "target");
}

#[test]
fn test_structural_keeps_tree_edges() {
    let doc = RawDocument::new()
        .with_collection(
            "groups",
            vec![json!({
                "self_ref": "#/groups/0",
                "parent": {"$ref": "#/body"},
                "children": [{"$ref": "#/texts/0"}]
            })],
        )
        .with_collection(
            "texts",
            vec![json!({
                "self_ref": "#/texts/0",
                "parent": {"$ref": "#/groups/0"},
                "captions": [{"$ref": "#/texts/1"}]
            })],
        )
        .with_collection("texts_extra", vec![json!({"self_ref": "#/texts/1", "text": "cap"})]);
    let resolution = Resolver::new(ResolveOptions::structural()).resolve(&doc);

    let group = resolution.elements.get("#/groups/0").unwrap();
    assert_eq!(group.attrs["children"][0]["$ref"], "#/texts/0");
    assert_eq!(group.attrs["parent"]["$ref"], "#/body");

    let text = resolution.elements.get("#/texts/0").unwrap();
    assert_eq!(text.attrs["parent"]["$ref"], "#/groups/0");
    assert_eq!(text.attrs["captions"][0]["text"], "cap");
    assert!(resolution.diagnostics.is_empty());
}

#[test]
fn test_duplicate_identifier_first_wins() {
    let doc = texts(vec![
        json!({"self_ref": "#/texts/0", "text": "first"}),
        json!({"self_ref": "#/texts/0", "text": "second"}),
    ]);
    let resolution = Resolver::default().resolve(&doc);

    assert_eq!(resolution.elements.len(), 1);
    assert_eq!(resolution.elements.get("#/texts/0").unwrap().text(), Some("first"));
    assert!(resolution.diagnostics.contains(DiagnosticCode::DuplicateElement));
}

#[test]
fn test_resolve_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("doc.json");
    let doc = json!({
        "schema_name": "DoclingDocument",
        "texts": [
            {"self_ref": "#/texts/0", "text": "x"},
            {"self_ref": "#/texts/1", "ref": {"$ref": "#/texts/0"}}
        ]
    });
    std::fs::write(&path, doc.to_string()).unwrap();

    let resolution = resolve_file(&path, &ResolveOptions::default()).unwrap();
    assert_eq!(resolution.elements.len(), 2);
    assert_eq!(resolution.report.substitutions, 1);
}

#[test]
fn test_resolve_file_missing() {
    let result = resolve_file("/nonexistent/doc.json", &ResolveOptions::default());
    assert!(matches!(result, Err(unfold::Error::Io(_))));
}
