//! End-to-end tests for the normalization pipeline.

use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use unfold::pipeline::{ANNOTATIONS_FILE, DIAGNOSTICS_FILE, ELEMENT_MAP_FILE, SEQUENCE_FILE};
use unfold::model::RawDocument;
use unfold::{
    normalize, normalize_file, normalize_str, process_batch, AssetOptions, BreadcrumbScan,
    ContextOptions, DiagnosticCode, ElementKind, JsonFormat, NormalizeOptions, ResolveOptions,
    Unfold,
};

/// A small manual with a furniture header, a captioned picture and a table.
fn manual() -> Value {
    json!({
        "schema_name": "DoclingDocument",
        "version": "1.0.0",
        "name": "pump-manual",
        "furniture": {
            "self_ref": "#/furniture",
            "children": [{"$ref": "#/texts/0"}]
        },
        "body": {
            "self_ref": "#/body",
            "children": [
                {"$ref": "#/texts/1"},
                {"$ref": "#/texts/2"},
                {"$ref": "#/texts/3"},
                {"$ref": "#/pictures/0"},
                {"$ref": "#/texts/5"},
                {"$ref": "#/texts/6"},
                {"$ref": "#/tables/0"}
            ]
        },
        "texts": [
            {"self_ref": "#/texts/0", "parent": {"$ref": "#/furniture"}, "label": "page_header",
             "content_layer": "furniture", "text": "ACME Pumps"},
            {"self_ref": "#/texts/1", "parent": {"$ref": "#/body"}, "label": "title",
             "text": "Pump Manual"},
            {"self_ref": "#/texts/2", "parent": {"$ref": "#/body"}, "label": "section_header",
             "level": 1, "text": "Installation"},
            {"self_ref": "#/texts/3", "parent": {"$ref": "#/body"}, "label": "text",
             "text": "ACME Pumps Mount the pump on a level surface.",
             "prov": [{"page_no": 1, "bbox": {"l": 50.0, "t": 100.0, "r": 500.0, "b": 120.0}}]},
            {"self_ref": "#/texts/4", "parent": {"$ref": "#/pictures/0"}, "label": "caption",
             "text": "Figure 1: Mounting"},
            {"self_ref": "#/texts/5", "parent": {"$ref": "#/body"}, "label": "section_header",
             "level": 2, "text": "Wiring"},
            {"self_ref": "#/texts/6", "parent": {"$ref": "#/body"}, "label": "text",
             "text": "Table 1 lists wire gauges."}
        ],
        "pictures": [
            {"self_ref": "#/pictures/0", "parent": {"$ref": "#/body"}, "label": "picture",
             "captions": [{"$ref": "#/texts/4"}], "ocr_text": "BOLT M8",
             "prov": [{"page_no": 1, "bbox": {"l": 50.0, "t": 140.0, "r": 250.0, "b": 300.0}}]}
        ],
        "tables": [
            {"self_ref": "#/tables/0", "parent": {"$ref": "#/body"}, "label": "table",
             "data": {"table_cells": [
                {"start_row_offset_idx": 0, "end_row_offset_idx": 1,
                 "start_col_offset_idx": 0, "end_col_offset_idx": 1, "text": "Gauge"},
                {"start_row_offset_idx": 0, "end_row_offset_idx": 1,
                 "start_col_offset_idx": 1, "end_col_offset_idx": 2, "text": "Amps"}
             ]}}
        ]
    })
}

fn structural() -> NormalizeOptions {
    NormalizeOptions::new().with_resolve(ResolveOptions::structural())
}

/// A flat body of `n` paragraphs, each pointing back at the body.
fn flat_body(n: usize) -> RawDocument {
    let children: Vec<Value> = (0..n)
        .map(|i| json!({"$ref": format!("#/texts/{}", i)}))
        .collect();
    let texts: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "self_ref": format!("#/texts/{}", i),
                "parent": {"$ref": "#/body"},
                "label": "text",
                "text": format!("Paragraph {}", i)
            })
        })
        .collect();

    RawDocument::from_value(json!({
        "schema_name": "DoclingDocument",
        "body": {"self_ref": "#/body", "children": children},
        "texts": texts
    }))
    .unwrap()
}

#[test]
fn test_reading_order_and_breadcrumbs() {
    let result = normalize_str(&manual().to_string(), &structural()).unwrap();

    assert_eq!(
        result.sequence.ids(),
        vec![
            "#/texts/1",
            "#/texts/2",
            "#/texts/3",
            "#/pictures/0",
            "#/texts/5",
            "#/texts/6",
            "#/tables/0"
        ]
    );
    assert_eq!(
        result.breadcrumbs,
        vec![
            "",
            "",
            "Installation",
            "Installation",
            "Installation",
            "Installation > Wiring",
            "Installation > Wiring"
        ]
    );
    assert_eq!(result.info.title.as_deref(), Some("Pump Manual"));
    assert_eq!(result.info.schema.as_deref(), Some("DoclingDocument 1.0.0"));
}

#[test]
fn test_picture_annotation() {
    let result = normalize_str(&manual().to_string(), &structural()).unwrap();
    let picture = result.annotation_of("#/pictures/0").unwrap();

    assert_eq!(picture.kind, ElementKind::Picture);
    assert_eq!(picture.caption.as_deref(), Some("Figure 1: Mounting"));
    assert_eq!(picture.page_no, Some(1));
    assert_eq!(picture.breadcrumb, "Installation");

    // Furniture text is removed from the neighbour, headings count as text
    assert_eq!(
        picture.context_before,
        "Pump Manual Installation Mount the pump on a level surface."
    );
    assert_eq!(picture.context_after, "Wiring Table 1 lists wire gauges.");
    assert!(picture.search_text.contains("[Image Text: BOLT M8]"));
    assert!(!picture.search_text.contains("ACME Pumps"));
}

#[test]
fn test_table_annotation() {
    let result = normalize_str(&manual().to_string(), &structural()).unwrap();
    let table = result.annotation_of("#/tables/0").unwrap();

    assert_eq!(table.caption.as_deref(), Some("Table 1 lists wire gauges."));
    assert_eq!(table.breadcrumb, "Installation > Wiring");
    let grid = table.table.as_ref().unwrap();
    assert_eq!(grid.plain_text(), "Gauge\tAmps");
}

#[test]
fn test_title_fills_empty_breadcrumb() {
    let result = normalize_str(&manual().to_string(), &structural()).unwrap();
    let title = result.annotation_of("#/texts/1").unwrap();

    assert_eq!(result.breadcrumb_of("#/texts/1"), Some(""));
    assert_eq!(title.breadcrumb, "Pump Manual");
}

#[test]
fn test_stats() {
    let result = normalize_str(&manual().to_string(), &structural()).unwrap();
    let stats = &result.stats;

    assert_eq!(stats.document_count, 1);
    assert_eq!(stats.sequence_length, 7);
    assert_eq!(stats.heading_count, 2);
    assert_eq!(stats.picture_count, 1);
    assert_eq!(stats.table_count, 1);
    assert_eq!(stats.furniture_count, 1);
    assert_eq!(stats.unresolved_count, 0);
    assert_eq!(stats.fallback_count, 0);
}

#[test]
fn test_full_resolution_same_order() {
    let structural = normalize_str(&manual().to_string(), &structural()).unwrap();
    let options = NormalizeOptions::new().with_resolve(ResolveOptions::full());
    let full = normalize_str(&manual().to_string(), &options).unwrap();

    assert_eq!(structural.sequence.ids(), full.sequence.ids());
    assert_eq!(structural.breadcrumbs, full.breadcrumbs);
}

#[test]
fn test_default_options_on_large_body() {
    let n = 1000;
    let result = normalize(&flat_body(n), &NormalizeOptions::default());

    assert_eq!(result.sequence.len(), n);
    assert_eq!(result.sequence.ids()[n - 1], "#/texts/999");
    assert_eq!(result.stats.unresolved_count, 0);

    // Tree edges stay markers, so each element keeps its own size
    let bytes = serde_json::to_string(&result.elements).unwrap().len();
    assert!(bytes < n * 300, "element map grew to {} bytes", bytes);
    let text = result.elements.get("#/texts/0").unwrap();
    assert_eq!(text.attrs["parent"], json!({"$ref": "#/body"}));
}

#[test]
fn test_full_resolution_on_large_body() {
    let n = 300;
    let options = NormalizeOptions::new().with_resolve(ResolveOptions::full());
    let result = normalize(&flat_body(n), &options);

    assert_eq!(result.sequence.len(), n);
    assert_eq!(result.stats.unresolved_count, 0);

    let text = result.elements.get("#/texts/0").unwrap();
    assert_eq!(text.attrs["parent"]["self_ref"], "#/body");
    assert_eq!(text.attrs["parent"]["children"][1], json!({"$ref": "#/texts/1"}));

    let body = result.elements.get("#/body").unwrap();
    assert_eq!(body.attrs["children"][2]["text"], "Paragraph 2");
    assert_eq!(body.attrs["children"][2]["parent"], json!({"$ref": "#/body"}));
}

#[test]
fn test_out_of_range_table_cells_are_diagnosed() {
    let doc = json!({
        "body": {"children": [{"$ref": "#/tables/0"}]},
        "tables": [
            {"self_ref": "#/tables/0", "label": "table",
             "data": {"table_cells": [
                {"start_row_offset_idx": 0, "end_row_offset_idx": 1,
                 "start_col_offset_idx": 0, "end_col_offset_idx": 1, "text": "Gauge"},
                {"start_row_offset_idx": u64::MAX, "end_row_offset_idx": u64::MAX,
                 "start_col_offset_idx": 0, "end_col_offset_idx": 1, "text": "lost"}
             ]}}
        ]
    });
    let result = normalize_str(&doc.to_string(), &NormalizeOptions::default()).unwrap();

    let table = result.annotation_of("#/tables/0").unwrap();
    assert_eq!(table.table.as_ref().unwrap().plain_text(), "Gauge");

    let diagnostic = result
        .diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::TableCellOutOfRange)
        .unwrap();
    assert_eq!(diagnostic.element_id.as_deref(), Some("#/tables/0"));
}

#[test]
fn test_backward_scan_option() {
    let context = ContextOptions::new().with_scan(BreadcrumbScan::Backward);
    let options = structural().with_context(context);
    let backward = normalize_str(&manual().to_string(), &options).unwrap();
    let forward = normalize_str(&manual().to_string(), &structural()).unwrap();

    assert_eq!(backward.breadcrumbs, forward.breadcrumbs);
}

#[test]
fn test_position_sort() {
    let options = structural().with_position_sort(true);
    let result = normalize_str(&manual().to_string(), &options).unwrap();

    let ids = result.sequence.ids();
    assert_eq!(&ids[..2], &["#/texts/3", "#/pictures/0"]);
    assert_eq!(ids.len(), 7);
}

#[test]
fn test_write_artifacts() {
    let dir = TempDir::new().unwrap();
    let result = normalize_str(&manual().to_string(), &structural()).unwrap();
    result.write_to(dir.path(), JsonFormat::Pretty).unwrap();

    for name in [ELEMENT_MAP_FILE, SEQUENCE_FILE, ANNOTATIONS_FILE, DIAGNOSTICS_FILE] {
        assert!(dir.path().join(name).exists(), "missing {}", name);
    }

    let sequence: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(SEQUENCE_FILE)).unwrap())
            .unwrap();
    assert_eq!(sequence.as_array().map(Vec::len), Some(7));
    assert_eq!(sequence[0]["self_ref"], "#/texts/1");

    let map: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(ELEMENT_MAP_FILE)).unwrap())
            .unwrap();
    let keys: Vec<&String> = map.as_object().unwrap().keys().collect();
    assert_eq!(keys[0], "#/texts/0");
}

#[test]
fn test_builder_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("manual.json");
    fs::write(&path, manual().to_string()).unwrap();

    let result = Unfold::new()
        .structural()
        .with_context_chars(20)
        .normalize(&path)
        .unwrap();

    let picture = result.document().annotation_of("#/pictures/0").unwrap();
    assert_eq!(picture.context_before.chars().count(), 20);
    assert!(result.to_json(JsonFormat::Compact).unwrap().contains("\"breadcrumbs\""));
}

#[test]
fn test_normalize_file_missing() {
    let result = normalize_file("/nonexistent/manual.json", &structural());
    assert!(result.is_err());
}

#[test]
fn test_process_batch() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("Manual A.json");
    let other = dir.path().join("manual-b.json");
    let bad = dir.path().join("broken.json");
    fs::write(&good, manual().to_string()).unwrap();
    fs::write(&other, manual().to_string()).unwrap();
    fs::write(&bad, "{ nope").unwrap();

    let out = dir.path().join("out");
    let options = structural().with_assets(AssetOptions::new(&out, ""));
    let results = process_batch(&[&good, &other, &bad], &options);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, good);
    assert!(results[0].1.is_ok());
    assert!(results[1].1.is_ok());
    assert!(results[2].1.is_err());

    let first = results[0].1.as_ref().unwrap();
    assert_eq!(first.sequence.len(), 7);
    assert_eq!(first.info.name.as_deref(), Some("pump-manual"));
}
