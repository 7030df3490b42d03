//! Integration tests for asset externalization.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use unfold::assets::REMOVED_PLACEHOLDER;
use unfold::model::RawDocument;
use unfold::{
    normalize, normalize_with_cache, strip_payloads, AssetCache, AssetOptions, DiagnosticCode,
    NormalizeOptions, ResolveOptions,
};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR-synthetic";

fn data_uri() -> String {
    format!("data:image/png;base64,{}", BASE64.encode(PNG_BYTES))
}

fn document_with_images() -> RawDocument {
    let uri = data_uri();
    RawDocument::from_value(json!({
        "name": "manual",
        "body": {"children": [
            {"$ref": "#/pictures/0"},
            {"$ref": "#/pictures/1"},
            {"$ref": "#/texts/0"}
        ]},
        "pictures": [
            {"self_ref": "#/pictures/0", "image": {"mimetype": "image/png", "uri": uri}},
            {"self_ref": "#/pictures/1", "image": {"mimetype": "image/png", "uri": uri}}
        ],
        "texts": [
            {"self_ref": "#/texts/0", "text": "See the diagram.", "see": {"$ref": "#/pictures/0"}}
        ]
    }))
    .unwrap()
}

fn options(dir: &Path, doc_id: &str) -> NormalizeOptions {
    NormalizeOptions::new()
        .with_resolve(ResolveOptions::structural())
        .with_assets(AssetOptions::new(dir, doc_id))
}

fn files_in(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[test]
fn test_same_payload_written_once() {
    let dir = TempDir::new().unwrap();
    let result = normalize(&document_with_images(), &options(dir.path(), "manual"));

    let images = dir.path().join("manual").join("images");
    assert_eq!(files_in(&images), 1);
    assert_eq!(fs::read(images.join("picture_1.png")).unwrap(), PNG_BYTES);

    let first = result.elements.get("#/pictures/0").unwrap();
    let second = result.elements.get("#/pictures/1").unwrap();
    assert_eq!(first.attrs["image"]["uri"], "manual/images/picture_1.png");
    assert_eq!(first.attrs["image"]["uri"], second.attrs["image"]["uri"]);

    // The resolved snapshot carries the same path
    let text = result.elements.get("#/texts/0").unwrap();
    assert_eq!(text.attrs["see"]["image"]["uri"], "manual/images/picture_1.png");

    assert_eq!(result.assets.written.len(), 1);
    assert_eq!(result.assets.reused, 2);
    assert_eq!(result.stats.assets_written, 1);
    assert!(result.warnings().next().is_none());
}

#[test]
fn test_rerun_reuses_files_on_disk() {
    let dir = TempDir::new().unwrap();
    let doc = document_with_images();

    normalize(&doc, &options(dir.path(), "manual"));
    let second = normalize(&doc, &options(dir.path(), "manual"));

    assert!(second.assets.written.is_empty());
    assert_eq!(second.assets.reused, 3);
    assert_eq!(files_in(&dir.path().join("manual").join("images")), 1);

    let first = second.elements.get("#/pictures/0").unwrap();
    assert_eq!(first.attrs["image"]["uri"], "manual/images/picture_1.png");
}

#[test]
fn test_shared_cache_spans_documents() {
    let dir = TempDir::new().unwrap();
    let doc = document_with_images();
    let mut cache = AssetCache::new();

    normalize_with_cache(&doc, &options(dir.path(), "first"), &mut cache);
    let second = normalize_with_cache(&doc, &options(dir.path(), "second"), &mut cache);

    assert!(second.assets.written.is_empty());
    let picture = second.elements.get("#/pictures/0").unwrap();
    assert_eq!(picture.attrs["image"]["uri"], "first/images/picture_1.png");
    assert!(!dir.path().join("second").exists());
}

#[test]
fn test_separate_caches_keep_documents_apart() {
    let dir = TempDir::new().unwrap();
    let doc = document_with_images();

    normalize(&doc, &options(dir.path(), "first"));
    let second = normalize(&doc, &options(dir.path(), "second"));

    assert_eq!(second.assets.written.len(), 1);
    let picture = second.elements.get("#/pictures/0").unwrap();
    assert_eq!(picture.attrs["image"]["uri"], "second/images/picture_1.png");
}

#[test]
fn test_corrupt_payload_is_a_visible_warning() {
    let dir = TempDir::new().unwrap();
    let doc = RawDocument::from_value(json!({
        "body": {"children": [{"$ref": "#/pictures/0"}]},
        "pictures": [
            {"self_ref": "#/pictures/0", "image": {"uri": "data:image/png;base64,@@not-base64@@"}}
        ]
    }))
    .unwrap();

    let result = normalize(&doc, &options(dir.path(), "broken"));

    let picture = result.elements.get("#/pictures/0").unwrap();
    assert_eq!(picture.attrs["image"]["uri"], "data:image/png;base64,@@not-base64@@");
    assert_eq!(result.assets.failed, 1);

    let warnings: Vec<_> = result.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, DiagnosticCode::AssetDecodeFailed);
    assert_eq!(warnings[0].element_id.as_deref(), Some("#/pictures/0"));
    assert_eq!(result.sequence.len(), 1);
}

#[test]
fn test_link_field_receives_path() {
    let dir = TempDir::new().unwrap();
    let options = NormalizeOptions::new().with_assets(
        AssetOptions::new(dir.path(), "linked").with_link_field("external_file"),
    );
    let result = normalize(&document_with_images(), &options);

    let picture = result.elements.get("#/pictures/1").unwrap();
    assert_eq!(picture.attrs["image"]["external_file"], "linked/images/picture_1.png");
    assert_eq!(picture.attrs["image"]["uri"], "linked/images/picture_1.png");
}

#[test]
fn test_strip_payloads() {
    let value = json!({
        "pictures": [{"image": {"uri": data_uri(), "mimetype": "image/png"}}],
        "texts": [{"uri": "https://example.com/page"}]
    });
    let stripped: Value = strip_payloads(&value);

    assert_eq!(stripped["pictures"][0]["image"]["uri"], REMOVED_PLACEHOLDER);
    assert_eq!(stripped["pictures"][0]["image"]["mimetype"], "image/png");
    assert_eq!(stripped["texts"][0]["uri"], "https://example.com/page");
    assert_eq!(value["pictures"][0]["image"]["uri"], data_uri());
}
