//! Integration tests for storing results on disk.

mod common;

use common::{ConstOcr, Page, PdfBuilder};
use pdfharvest::{ErrorKind, Harvester, JsonFormat, ResultStore};

#[test]
fn test_stored_json_shape() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("invoice.pdf");
    let data = PdfBuilder::new()
        .page(Page::new().table(700.0, &[&["Item", "Total"], &["Widget", "9.99"]]))
        .page(Page::new().gray_image(20, 20))
        .build();
    std::fs::write(&input, data).unwrap();

    let store = ResultStore::new(dir.path().join("outputs"));
    let path = Harvester::new()
        .with_engine(ConstOcr("INVOICE"))
        .extract_to_store(&input, &store)
        .unwrap();
    assert_eq!(path, store.path_for("invoice.pdf").unwrap());

    let value: serde_json::Value = serde_json::from_str(&store.load("invoice.pdf").unwrap()).unwrap();
    let object = value.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["images", "overall_text", "tables"]);

    assert_eq!(
        value["images"],
        serde_json::json!([{ "page": 2, "image_index": 1, "text": "INVOICE" }])
    );
    assert_eq!(value["tables"][0][0], serde_json::json!(["Item", "Total"]));
}

#[test]
fn test_overwrite_keeps_latest() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("memo.pdf");
    let store = ResultStore::new(dir.path());
    let harvester = Harvester::new()
        .with_engine(ConstOcr(""))
        .with_format(JsonFormat::Compact);

    std::fs::write(&input, PdfBuilder::new().page(Page::prose("draft")).build()).unwrap();
    harvester.extract_to_store(&input, &store).unwrap();

    std::fs::write(&input, PdfBuilder::new().page(Page::prose("final")).build()).unwrap();
    harvester.extract_to_store(&input, &store).unwrap();

    let stored = store.load_result("memo.pdf").unwrap();
    assert!(stored.overall_text.contains("final"));
    assert!(!stored.overall_text.contains("draft"));
}

#[test]
fn test_failed_run_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.pdf");
    std::fs::write(&input, b"%PDF-1.7\ntruncated").unwrap();

    let store = ResultStore::new(dir.path().join("outputs"));
    let err = Harvester::new()
        .with_engine(ConstOcr(""))
        .extract_to_store(&input, &store)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DocumentParse);
    assert!(!store.contains("broken.pdf"));
}
