//! Integration tests for the extraction pipeline.

mod common;

use common::{ConstOcr, MissingOcr, Page, PdfBuilder, SizeOcr};
use pdfharvest::{
    extract_bytes, ErrorKind, OcrResult, PdfDocument, Pipeline, PipelineOptions, Stage, Table,
};

fn open(data: &[u8]) -> PdfDocument {
    PdfDocument::from_bytes(data).unwrap()
}

fn numbered_pages(count: usize) -> Vec<Page> {
    (1..=count)
        .map(|i| Page::prose(&format!("page-{:03}", i)))
        .collect()
}

#[test]
fn test_text_uses_first_twenty_pages() {
    let data = PdfBuilder::new().pages(numbered_pages(25)).build();

    let report = Pipeline::new(SizeOcr::default())
        .run_with_report(&open(&data))
        .unwrap();
    let result = report.result;

    for i in 1..=20 {
        assert!(result.overall_text.contains(&format!("page-{:03}", i)), "page {i}");
    }
    for i in 21..=25 {
        assert!(!result.overall_text.contains(&format!("page-{:03}", i)), "page {i}");
    }
    assert!(result.tables.is_empty());
    assert!(result.images.is_empty());

    // No tables to fill, so every page is visited looking for one.
    assert_eq!(report.stats.pages_visited, 25);
}

#[test]
fn test_page_texts_keep_document_order() {
    let data = PdfBuilder::new().pages(numbered_pages(4)).build();
    let result = extract_bytes(&data, SizeOcr::default()).unwrap();

    let positions: Vec<usize> = (1..=4)
        .map(|i| result.overall_text.find(&format!("page-{:03}", i)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_short_document_keeps_every_page() {
    let data = PdfBuilder::new().pages(numbered_pages(3)).build();
    let result = extract_bytes(&data, SizeOcr::default()).unwrap();

    for i in 1..=3 {
        assert!(result.overall_text.contains(&format!("page-{:03}", i)));
    }
}

#[test]
fn test_detects_tables_across_pages() {
    let data = PdfBuilder::new()
        .page(Page::new().table(700.0, &[&["Region", "Revenue"], &["North", "120"], &["South", "95"]]))
        .page(Page::prose("Commentary without any grid."))
        .page(Page::new().table(700.0, &[&["Item", "Qty", "Price"], &["Pen", "2", "1.50"]]))
        .page(Page::new().table(650.0, &[&["Name", "Role"], &["Ada", "Engineer"]]))
        .page(Page::prose("Closing remarks."))
        .build();

    let result = extract_bytes(&data, SizeOcr::default()).unwrap();

    assert_eq!(result.tables.len(), 3);
    assert_eq!(
        result.tables[0],
        Table::from_rows(vec![
            vec![Some("Region".into()), Some("Revenue".into())],
            vec![Some("North".into()), Some("120".into())],
            vec![Some("South".into()), Some("95".into())],
        ])
    );
    assert_eq!(result.tables[1].column_count(), 3);
    assert_eq!(result.tables[2].rows[1][0].as_deref(), Some("Ada"));
}

#[test]
fn test_table_cap_is_independent_of_text_cap() {
    let pages = (0..25).map(|i| {
        let label = format!("T{}", i);
        Page::new().table(700.0, &[&[label.as_str(), "value"], &["key", "42"]])
    });
    let data = PdfBuilder::new().pages(pages).build();

    let options = PipelineOptions::new().with_text_limit(2);
    let report = Pipeline::new(SizeOcr::default())
        .with_options(options)
        .run_with_report(&open(&data))
        .unwrap();

    assert_eq!(report.result.tables.len(), 20);
    assert_eq!(report.result.tables[0].rows[0][0].as_deref(), Some("T0"));
    assert_eq!(report.result.tables[19].rows[0][0].as_deref(), Some("T19"));
    // Both collectors are full after page 20.
    assert_eq!(report.stats.pages_visited, 20);
}

#[test]
fn test_images_in_page_then_position_order() {
    let data = PdfBuilder::new()
        .page(Page::prose("one").gray_image(10, 11).gray_image(12, 13))
        .page(Page::prose("two"))
        .page(Page::new().gray_image(14, 15))
        .build();

    let result = extract_bytes(&data, SizeOcr::default()).unwrap();

    assert_eq!(
        result.images,
        vec![
            OcrResult::new(1, 1, "10x11"),
            OcrResult::new(1, 2, "12x13"),
            OcrResult::new(3, 1, "14x15"),
        ]
    );
}

#[test]
fn test_image_cap_independent_of_page_count() {
    // Two pages of text, 25 images on the second page.
    let scans = (0..25).fold(Page::prose("scans"), |page, i| page.gray_image(4 + i, 4));
    let data = PdfBuilder::new()
        .page(Page::prose("cover"))
        .page(scans)
        .build();

    let engine = SizeOcr::default();
    let result = Pipeline::new(&engine).run(&open(&data)).unwrap();

    assert_eq!(result.images.len(), 20);
    assert_eq!(result.images[0], OcrResult::new(2, 1, "4x4"));
    assert_eq!(result.images[19], OcrResult::new(2, 20, "23x4"));
    assert!(result.overall_text.contains("cover"));
    assert!(result.overall_text.contains("scans"));
    // Images past the cap are never recognized.
    assert_eq!(engine.calls(), 20);
}

#[test]
fn test_undecodable_image_is_skipped() {
    let data = PdfBuilder::new()
        .page(
            Page::prose("mixed")
                .gray_image(8, 8)
                .broken_image()
                .gray_image(9, 9),
        )
        .build();

    let report = Pipeline::new(SizeOcr::default())
        .run_with_report(&open(&data))
        .unwrap();

    assert_eq!(
        report.result.images,
        vec![OcrResult::new(1, 1, "8x8"), OcrResult::new(1, 3, "9x9")]
    );
    assert_eq!(report.stats.images_skipped, 1);
    assert_eq!(report.stats.images_recognized, 2);
}

#[test]
fn test_flate_compressed_image_is_recognized() {
    let data = PdfBuilder::new()
        .page(Page::prose("compressed scan").flate_gray_image(16, 16))
        .build();

    let report = Pipeline::new(SizeOcr::default())
        .run_with_report(&open(&data))
        .unwrap();

    assert_eq!(report.result.images, vec![OcrResult::new(1, 1, "16x16")]);
    assert_eq!(report.stats.images_skipped, 0);
}

#[test]
fn test_scanned_page_is_recognized() {
    let data = PdfBuilder::new().page(Page::new().gray_image(64, 32)).build();

    let result = extract_bytes(&data, ConstOcr("INVOICE")).unwrap();

    assert_eq!(result.images, vec![OcrResult::new(1, 1, "INVOICE")]);
    assert!(result.tables.is_empty());
    assert!(result.overall_text.trim().is_empty());
}

#[test]
fn test_unavailable_engine_fails_the_run() {
    let data = PdfBuilder::new()
        .page(Page::prose("text"))
        .page(Page::new().gray_image(8, 8))
        .build();

    let err = extract_bytes(&data, MissingOcr).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OcrUnavailable);
    assert!(err.is_fatal());
}

#[test]
fn test_engine_not_needed_without_images() {
    let data = PdfBuilder::new().page(Page::prose("text only")).build();
    let result = extract_bytes(&data, MissingOcr).unwrap();
    assert!(result.images.is_empty());
}

#[test]
fn test_unparsable_document() {
    for data in [&b"%PDF-1.4\nthis is not a body"[..], &b"PK\x03\x04 zip archive"[..], &b""[..]] {
        let err = extract_bytes(data, SizeOcr::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DocumentParse, "{:?}", err);
    }
}

#[test]
fn test_repeated_runs_are_identical() {
    let data = PdfBuilder::new()
        .page(Page::prose("alpha").gray_image(5, 6))
        .page(Page::new().table(700.0, &[&["a", "b"], &["c", "d"]]))
        .build();
    let doc = open(&data);
    let pipeline = Pipeline::new(SizeOcr::default());

    let first = pipeline.run(&doc).unwrap();
    let second = pipeline.run(&doc).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parallel_matches_sequential() {
    let pages = (0..6).map(|i| Page::prose(&format!("p{}", i)).gray_image(3 + i, 7).gray_image(7, 3 + i));
    let data = PdfBuilder::new().pages(pages).build();
    let doc = open(&data);

    let sequential = Pipeline::new(SizeOcr::default()).run(&doc).unwrap();
    let parallel = Pipeline::new(SizeOcr::default())
        .with_options(PipelineOptions::new().with_parallel(true))
        .run(&doc)
        .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(parallel.images.len(), 12);
}

#[test]
fn test_stages_reported_in_order() {
    let data = PdfBuilder::new().page(Page::prose("x").gray_image(2, 2)).build();
    let mut stages = Vec::new();

    Pipeline::new(SizeOcr::default())
        .run_observed(&open(&data), |stage| stages.push(stage))
        .unwrap();

    assert_eq!(
        stages,
        vec![
            Stage::Start,
            Stage::TextExtracted,
            Stage::ImagesExtracted,
            Stage::OcrApplied,
            Stage::Assembled
        ]
    );
}
