//! Shared fixtures for integration tests: synthetic PDFs and mock engines.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, GenericImageView};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use pdfharvest::{Error, OcrEngine, Result};

/// Builds a PDF page by page.
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    kids: Vec<Object>,
}

/// Content of one page.
#[derive(Default)]
pub struct Page {
    ops: Vec<Operation>,
    images: Vec<(String, Stream)>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page holding one line of prose.
    pub fn prose(text: &str) -> Self {
        Self::new().text(72.0, 720.0, text)
    }

    pub fn text(mut self, x: f32, y: f32, text: &str) -> Self {
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 11.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
        self
    }

    /// A grid of cells starting at (72, `top`), 20pt per row, 160pt per column.
    pub fn table(mut self, top: f32, rows: &[&[&str]]) -> Self {
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let x = 72.0 + 160.0 * c as f32;
                let y = top - 20.0 * r as f32;
                self = self.text(x, y, cell);
            }
        }
        self
    }

    /// A gray image whose pixel size identifies it in mock OCR output.
    pub fn gray_image(self, width: u32, height: u32) -> Self {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![200; (width * height) as usize],
        );
        self.draw(stream)
    }

    /// A gray image stored Flate-compressed, as most PDF writers emit them.
    pub fn flate_gray_image(self, width: u32, height: u32) -> Self {
        let mut stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![90; (width * height) as usize],
        );
        stream.compress().unwrap();
        assert!(stream.dict.get(b"Filter").is_ok(), "fixture must be compressed");
        self.draw(stream)
    }

    /// An image labelled as JPEG whose data does not decode.
    pub fn broken_image(self) -> Self {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 16,
                "Height" => 16,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            vec![0xFF, 0xD8, 0x00, 0x01, 0x02],
        );
        self.draw(stream)
    }

    fn draw(mut self, stream: Stream) -> Self {
        let name = format!("X{}", self.images.len() + 1);
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![100.into(), 0.into(), 0.into(), 100.into(), 72.into(), 72.into()],
            ),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        self.images.push((name, stream));
        self
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
            "Encoding" => "WinAnsiEncoding",
        });
        Self {
            doc,
            pages_id,
            font_id,
            kids: Vec::new(),
        }
    }

    pub fn page(mut self, page: Page) -> Self {
        let mut xobjects = Dictionary::new();
        for (name, stream) in page.images {
            let id = self.doc.add_object(stream);
            xobjects.set(name, id);
        }

        let content = Content { operations: page.ops }.encode().unwrap();
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => self.font_id },
                "XObject" => xobjects,
            },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        self.kids.push(Object::Reference(page_id));
        self
    }

    pub fn pages(self, pages: impl IntoIterator<Item = Page>) -> Self {
        pages.into_iter().fold(self, |b, p| b.page(p))
    }

    pub fn build(mut self) -> Vec<u8> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        self.doc.save_to(&mut out).unwrap();
        out
    }
}

/// Deterministic engine: reports the image size as "WxH" and counts calls.
#[derive(Default)]
pub struct SizeOcr {
    calls: AtomicUsize,
}

impl SizeOcr {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for SizeOcr {
    fn name(&self) -> &str {
        "size"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (w, h) = image.dimensions();
        Ok(format!("{}x{}", w, h))
    }
}

/// Returns the same text for every image.
pub struct ConstOcr(pub &'static str);

impl OcrEngine for ConstOcr {
    fn name(&self) -> &str {
        "const"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// An engine that cannot run.
pub struct MissingOcr;

impl OcrEngine for MissingOcr {
    fn name(&self) -> &str {
        "missing"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<String> {
        Err(Error::OcrUnavailable("engine not installed".to_string()))
    }
}
