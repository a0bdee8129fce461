//! Synthetic PDFs for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// An image placed on a test page.
#[derive(Debug, Clone)]
pub enum TestImage {
    /// Valid 8-bit gray samples of the given size
    Gray(u32, u32),
    /// A JPEG-labelled stream that does not decode
    Corrupt,
}

/// One page of a test document.
#[derive(Debug, Clone, Default)]
pub struct TestPage {
    pub lines: Vec<(f32, f32, String)>,
    pub images: Vec<TestImage>,
    /// Draw images in reverse resource order
    pub reverse_draw: bool,
    /// `/Contents` is not a stream
    pub unreadable: bool,
}

impl TestPage {
    pub fn text(text: &str) -> Self {
        Self::default().line(72.0, 700.0, text)
    }

    /// A page whose content cannot be read.
    pub fn unreadable() -> Self {
        Self {
            unreadable: true,
            ..Self::default()
        }
    }

    pub fn line(mut self, x: f32, y: f32, text: &str) -> Self {
        self.lines.push((x, y, text.to_string()));
        self
    }

    pub fn image(mut self, image: TestImage) -> Self {
        self.images.push(image);
        self
    }
}

/// Build a PDF with one Helvetica font shared by all pages.
pub fn build_pdf(pages: &[TestPage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids = Vec::new();
    for page in pages {
        let page_id = add_page(&mut doc, pages_id, font_id, page);
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

fn add_page(doc: &mut Document, pages_id: ObjectId, font_id: ObjectId, page: &TestPage) -> ObjectId {
    let mut operations = Vec::new();
    for (x, y, text) in &page.lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    let mut xobjects = Dictionary::new();
    let mut names = Vec::new();
    for (i, image) in page.images.iter().enumerate() {
        let name = format!("Im{}", i + 1);
        xobjects.set(name.clone(), doc.add_object(image_stream(image)));
        names.push(name);
    }
    if page.reverse_draw {
        names.reverse();
    }
    for name in names {
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "cm",
            vec![50.into(), 0.into(), 0.into(), 50.into(), 100.into(), 100.into()],
        ));
        operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        operations.push(Operation::new("Q", vec![]));
    }

    let content = Content { operations }.encode().unwrap();
    let content_id = if page.unreadable {
        doc.add_object(Object::Integer(7))
    } else {
        doc.add_object(Stream::new(dictionary! {}, content))
    };
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => xobjects,
    });

    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    })
}

fn image_stream(image: &TestImage) -> Stream {
    match image {
        TestImage::Gray(w, h) => Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => *w as i64,
                "Height" => *h as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![128; (*w * *h) as usize],
        ),
        TestImage::Corrupt => Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            b"not a jpeg".to_vec(),
        ),
    }
}
