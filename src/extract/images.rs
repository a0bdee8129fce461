//! Embedded raster image extraction.

use std::collections::{btree_map, HashSet};
use std::vec;

use lopdf::content::Content;
use lopdf::{Dictionary, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::ExtractedImage;
use crate::parser::{stream_bytes, PdfDocument};

use super::decode::decode_image;

/// Extracts the image XObjects of each page, decoded to pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageExtractor;

impl ImageExtractor {
    /// Create a new image extractor.
    pub fn new() -> Self {
        Self
    }

    /// Lazily walk the document's images in (page, index) order.
    ///
    /// Images that fail to decode are logged and skipped.
    pub fn images<'a>(&self, doc: &'a PdfDocument) -> ImageStream<'a> {
        ImageStream {
            doc,
            pages: doc.pages().into_iter(),
            page: 0,
            pending: Vec::new().into_iter(),
            decoded: 0,
            skipped: 0,
        }
    }

    /// Number of image XObjects in the document, without decoding any.
    pub fn count(&self, doc: &PdfDocument) -> usize {
        doc.pages()
            .into_iter()
            .map(|(page, id)| page_images(doc, page, id).len())
            .sum()
    }
}

/// Iterator over the decodable images of one document.
pub struct ImageStream<'a> {
    doc: &'a PdfDocument,
    pages: btree_map::IntoIter<u32, ObjectId>,
    page: u32,
    pending: vec::IntoIter<(u32, ObjectId)>,
    decoded: usize,
    skipped: usize,
}

impl ImageStream<'_> {
    /// Images that failed to decode so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Images yielded so far.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    fn decode(&self, id: ObjectId) -> Result<image::DynamicImage> {
        let stream = self
            .doc
            .raw()
            .get_object(id)
            .and_then(Object::as_stream)
            .map_err(|e| Error::ImageDecode(e.to_string()))?;
        decode_image(self.doc.raw(), stream)
    }
}

impl Iterator for ImageStream<'_> {
    type Item = ExtractedImage;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((index, id)) = self.pending.next() {
                match self.decode(id) {
                    Ok(image) => {
                        self.decoded += 1;
                        return Some(ExtractedImage::new(self.page, index, image));
                    }
                    Err(e) => {
                        self.skipped += 1;
                        log::warn!(
                            "Skipping image {} on page {} ({} {} R): {}",
                            index,
                            self.page,
                            id.0,
                            id.1,
                            e
                        );
                        continue;
                    }
                }
            }

            let (page, page_id) = self.pages.next()?;
            self.page = page;
            self.pending = page_images(self.doc, page, page_id)
                .into_iter()
                .zip(1u32..)
                .map(|(id, index)| (index, id))
                .collect::<Vec<_>>()
                .into_iter();
        }
    }
}

/// Image XObjects of one page: drawn images in order of first `Do`, then
/// undrawn ones in resource order. Each object appears once.
fn page_images(doc: &PdfDocument, page: u32, page_id: ObjectId) -> Vec<ObjectId> {
    let Some(resources) = doc.page_resources(page_id) else {
        return Vec::new();
    };

    let content = match doc.page_content(page_id).and_then(|bytes| decode_content(&bytes)) {
        Ok(content) => Some(content),
        Err(e) => {
            log::debug!("Page {}: no draw order ({}), using resource order", page, e);
            None
        }
    };

    let mut walker = ImageWalker {
        doc,
        images: Vec::new(),
        seen: HashSet::new(),
        forms: HashSet::new(),
    };
    walker.walk(resources, content.as_ref());
    walker.images
}

fn decode_content(bytes: &[u8]) -> Result<Content> {
    Content::decode(bytes).map_err(|e| Error::DocumentParse(e.to_string()))
}

struct ImageWalker<'a> {
    doc: &'a PdfDocument,
    images: Vec<ObjectId>,
    seen: HashSet<ObjectId>,
    forms: HashSet<ObjectId>,
}

enum XObjectKind {
    Image,
    Form,
    Other,
}

impl<'a> ImageWalker<'a> {
    fn walk(&mut self, resources: &'a Dictionary, content: Option<&Content>) {
        let doc = self.doc;
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| doc.resolve_dict(o))
        else {
            return;
        };

        if let Some(content) = content {
            for op in content.operations.iter().filter(|op| op.operator == "Do") {
                let target = op
                    .operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .and_then(|name| xobjects.get(name).ok())
                    .and_then(|o| o.as_reference().ok());
                if let Some(id) = target {
                    self.visit(id, resources);
                }
            }
        }

        for (_, obj) in xobjects.iter() {
            if let Ok(id) = obj.as_reference() {
                self.visit(id, resources);
            }
        }
    }

    fn visit(&mut self, id: ObjectId, parent_resources: &'a Dictionary) {
        match self.kind(id) {
            XObjectKind::Image => {
                if self.seen.insert(id) {
                    self.images.push(id);
                }
            }
            XObjectKind::Form => {
                if !self.forms.insert(id) {
                    return;
                }
                let doc = self.doc;
                let Ok(form) = doc.raw().get_object(id).and_then(Object::as_stream) else {
                    return;
                };
                // Forms without their own resources inherit the caller's.
                let resources = form
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|o| doc.resolve_dict(o))
                    .unwrap_or(parent_resources);
                let content = decode_content(&stream_bytes(form)).ok();
                self.walk(resources, content.as_ref());
            }
            XObjectKind::Other => {}
        }
    }

    fn kind(&self, id: ObjectId) -> XObjectKind {
        let subtype = self
            .doc
            .raw()
            .get_object(id)
            .and_then(Object::as_stream)
            .ok()
            .and_then(|s| s.dict.get(b"Subtype").ok())
            .and_then(|o| o.as_name().ok());
        match subtype {
            Some(b"Image") => XObjectKind::Image,
            Some(b"Form") => XObjectKind::Form,
            _ => XObjectKind::Other,
        }
    }
}
