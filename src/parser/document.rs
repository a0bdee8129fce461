//! Opened PDF document handle, backed by lopdf.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::detect::{sniff_bytes, sniff_path, PdfHeader};
use crate::error::{Error, Result};
use crate::model::DocumentInfo;

/// An opened, read-only PDF document.
///
/// The handle owns the parsed object graph for the lifetime of one request
/// and releases it on drop, whichever way the request ends.
pub struct PdfDocument {
    doc: LopdfDocument,
    header: PdfHeader,
}

impl PdfDocument {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let header = sniff_path(path)?;
        let doc = LopdfDocument::load(path).map_err(parse_error)?;
        Ok(Self::wrap(doc, header))
    }

    /// Open a PDF held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = sniff_bytes(data)?;
        let doc = LopdfDocument::load_mem(data).map_err(parse_error)?;
        Ok(Self::wrap(doc, header))
    }

    /// Open a PDF from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    fn wrap(doc: LopdfDocument, header: PdfHeader) -> Self {
        if doc.is_encrypted() {
            log::warn!("Document is encrypted; extracted text may be incomplete");
        }
        log::debug!(
            "Opened {} with {} pages",
            header,
            doc.get_pages().len()
        );
        Self { doc, header }
    }

    /// The sniffed `%PDF-` header.
    pub fn header(&self) -> &PdfHeader {
        &self.header
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Page numbers (1-indexed) mapped to their object ids, in page order.
    pub(crate) fn pages(&self) -> BTreeMap<u32, ObjectId> {
        self.doc.get_pages()
    }

    pub(crate) fn raw(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Extract the prose text of one page.
    ///
    /// Pages without a text layer yield an empty string.
    pub fn page_text(&self, page_num: u32) -> Result<String> {
        let text = self
            .doc
            .extract_text(&[page_num])
            .map_err(|e| Error::DocumentParse(format!("Page {}: {}", page_num, e)))?;
        Ok(text.trim_end_matches(&['\n', '\r'][..]).to_string())
    }

    /// Decompressed content stream bytes of a page.
    ///
    /// Array contents are concatenated with a separating space. A page with
    /// no `/Contents` entry has an empty stream.
    pub(crate) fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r)? {
                Object::Stream(s) => Ok(stream_bytes(s)),
                Object::Array(arr) => Ok(self.concat_streams(arr)),
                _ => Err(Error::DocumentParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => Ok(self.concat_streams(arr)),
            _ => Err(Error::DocumentParse("Invalid content stream".to_string())),
        }
    }

    fn concat_streams(&self, parts: &[Object]) -> Vec<u8> {
        let mut content = Vec::new();
        for obj in parts {
            if let Ok(r) = obj.as_reference() {
                if let Ok(Object::Stream(s)) = self.doc.get_object(r) {
                    content.extend_from_slice(&stream_bytes(s));
                    content.push(b' ');
                }
            }
        }
        content
    }

    /// Resource dictionary of a page, following `/Parent` inheritance.
    pub(crate) fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut visited = HashSet::new();
        let mut current = page_id;

        while visited.insert(current) {
            let node = self.doc.get_dictionary(current).ok()?;
            if let Ok(res) = node.get(b"Resources") {
                if let Some(dict) = self.resolve_dict(res) {
                    return Some(dict);
                }
            }
            current = node.get(b"Parent").ok()?.as_reference().ok()?;
        }

        None
    }

    /// Follow a reference (if any) to a dictionary.
    pub(crate) fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Reference(r) => match self.doc.get_object(*r).ok()? {
                Object::Dictionary(d) => Some(d),
                Object::Stream(s) => Some(&s.dict),
                _ => None,
            },
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Collect descriptive document information.
    pub fn info(&self) -> DocumentInfo {
        let mut info = DocumentInfo::with_version(self.doc.version.to_string());
        info.page_count = self.page_count();
        info.encrypted = self.doc.is_encrypted();

        let info_dict = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|obj| self.resolve_dict(obj));

        if let Some(dict) = info_dict {
            info.title = get_string_from_dict(dict, b"Title");
            info.author = get_string_from_dict(dict, b"Author");
            info.subject = get_string_from_dict(dict, b"Subject");
            info.creator = get_string_from_dict(dict, b"Creator");
            info.producer = get_string_from_dict(dict, b"Producer");
            info.created = get_string_from_dict(dict, b"CreationDate")
                .as_deref()
                .and_then(parse_pdf_date);
            info.modified = get_string_from_dict(dict, b"ModDate")
                .as_deref()
                .and_then(parse_pdf_date);
        }

        info
    }
}

fn parse_error(err: lopdf::Error) -> Error {
    match err {
        lopdf::Error::Decryption(_) => Error::Encrypted,
        lopdf::Error::IO(e) => Error::DocumentParse(e.to_string()),
        other => Error::DocumentParse(other.to_string()),
    }
}

/// Stream payload, decompressed when lopdf knows the filter.
pub(crate) fn stream_bytes(stream: &lopdf::Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8, or Latin-1).
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let utf16: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let field = |range: std::ops::Range<usize>, default: u32| {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };

    chrono::NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1))
        .and_then(|date| date.and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0)))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}
