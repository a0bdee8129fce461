//! Positioned text spans from page content streams.
//!
//! The table detector works on where text sits on the page, not on the
//! reading-order string lopdf produces, so this module walks the text
//! operators of a content stream and records each shown string together with
//! its origin and effective font size.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Encoding, Object, ObjectId};

use crate::error::{Error, Result};

use super::document::{decode_pdf_string, PdfDocument};

/// Rough glyph advance as a fraction of the font size, used to estimate
/// span widths without parsing font metrics.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// TJ adjustments beyond this many thousandths of an em read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A text span with position and style information.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated width of the text
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
    /// Base font name (e.g., "Helvetica-Bold")
    pub font_name: String,
}

impl TextSpan {
    /// Create a new text span; width is estimated from the character count.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: String) -> Self {
        let width = text.chars().count() as f32 * font_size * AVG_GLYPH_WIDTH;
        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name,
        }
    }

    /// Right edge of the span.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Walks page content streams and collects [`TextSpan`]s.
pub struct SpanExtractor<'a> {
    doc: &'a PdfDocument,
}

impl<'a> SpanExtractor<'a> {
    /// Create an extractor over an opened document.
    pub fn new(doc: &'a PdfDocument) -> Self {
        Self { doc }
    }

    /// Extract the positioned spans of one page.
    pub fn page_spans(&self, page_num: u32, page_id: ObjectId) -> Result<Vec<TextSpan>> {
        let raw = self.doc.raw();
        let fonts = raw
            .get_page_fonts(page_id)
            .map_err(|e| Error::DocumentParse(format!("Page {}: {}", page_num, e)))?;

        let content = self.doc.page_content(page_id)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let content = Content::decode(&content)
            .map_err(|e| Error::DocumentParse(format!("Page {}: {}", page_num, e)))?;

        Ok(walk_operations(raw, &fonts, &content))
    }
}

/// Font state selected by the last `Tf`.
struct FontState<'d> {
    base_name: String,
    size: f32,
    encoding: Option<Encoding<'d>>,
}

fn walk_operations<'d>(
    doc: &'d LopdfDocument,
    fonts: &BTreeMap<Vec<u8>, &'d Dictionary>,
    content: &Content,
) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    let mut font = FontState {
        base_name: String::new(),
        size: 12.0,
        encoding: None,
    };
    let mut matrix = TextMatrix::default();
    let mut in_text = false;

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                in_text = true;
                matrix = TextMatrix::default();
            }
            "ET" => in_text = false,
            "Tf" if operands.len() >= 2 => {
                if let Object::Name(resource) = &operands[0] {
                    let dict = fonts.get(resource.as_slice());
                    font.base_name = dict
                        .and_then(|d| d.get(b"BaseFont").ok())
                        .and_then(|o| o.as_name().ok())
                        .map(|n| String::from_utf8_lossy(n).to_string())
                        .unwrap_or_else(|| String::from_utf8_lossy(resource).to_string());
                    font.encoding = dict.and_then(|d| d.get_font_encoding(doc).ok());
                }
                font.size = number(&operands[1]).unwrap_or(12.0);
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    matrix.leading = leading;
                }
            }
            "Td" | "TD" if operands.len() >= 2 => {
                let tx = number(&operands[0]).unwrap_or(0.0);
                let ty = number(&operands[1]).unwrap_or(0.0);
                if op.operator == "TD" {
                    matrix.leading = -ty;
                }
                matrix.translate(tx, ty);
            }
            "Tm" if operands.len() >= 6 => {
                let n: Vec<f32> = operands.iter().take(6).map(|o| number(o).unwrap_or(0.0)).collect();
                matrix.set(n[0], n[1], n[2], n[3], n[4], n[5]);
            }
            "T*" => matrix.next_line(),
            "Tj" | "TJ" | "'" | "\"" if in_text => {
                if op.operator == "'" || op.operator == "\"" {
                    matrix.next_line();
                }
                let shown = match op.operator.as_str() {
                    "\"" => operands.get(2),
                    _ => operands.first(),
                };
                let text = shown.map(|o| shown_text(o, &font)).unwrap_or_default();
                if !text.trim().is_empty() {
                    let (x, y) = matrix.position();
                    spans.push(TextSpan::new(
                        text,
                        x,
                        y,
                        font.size * matrix.scale(),
                        font.base_name.clone(),
                    ));
                }
            }
            _ => {}
        }
    }

    spans
}

/// Decode the operand of a text-showing operator.
///
/// TJ arrays interleave strings with kerning adjustments; large negative
/// adjustments become spaces except between spaceless-script characters.
fn shown_text(operand: &Object, font: &FontState<'_>) -> String {
    match operand {
        Object::String(bytes, _) => decode_with(font, bytes),
        Object::Array(items) => {
            let mut combined = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => combined.push_str(&decode_with(font, bytes)),
                    other => {
                        let adjustment = -number(other).unwrap_or(0.0);
                        let wants_space = adjustment > TJ_SPACE_THRESHOLD
                            && combined
                                .chars()
                                .last()
                                .is_some_and(|c| !c.is_whitespace() && !is_spaceless_script_char(c));
                        if wants_space {
                            combined.push(' ');
                        }
                    }
                }
            }
            combined
        }
        _ => String::new(),
    }
}

fn decode_with(font: &FontState<'_>, bytes: &[u8]) -> String {
    match &font.encoding {
        Some(enc) => LopdfDocument::decode_text(enc, bytes).unwrap_or_else(|_| decode_pdf_string(bytes)),
        None => decode_pdf_string(bytes),
    }
}

/// Text matrix state (Tm plus line origin tracking).
#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            leading: 12.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        let leading = self.leading;
        *self = Self {
            a,
            b,
            c,
            d,
            e,
            f,
            leading,
        };
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Scripts written without spaces between words (Han, kana, CJK punctuation).
/// Hangul is excluded: Korean separates words with spaces.
fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x3000..=0x303F
        | 0x3040..=0x309F
        | 0x30A0..=0x30FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0x20000..=0x2EBEF)
}
