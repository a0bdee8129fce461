//! Image XObject decoding into pixels.

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document as LopdfDocument, Object, Stream};

use crate::error::{Error, Result};

/// Decode an image XObject stream.
///
/// JPEG data is handed to the `image` crate; everything else must be raw
/// (optionally Flate/LZW-compressed) samples in a color space listed in
/// [`ColorSpace`].
pub fn decode_image(doc: &LopdfDocument, stream: &Stream) -> Result<DynamicImage> {
    let dict = &stream.dict;
    let filters = filter_names(doc, dict);

    if filters.iter().any(|f| f == "DCTDecode") {
        if filters.len() != 1 {
            return Err(Error::ImageDecode(format!(
                "unsupported filter chain {:?}",
                filters
            )));
        }
        return Ok(image::load_from_memory_with_format(
            &stream.content,
            ImageFormat::Jpeg,
        )?);
    }

    if let Some(f) = filters
        .iter()
        .find(|f| !matches!(f.as_str(), "FlateDecode" | "LZWDecode"))
    {
        return Err(Error::ImageDecode(format!("unsupported filter {}", f)));
    }

    let width = dimension(dict, b"Width")?;
    let height = dimension(dict, b"Height")?;
    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        decompress_samples(stream)?
    };

    let is_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    let inverted = decode_inverted(doc, dict);

    if is_mask {
        // Stencil masks paint where the sample is 0, the same way 1-bit
        // gray renders black.
        return bilevel(&samples, width, height, inverted);
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    let color_space = ColorSpace::from_dict(doc, dict)?;

    match (bits, color_space) {
        (1, ColorSpace::Gray) => bilevel(&samples, width, height, inverted),
        (8, space) => from_samples(&samples, width, height, &space),
        (bits, space) => Err(Error::ImageDecode(format!(
            "{} bits per component in {} is not supported",
            bits,
            space.name()
        ))),
    }
}

/// Color spaces whose samples can be turned into pixels.
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette of `base` colors, `hival + 1` entries
    Indexed { base: Box<ColorSpace>, lookup: Vec<u8> },
}

impl ColorSpace {
    fn from_dict(doc: &LopdfDocument, dict: &Dictionary) -> Result<Self> {
        match dict.get(b"ColorSpace") {
            Ok(obj) => Self::from_object(doc, obj),
            // JPX is the only filter allowed to omit it and is rejected earlier.
            Err(_) => Ok(ColorSpace::Gray),
        }
    }

    fn from_object(doc: &LopdfDocument, obj: &Object) -> Result<Self> {
        match resolve(doc, obj) {
            Some(Object::Name(name)) => Self::from_name(name),
            Some(Object::Array(items)) => Self::from_array(doc, items),
            _ => Err(Error::ImageDecode("malformed color space".to_string())),
        }
    }

    fn from_name(name: &[u8]) -> Result<Self> {
        match name {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorSpace::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorSpace::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorSpace::Cmyk),
            other => Err(Error::ImageDecode(format!(
                "unsupported color space {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    fn from_array(doc: &LopdfDocument, items: &[Object]) -> Result<Self> {
        let family = items
            .first()
            .and_then(|o| o.as_name().ok())
            .ok_or_else(|| Error::ImageDecode("malformed color space".to_string()))?;

        match family {
            b"ICCBased" => {
                let n = items
                    .get(1)
                    .and_then(|o| resolve(doc, o))
                    .and_then(|o| o.as_stream().ok())
                    .and_then(|s| s.dict.get(b"N").ok())
                    .and_then(|n| n.as_i64().ok());
                match n {
                    Some(1) => Ok(ColorSpace::Gray),
                    Some(3) => Ok(ColorSpace::Rgb),
                    Some(4) => Ok(ColorSpace::Cmyk),
                    other => Err(Error::ImageDecode(format!(
                        "ICC profile with {:?} components",
                        other
                    ))),
                }
            }
            b"Indexed" | b"I" if items.len() >= 4 => {
                let base = Self::from_object(doc, &items[1])?;
                if matches!(base, ColorSpace::Indexed { .. }) {
                    return Err(Error::ImageDecode("nested indexed color space".to_string()));
                }
                let lookup = match resolve(doc, &items[3]) {
                    Some(Object::String(bytes, _)) => bytes.clone(),
                    Some(Object::Stream(s)) => s
                        .decompressed_content()
                        .unwrap_or_else(|_| s.content.clone()),
                    _ => return Err(Error::ImageDecode("missing palette".to_string())),
                };
                Ok(ColorSpace::Indexed {
                    base: Box::new(base),
                    lookup,
                })
            }
            // CalGray/CalRGB arrays carry a parameter dictionary we can ignore.
            name => Self::from_name(name),
        }
    }

    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ColorSpace::Gray => "DeviceGray",
            ColorSpace::Rgb => "DeviceRGB",
            ColorSpace::Cmyk => "DeviceCMYK",
            ColorSpace::Indexed { .. } => "Indexed",
        }
    }
}

/// 8-bit samples to pixels.
fn from_samples(data: &[u8], width: u32, height: u32, space: &ColorSpace) -> Result<DynamicImage> {
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| Error::ImageDecode("image dimensions overflow".to_string()))?;
    let expected = pixels
        .checked_mul(space.components())
        .ok_or_else(|| Error::ImageDecode("image dimensions overflow".to_string()))?;
    if data.len() < expected {
        return Err(Error::ImageDecode(format!(
            "expected {} bytes of {} samples, found {}",
            expected,
            space.name(),
            data.len()
        )));
    }
    let data = &data[..expected];

    let image = match space {
        ColorSpace::Gray => DynamicImage::ImageLuma8(gray(width, height, data.to_vec())?),
        ColorSpace::Rgb => DynamicImage::ImageRgb8(rgb(width, height, data.to_vec())?),
        ColorSpace::Cmyk => {
            DynamicImage::ImageRgb8(rgb(width, height, data.chunks_exact(4).flat_map(cmyk_to_rgb).collect())?)
        }
        ColorSpace::Indexed { base, lookup } => {
            let n = base.components();
            let mut expanded = Vec::with_capacity(expected.saturating_mul(n));
            for &index in data {
                let start = index as usize * n;
                let entry = lookup
                    .get(start..start + n)
                    .ok_or_else(|| Error::ImageDecode(format!("palette index {} out of range", index)))?;
                expanded.extend_from_slice(entry);
            }
            from_samples(&expanded, width, height, base)?
        }
    };

    Ok(image)
}

/// 1-bit samples, rows padded to whole bytes. With `ones_dark` a set bit
/// becomes black.
fn bilevel(data: &[u8], width: u32, height: u32, ones_dark: bool) -> Result<DynamicImage> {
    let stride = (width as usize).div_ceil(8);
    let expected = stride
        .checked_mul(height as usize)
        .ok_or_else(|| Error::ImageDecode("image dimensions overflow".to_string()))?;
    if data.len() < expected {
        return Err(Error::ImageDecode(format!(
            "expected {} bytes of 1-bit samples, found {}",
            expected,
            data.len()
        )));
    }

    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for row in data[..expected].chunks_exact(stride) {
        for x in 0..width as usize {
            let set = row[x / 8] & (0x80 >> (x % 8)) != 0;
            pixels.push(if set == ones_dark { 0 } else { 255 });
        }
    }

    Ok(DynamicImage::ImageLuma8(gray(width, height, pixels)?))
}

/// Flate/LZW samples of an image stream, with `DecodeParms` predictors applied.
///
/// lopdf refuses to decompress streams marked `/Subtype /Image`, so the
/// samples are taken from a copy without that entry.
fn decompress_samples(stream: &Stream) -> Result<Vec<u8>> {
    let mut plain = stream.clone();
    plain.dict.remove(b"Subtype");
    plain
        .decompressed_content()
        .map_err(|e| Error::ImageDecode(format!("cannot decompress samples: {}", e)))
}

fn gray(width: u32, height: u32, data: Vec<u8>) -> Result<GrayImage> {
    GrayImage::from_raw(width, height, data)
        .ok_or_else(|| Error::ImageDecode("sample buffer too small".to_string()))
}

fn rgb(width: u32, height: u32, data: Vec<u8>) -> Result<RgbImage> {
    RgbImage::from_raw(width, height, data)
        .ok_or_else(|| Error::ImageDecode("sample buffer too small".to_string()))
}

fn cmyk_to_rgb(px: &[u8]) -> [u8; 3] {
    let k = 255 - px[3] as u16;
    let channel = |c: u8| ((255 - c as u16) * k / 255) as u8;
    [channel(px[0]), channel(px[1]), channel(px[2])]
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_i64().ok())
        .filter(|v| *v > 0 && *v <= u32::MAX as i64)
        .map(|v| v as u32)
        .ok_or_else(|| {
            Error::ImageDecode(format!(
                "missing or invalid /{}",
                String::from_utf8_lossy(key)
            ))
        })
}

/// Filter names in application order.
fn filter_names(doc: &LopdfDocument, dict: &Dictionary) -> Vec<String> {
    let name = |o: &Object| o.as_name_str().ok().map(str::to_string);
    match dict.get(b"Filter").ok().and_then(|o| resolve(doc, o)) {
        Some(Object::Array(items)) => items.iter().filter_map(name).collect(),
        Some(other) => name(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// A `/Decode [1 0]` array flips the meaning of samples.
fn decode_inverted(doc: &LopdfDocument, dict: &Dictionary) -> bool {
    let Some(Object::Array(decode)) = dict.get(b"Decode").ok().and_then(|o| resolve(doc, o)) else {
        return false;
    };
    let bound = |i: usize| decode.get(i).and_then(|o| o.as_float().ok());
    matches!((bound(0), bound(1)), (Some(lo), Some(hi)) if lo > hi)
}

fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}
