//! Inspection of stored documents: page count, page images and thumbnails

use crate::constants::PAGE_IMAGE_NAME;
use crate::types::*;
use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document, Object, Stream};
use std::io::Read;

/// Count the pages of a document without decoding any page content
pub fn page_count(bytes: &[u8]) -> Result<usize, CodecError> {
    let doc = Document::load_mem(bytes)?;
    Ok(doc.get_pages().len())
}

/// Decode the scanned image drawn on page `index` (zero-based).
///
/// Only pages produced by [`encode`](super::encode) are understood: one
/// 8-bit gray or RGB image XObject, optionally with a soft mask.
pub fn page_image(bytes: &[u8], index: usize) -> Result<RawImage, CodecError> {
    let doc = Document::load_mem(bytes)?;
    let pages = doc.get_pages();
    let count = pages.len();
    let page_id = *pages
        .values()
        .nth(index)
        .ok_or(CodecError::PageOutOfRange { index, count })?;

    let page = doc.get_dictionary(page_id)?;
    let missing = || CodecError::MissingImage(index);

    let resources = resolve(&doc, page.get(b"Resources").map_err(|_| missing())?)?
        .as_dict()
        .map_err(|_| missing())?;
    let xobjects = resolve(&doc, resources.get(b"XObject").map_err(|_| missing())?)?
        .as_dict()
        .map_err(|_| missing())?;
    let image = resolve(
        &doc,
        xobjects
            .get(PAGE_IMAGE_NAME.as_bytes())
            .map_err(|_| missing())?,
    )?
    .as_stream()
    .map_err(|_| missing())?;

    let (width, height, color_channels) = image_layout(&image.dict).ok_or_else(missing)?;
    let color = stream_data(image)?;

    let alpha = match image.dict.get(b"SMask") {
        Ok(obj) => {
            let mask = resolve(&doc, obj)?.as_stream().map_err(|_| missing())?;
            Some(stream_data(mask)?)
        }
        Err(_) => None,
    };

    let format = match (color_channels, alpha.is_some()) {
        (1, false) => PixelFormat::Gray8,
        (1, true) => PixelFormat::GrayAlpha8,
        (_, false) => PixelFormat::Rgb8,
        (_, true) => PixelFormat::Rgba8,
    };

    let pixels = match alpha {
        None => color,
        Some(alpha) => interleave(&color, &alpha, color_channels),
    };
    Ok(RawImage::new(width, height, format, pixels)?)
}

/// Render a thumbnail of the first page that fits within `max_edge` pixels.
///
/// Images already small enough are returned unscaled.
pub fn thumbnail(bytes: &[u8], max_edge: u32) -> Result<RawImage, CodecError> {
    let image = page_image(bytes, 0)?;
    let max_edge = max_edge.max(1);
    if image.width() <= max_edge && image.height() <= max_edge {
        return Ok(image);
    }
    let scaled = image.to_dynamic()?.thumbnail(max_edge, max_edge);
    Ok(RawImage::try_from(scaled)?)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, CodecError> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Width, height and color channel count of an 8-bit image dictionary
fn image_layout(dict: &Dictionary) -> Option<(u32, u32, usize)> {
    let width = dict.get(b"Width").and_then(Object::as_i64).ok()?;
    let height = dict.get(b"Height").and_then(Object::as_i64).ok()?;
    let bpc = dict.get(b"BitsPerComponent").and_then(Object::as_i64).ok()?;
    if bpc != 8 {
        return None;
    }
    let channels = match dict.get(b"ColorSpace").and_then(Object::as_name).ok()? {
        b"DeviceGray" => 1,
        b"DeviceRGB" => 3,
        _ => return None,
    };
    Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?, channels))
}

/// Raw stream bytes, inflated when the stream is Flate-encoded
fn stream_data(stream: &Stream) -> Result<Vec<u8>, CodecError> {
    let flate = matches!(
        stream.dict.get(b"Filter").and_then(Object::as_name),
        Ok(b"FlateDecode")
    );
    if !flate {
        return Ok(stream.content.clone());
    }
    let mut decoded = Vec::new();
    ZlibDecoder::new(stream.content.as_slice())
        .read_to_end(&mut decoded)
        .map_err(CodecError::Decode)?;
    Ok(decoded)
}

fn interleave(color: &[u8], alpha: &[u8], color_channels: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(color.len() + alpha.len());
    for (px, a) in color.chunks_exact(color_channels).zip(alpha) {
        pixels.extend_from_slice(px);
        pixels.push(*a);
    }
    pixels
}
