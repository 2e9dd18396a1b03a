//! PDF writer: one page per image

use crate::constants::{PAGE_IMAGE_NAME, PRODUCER, px_to_pt};
use crate::types::*;
use chrono::Utc;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;

use super::EncodeOptions;

/// Encode images as a paginated PDF, one page per image in the given order.
///
/// Each page's MediaBox is the image size at `options.dpi`, and the image
/// fills the page.
pub fn encode(pages: &[RawImage], options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
    if pages.is_empty() {
        return Err(CodecError::NoPages);
    }
    if let Some(page) = pages.iter().find(|p| !p.format().has_color()) {
        return Err(CodecError::UnsupportedImage(page.format()));
    }

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages.len());
    for image in pages {
        let page_id = add_image_page(&mut doc, image, pages_id, options.dpi)?;
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(info_dictionary(options));
    doc.trailer.set("Info", info_id);

    let mut writer = Vec::new();
    doc.save_to(&mut writer)?;
    log::debug!(
        "Encoded {} page(s) into {} bytes",
        pages.len(),
        writer.len()
    );
    Ok(writer)
}

/// Add a page that draws `image` across its whole MediaBox
fn add_image_page(
    doc: &mut Document,
    image: &RawImage,
    parent: ObjectId,
    dpi: f32,
) -> Result<ObjectId, CodecError> {
    let width_pt = px_to_pt(image.width(), dpi);
    let height_pt = px_to_pt(image.height(), dpi);

    let image_id = add_image_xobject(doc, image)?;

    let content = format!(
        "q {} 0 0 {} 0 0 cm /{} Do Q\n",
        width_pt, height_pt, PAGE_IMAGE_NAME
    );
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut xobjects = Dictionary::new();
    xobjects.set(PAGE_IMAGE_NAME, Object::Reference(image_id));
    let resources = Dictionary::from_iter(vec![("XObject", Object::Dictionary(xobjects))]);

    let page_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(parent)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width_pt),
                Object::Real(height_pt),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("Contents", Object::Reference(content_id)),
    ]));
    Ok(page_id)
}

/// Split interleaved pixels into color and alpha planes and store them as an
/// image XObject (with an SMask when the image has alpha).
fn add_image_xobject(doc: &mut Document, image: &RawImage) -> Result<ObjectId, CodecError> {
    let format = image.format();
    let color_channels = format.color_channels();
    let color_space: &[u8] = if color_channels == 1 {
        b"DeviceGray"
    } else {
        b"DeviceRGB"
    };

    let (color, alpha) = if format.has_alpha() {
        let channels = format.channels();
        let pixel_count = image.width() as usize * image.height() as usize;
        let mut color = Vec::with_capacity(pixel_count * color_channels);
        let mut alpha = Vec::with_capacity(pixel_count);
        for px in image.pixels().chunks_exact(channels) {
            color.extend_from_slice(&px[..color_channels]);
            alpha.push(px[color_channels]);
        }
        (color, Some(alpha))
    } else {
        (image.pixels().to_vec(), None)
    };

    let mut dict = image_dictionary(image.width(), image.height(), color_space);
    if let Some(alpha) = alpha {
        let smask = Stream::new(
            image_dictionary(image.width(), image.height(), b"DeviceGray"),
            deflate(&alpha)?,
        );
        let smask_id = doc.add_object(smask);
        dict.set("SMask", Object::Reference(smask_id));
    }

    Ok(doc.add_object(Stream::new(dict, deflate(&color)?)))
}

fn image_dictionary(width: u32, height: u32, color_space: &[u8]) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"FlateDecode".to_vec())),
    ])
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn info_dictionary(options: &EncodeOptions) -> Dictionary {
    let mut info = Dictionary::new();
    if let Some(title) = &options.title {
        info.set("Title", text_string(title));
    }
    info.set("Producer", text_string(PRODUCER));
    let now = Utc::now().format("D:%Y%m%d%H%M%S+00'00'").to_string();
    info.set("CreationDate", Object::string_literal(now));
    info
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::string_literal(text)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}
