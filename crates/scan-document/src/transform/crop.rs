//! Crop rectangle mapping and pixel cropping.
//!
//! The crop rectangle arrives in display coordinates: the space of the
//! on-screen, possibly scaled and offset, rendering of the image. Before
//! cropping it is mapped into pixel space of the same (already rotated)
//! image:
//!
//! ```text
//! pixel = (display - display_origin) * display_scale
//! ```

use crate::types::*;

/// Map a display-space rectangle to a pixel rectangle within `bounds`.
///
/// `bounds` is the `(width, height)` of the image the rectangle was drawn
/// over. The mapped rectangle is grown outward to whole pixels and then
/// clamped to the image, so the result always lies inside it.
///
/// # Errors
///
/// - [`TransformError::InvalidScale`] if `scale` is not positive and finite
/// - [`TransformError::EmptyCrop`] if nothing of the rectangle overlaps the image
pub fn map_display_rect_to_pixel_rect(
    rect: Rect,
    origin: Point,
    scale: f64,
    bounds: (u32, u32),
) -> Result<PixelRect> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(TransformError::InvalidScale(scale));
    }

    let (width, height) = (bounds.0 as f64, bounds.1 as f64);

    // Normalize negative sizes from drags that crossed over the anchor
    let (x0, x1) = ordered(rect.x, rect.right());
    let (y0, y1) = ordered(rect.y, rect.bottom());

    let left = ((x0 - origin.x) * scale).floor();
    let top = ((y0 - origin.y) * scale).floor();
    let right = ((x1 - origin.x) * scale).ceil();
    let bottom = ((y1 - origin.y) * scale).ceil();

    if ![left, top, right, bottom].iter().all(|v| v.is_finite()) {
        return Err(TransformError::EmptyCrop);
    }

    let left = left.clamp(0.0, width);
    let top = top.clamp(0.0, height);
    let right = right.clamp(0.0, width);
    let bottom = bottom.clamp(0.0, height);

    if right <= left || bottom <= top {
        return Err(TransformError::EmptyCrop);
    }

    Ok(PixelRect::new(
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Copy the pixels inside `rect` into a new image.
///
/// `rect` must already be clamped to the image (see
/// [`map_display_rect_to_pixel_rect`]); this is re-checked rather than
/// silently clamped again.
pub fn crop(image: &RawImage, rect: PixelRect) -> Result<RawImage> {
    if rect.is_empty() {
        return Err(TransformError::EmptyCrop);
    }
    if !rect.fits_within(image.width(), image.height()) {
        return Err(TransformError::OutOfBounds {
            rect,
            width: image.width(),
            height: image.height(),
        });
    }

    // Full-image crop
    if rect == image.bounds() {
        return Ok(image.clone());
    }

    let channels = image.format().channels();
    let src_stride = image.width() as usize * channels;
    let row_len = rect.width as usize * channels;
    let mut output = Vec::with_capacity(row_len * rect.height as usize);

    for y in rect.y..rect.bottom() {
        let start = y as usize * src_stride + rect.x as usize * channels;
        output.extend_from_slice(&image.pixels()[start..start + row_len]);
    }

    Ok(RawImage::from_parts(
        rect.width,
        rect.height,
        image.format(),
        output,
    ))
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: a mapped rectangle always lies within the image.
        #[test]
        fn prop_mapped_rect_contained(
            (width, height) in (1u32..=400, 1u32..=400),
            (x, y, w, h) in (-500.0f64..500.0, -500.0f64..500.0, -300.0f64..300.0, -300.0f64..300.0),
            (ox, oy) in (-100.0f64..100.0, -100.0f64..100.0),
            scale in 0.01f64..8.0,
        ) {
            let rect = Rect::new(x, y, w, h);
            match map_display_rect_to_pixel_rect(rect, Point::new(ox, oy), scale, (width, height)) {
                Ok(px) => {
                    prop_assert!(!px.is_empty());
                    prop_assert!(px.fits_within(width, height));
                }
                Err(e) => prop_assert_eq!(e, TransformError::EmptyCrop),
            }
        }

        /// Property: rectangles entirely outside the image raise EmptyCrop.
        #[test]
        fn prop_disjoint_rect_is_empty(
            (width, height) in (1u32..=200, 1u32..=200),
            gap in 1.0f64..50.0,
            (w, h) in (1.0f64..50.0, 1.0f64..50.0),
        ) {
            let rect = Rect::new(width as f64 + gap, 0.0, w, h);
            let result = map_display_rect_to_pixel_rect(rect, Point::default(), 1.0, (width, height));
            prop_assert_eq!(result, Err(TransformError::EmptyCrop));
        }

        /// Property: cropping a mapped rectangle never fails and has its size.
        #[test]
        fn prop_crop_of_mapped_rect(
            (width, height) in (1u32..=60, 1u32..=60),
            (x, y, w, h) in (0.0f64..60.0, 0.0f64..60.0, 0.5f64..60.0, 0.5f64..60.0),
        ) {
            let img = RawImage::filled(width, height, PixelFormat::Rgb8, &[1, 2, 3]).unwrap();
            let rect = Rect::new(x, y, w, h);
            if let Ok(px) = map_display_rect_to_pixel_rect(rect, Point::default(), 1.0, (width, height)) {
                let out = crop(&img, px).unwrap();
                prop_assert_eq!(out.dimensions(), (px.width, px.height));
            }
        }
    }
}
