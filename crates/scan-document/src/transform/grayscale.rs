//! Grayscale filter.
//!
//! Desaturates color channels to zero saturation. Luminance is computed with
//! Rec. 709 weights and written back to every color channel, so the output
//! keeps the input's pixel format and alpha untouched.

use crate::constants::{LUMA_WEIGHT_B, LUMA_WEIGHT_G, LUMA_WEIGHT_R, LUMA_WEIGHT_TOTAL};
use crate::types::*;

/// Remove all color saturation from an image.
///
/// Gray formats are already desaturated and come back unchanged. Applying
/// the filter twice yields the same pixels as applying it once.
///
/// # Errors
///
/// [`TransformError::UnsupportedFormat`] for formats without a color channel.
pub fn to_grayscale(image: &RawImage) -> Result<RawImage> {
    let format = image.format();
    match format {
        PixelFormat::Alpha8 => Err(TransformError::UnsupportedFormat(format)),
        PixelFormat::Gray8 | PixelFormat::GrayAlpha8 => Ok(image.clone()),
        PixelFormat::Rgb8 | PixelFormat::Rgba8 => {
            let channels = format.channels();
            let mut pixels = image.pixels().to_vec();
            for px in pixels.chunks_exact_mut(channels) {
                let y = luma(px[0], px[1], px[2]);
                px[0] = y;
                px[1] = y;
                px[2] = y;
            }
            Ok(RawImage::from_parts(
                image.width(),
                image.height(),
                format,
                pixels,
            ))
        }
    }
}

/// Rec. 709 luminance of an sRGB triple, rounded to nearest
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let sum = LUMA_WEIGHT_R * r as u32 + LUMA_WEIGHT_G * g as u32 + LUMA_WEIGHT_B * b as u32;
    ((sum + LUMA_WEIGHT_TOTAL / 2) / LUMA_WEIGHT_TOTAL) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_pixels_unchanged() {
        for v in [0u8, 1, 127, 128, 254, 255] {
            assert_eq!(luma(v, v, v), v);
        }
    }

    #[test]
    fn test_primaries() {
        assert_eq!(luma(255, 0, 0), 54);
        assert_eq!(luma(0, 255, 0), 182);
        assert_eq!(luma(0, 0, 255), 18);
    }

    #[test]
    fn test_alpha_preserved() {
        let img = RawImage::new(1, 1, PixelFormat::Rgba8, vec![255, 0, 0, 77]).unwrap();
        let gray = to_grayscale(&img).unwrap();
        assert_eq!(gray.pixels(), &[54, 54, 54, 77]);
        assert_eq!(gray.format(), PixelFormat::Rgba8);
    }

    #[test]
    fn test_gray_passthrough() {
        let img = RawImage::new(2, 1, PixelFormat::GrayAlpha8, vec![9, 200, 33, 0]).unwrap();
        assert_eq!(to_grayscale(&img).unwrap(), img);
    }

    #[test]
    fn test_mask_rejected() {
        let img = RawImage::filled(2, 2, PixelFormat::Alpha8, &[255]).unwrap();
        assert_eq!(
            to_grayscale(&img),
            Err(TransformError::UnsupportedFormat(PixelFormat::Alpha8))
        );
    }
}
