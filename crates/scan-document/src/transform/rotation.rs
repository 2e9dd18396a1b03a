//! Image rotation about the image center.
//!
//! Angles are in degrees, positive = clockwise as seen on screen (y axis
//! pointing down), which is the convention rotation gestures report in.
//! The output canvas grows to the bounding box of the rotated image so no
//! content is clipped.
//!
//! Quarter turns are exact pixel remaps. Other angles use inverse mapping
//! with bilinear interpolation: for each output pixel center we rotate back
//! into the source and blend the four nearest source pixels.

use crate::constants::{PAPER_WHITE, RIGHT_ANGLE_TOLERANCE};
use crate::types::*;

/// Reduce an angle to `[0, 360)`
pub fn normalize_angle(angle_degrees: f64) -> f64 {
    let a = angle_degrees.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Number of clockwise quarter turns if the angle is (close to) a multiple
/// of 90°, otherwise `None`.
fn quarter_turns(angle_degrees: f64) -> Option<u32> {
    let a = normalize_angle(angle_degrees);
    let q = (a / 90.0).round();
    if (a - q * 90.0).abs() < RIGHT_ANGLE_TOLERANCE {
        Some(q as u32 % 4)
    } else {
        None
    }
}

/// Compute the canvas size needed to hold an image rotated by `angle_degrees`.
///
/// Quarter turns swap or keep the dimensions exactly. Other angles round
/// the bounding box up so that the rotated corners always fit.
pub fn rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    match quarter_turns(angle_degrees) {
        Some(0) | Some(2) => return (width, height),
        Some(_) => return (height, width),
        None => {}
    }

    let rad = angle_degrees.to_radians();
    let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
    let (w, h) = (width as f64, height as f64);

    // Shave a hair off before ceil so floating noise does not add a column
    let new_w = (w * cos + h * sin - 1e-9).ceil() as u32;
    let new_h = (w * sin + h * cos - 1e-9).ceil() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Rotate an image clockwise by `angle_degrees` about its center.
///
/// Canvas area not covered by the rotated image is transparent for formats
/// with alpha and paper white otherwise.
pub fn rotate(image: &RawImage, angle_degrees: f64) -> RawImage {
    match quarter_turns(angle_degrees) {
        Some(0) => image.clone(),
        Some(turns) => rotate_quarter_turns(image, turns),
        None => rotate_bilinear(image, angle_degrees),
    }
}

fn rotate_quarter_turns(image: &RawImage, turns: u32) -> RawImage {
    let (w, h) = image.dimensions();
    let (dst_w, dst_h) = if turns % 2 == 1 { (h, w) } else { (w, h) };
    let channels = image.format().channels();
    let mut output = Vec::with_capacity(image.pixels().len());

    for y in 0..dst_h {
        for x in 0..dst_w {
            let (sx, sy) = match turns {
                1 => (y, h - 1 - x),
                2 => (w - 1 - x, h - 1 - y),
                _ => (w - 1 - y, x),
            };
            output.extend_from_slice(image.pixel(sx, sy));
        }
    }

    debug_assert_eq!(output.len(), buffer_len(dst_w, dst_h, channels));
    RawImage::from_parts(dst_w, dst_h, image.format(), output)
}

fn rotate_bilinear(image: &RawImage, angle_degrees: f64) -> RawImage {
    let (src_w, src_h) = image.dimensions();
    let (dst_w, dst_h) = rotated_bounds(src_w, src_h, angle_degrees);
    let format = image.format();
    let channels = format.channels();
    let fill = fill_pixel(format);

    let rad = angle_degrees.to_radians();
    let (sin, cos) = (rad.sin(), rad.cos());

    let src_cx = src_w as f64 / 2.0;
    let src_cy = src_h as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut output = Vec::with_capacity(buffer_len(dst_w, dst_h, channels));
    let mut sample = vec![0u8; channels];

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            // Work with pixel centers
            let dx = dst_x as f64 + 0.5 - dst_cx;
            let dy = dst_y as f64 + 0.5 - dst_cy;

            // Inverse of a clockwise rotation in y-down space
            let u = dx * cos + dy * sin + src_cx - 0.5;
            let v = -dx * sin + dy * cos + src_cy - 0.5;

            if sample_bilinear(image, u, v, &mut sample) {
                output.extend_from_slice(&sample);
            } else {
                output.extend_from_slice(&fill[..channels]);
            }
        }
    }

    RawImage::from_parts(dst_w, dst_h, format, output)
}

/// Byte length of a `width` x `height` buffer, widened before multiplying
fn buffer_len(width: u32, height: u32, channels: usize) -> usize {
    width as usize * height as usize * channels
}

/// Background pixel for canvas area outside the rotated image
fn fill_pixel(format: PixelFormat) -> [u8; 4] {
    match format {
        PixelFormat::Gray8 | PixelFormat::Rgb8 => [PAPER_WHITE; 4],
        PixelFormat::GrayAlpha8 => [PAPER_WHITE, 0, 0, 0],
        PixelFormat::Rgba8 => [PAPER_WHITE, PAPER_WHITE, PAPER_WHITE, 0],
        PixelFormat::Alpha8 => [0; 4],
    }
}

/// Sample at pixel-index coordinates `(u, v)`. Returns `false` if the point
/// falls outside the source image.
fn sample_bilinear(image: &RawImage, u: f64, v: f64, out: &mut [u8]) -> bool {
    let (w, h) = image.dimensions();
    if u < -0.5 || v < -0.5 || u > w as f64 - 0.5 || v > h as f64 - 0.5 {
        return false;
    }

    let u = u.clamp(0.0, (w - 1) as f64);
    let v = v.clamp(0.0, (h - 1) as f64);
    let x0 = u.floor() as u32;
    let y0 = v.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = u - x0 as f64;
    let fy = v - y0 as f64;

    let p00 = image.pixel(x0, y0);
    let p10 = image.pixel(x1, y0);
    let p01 = image.pixel(x0, y1);
    let p11 = image.pixel(x1, y1);

    for (i, slot) in out.iter_mut().enumerate() {
        let value = p00[i] as f64 * (1.0 - fx) * (1.0 - fy)
            + p10[i] as f64 * fx * (1.0 - fy)
            + p01[i] as f64 * (1.0 - fx) * fy
            + p11[i] as f64 * fx * fy;
        *slot = value.round().clamp(0.0, 255.0) as u8;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x2 gray image with distinct values:
    /// ```text
    /// 0 1 2
    /// 3 4 5
    /// ```
    fn numbered() -> RawImage {
        RawImage::new(3, 2, PixelFormat::Gray8, vec![0, 1, 2, 3, 4, 5]).unwrap()
    }

    #[test]
    fn test_zero_rotation_is_identity() {
        let img = numbered();
        assert_eq!(rotate(&img, 0.0), img);
        assert_eq!(rotate(&img, 360.0), img);
        assert_eq!(rotate(&img, -720.0), img);
    }

    #[test]
    fn test_quarter_turn_clockwise() {
        let rotated = rotate(&numbered(), 90.0);
        assert_eq!(rotated.dimensions(), (2, 3));
        // 3 0
        // 4 1
        // 5 2
        assert_eq!(rotated.pixels(), &[3, 0, 4, 1, 5, 2]);
    }

    #[test]
    fn test_half_turn() {
        let rotated = rotate(&numbered(), 180.0);
        assert_eq!(rotated.pixels(), &[5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_three_quarter_turn_matches_negative_quarter() {
        let img = numbered();
        let a = rotate(&img, 270.0);
        let b = rotate(&img, -90.0);
        assert_eq!(a, b);
        // 2 5
        // 1 4
        // 0 3
        assert_eq!(a.pixels(), &[2, 5, 1, 4, 0, 3]);
    }

    #[test]
    fn test_bounds_quarter_turns() {
        assert_eq!(rotated_bounds(100, 50, 90.0), (50, 100));
        assert_eq!(rotated_bounds(100, 50, 180.0), (100, 50));
        assert_eq!(rotated_bounds(100, 50, -270.0), (50, 100));
    }

    #[test]
    fn test_bounds_grow_for_diagonal() {
        let (w, h) = rotated_bounds(100, 100, 45.0);
        // 100 * sqrt(2) ≈ 141.42
        assert_eq!((w, h), (142, 142));
    }

    #[test]
    fn test_arbitrary_rotation_fills_corners() {
        let img = RawImage::filled(20, 10, PixelFormat::Gray8, &[0]).unwrap();
        let rotated = rotate(&img, 30.0);
        let (w, h) = rotated.dimensions();
        assert!(w > 20 && h > 10);
        // Corner lies outside the rotated page: paper white
        assert_eq!(rotated.pixel(0, 0), &[PAPER_WHITE]);
        // Center lies inside: original black
        assert_eq!(rotated.pixel(w / 2, h / 2), &[0]);
    }

    #[test]
    fn test_arbitrary_rotation_transparent_corners() {
        let img = RawImage::filled(20, 10, PixelFormat::Rgba8, &[10, 10, 10, 255]).unwrap();
        let rotated = rotate(&img, 45.0);
        assert_eq!(rotated.pixel(0, 0)[3], 0);
        let (w, h) = rotated.dimensions();
        assert_eq!(rotated.pixel(w / 2, h / 2), &[10, 10, 10, 255]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_buffer_len_does_not_wrap() {
        // 70000 * 70000 exceeds u32::MAX
        assert_eq!(buffer_len(70_000, 70_000, 4), 19_600_000_000);
        assert_eq!(buffer_len(3, 2, 1), 6);
    }

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(-90.0), 270.0);
        assert_eq!(normalize_angle(450.0), 90.0);
        assert_eq!(normalize_angle(-1e-20), 0.0);
    }
}
