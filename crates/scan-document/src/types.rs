use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Unsupported pixel format: {0:?} has no color channel")]
    UnsupportedFormat(PixelFormat),
    #[error("Crop rectangle has zero area")]
    EmptyCrop,
    #[error("Crop rectangle {rect:?} exceeds image bounds {width}x{height}")]
    OutOfBounds {
        rect: PixelRect,
        width: u32,
        height: u32,
    },
    #[error("Display scale must be positive and finite, got {0}")]
    InvalidScale(f64),
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("Image dimensions must be non-zero")]
    ZeroDimensions,
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("No pages to encode")]
    NoPages,
    #[error("Cannot place {0:?} image on a page")]
    UnsupportedImage(PixelFormat),
    #[error("Encode error: {0}")]
    Encode(#[from] std::io::Error),
    #[error("Decode error: {0}")]
    Decode(std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
    #[error("Page {0} does not carry a scanned image")]
    MissingImage(usize),
    #[error("Image error: {0}")]
    Image(#[from] TransformError),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T, E = TransformError> = std::result::Result<T, E>;

// =============================================================================
// Pixel Data
// =============================================================================

/// Memory layout of a [`RawImage`]'s pixel buffer (8 bits per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Gray8,
    GrayAlpha8,
    Rgb8,
    Rgba8,
    /// Coverage mask with no color information
    Alpha8,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Gray8 | PixelFormat::Alpha8 => 1,
            PixelFormat::GrayAlpha8 => 2,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            PixelFormat::GrayAlpha8 | PixelFormat::Rgba8 | PixelFormat::Alpha8
        )
    }

    pub fn has_color(self) -> bool {
        !matches!(self, PixelFormat::Alpha8)
    }

    /// Number of color channels, excluding alpha
    pub fn color_channels(self) -> usize {
        match self {
            PixelFormat::Gray8 | PixelFormat::GrayAlpha8 => 1,
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => 3,
            PixelFormat::Alpha8 => 0,
        }
    }
}

/// An immutable 8-bit pixel buffer, as delivered by a capture device.
///
/// The buffer is row-major with no padding; the length is always
/// `width * height * format.channels()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl RawImage {
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TransformError::ZeroDimensions);
        }
        let expected = width as usize * height as usize * format.channels();
        if pixels.len() != expected {
            return Err(TransformError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    /// Create an image where every pixel has the same value
    pub fn filled(width: u32, height: u32, format: PixelFormat, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != format.channels() {
            return Err(TransformError::BufferSize {
                expected: format.channels(),
                actual: pixel.len(),
            });
        }
        let count = width as usize * height as usize;
        Self::new(width, height, format, pixel.repeat(count))
    }

    /// Build from a buffer whose length the caller has already computed
    pub(crate) fn from_parts(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * format.channels()
        );
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Channel values of the pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let channels = self.format.channels();
        let idx = (y as usize * self.width as usize + x as usize) * channels;
        &self.pixels[idx..idx + channels]
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }

    /// Convert into an `image` crate buffer for file output.
    ///
    /// `Alpha8` masks are exported as grayscale coverage.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let (w, h) = (self.width, self.height);
        let pixels = self.pixels.clone();
        let expected = pixels.len();
        let image = match self.format {
            PixelFormat::Gray8 | PixelFormat::Alpha8 => {
                image::GrayImage::from_raw(w, h, pixels).map(DynamicImage::ImageLuma8)
            }
            PixelFormat::GrayAlpha8 => {
                image::GrayAlphaImage::from_raw(w, h, pixels).map(DynamicImage::ImageLumaA8)
            }
            PixelFormat::Rgb8 => image::RgbImage::from_raw(w, h, pixels).map(DynamicImage::ImageRgb8),
            PixelFormat::Rgba8 => {
                image::RgbaImage::from_raw(w, h, pixels).map(DynamicImage::ImageRgba8)
            }
        };
        image.ok_or(TransformError::BufferSize {
            expected,
            actual: self.pixels.len(),
        })
    }
}

impl TryFrom<DynamicImage> for RawImage {
    type Error = TransformError;

    /// Higher bit depths are narrowed to 8 bits per channel.
    fn try_from(image: DynamicImage) -> Result<Self> {
        let (width, height) = (image.width(), image.height());
        let (format, pixels) = match image {
            DynamicImage::ImageLuma8(buf) => (PixelFormat::Gray8, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (PixelFormat::GrayAlpha8, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (PixelFormat::Rgb8, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (PixelFormat::Rgba8, buf.into_raw()),
            other => {
                let color = other.color();
                match (color.has_color(), color.has_alpha()) {
                    (true, true) => (PixelFormat::Rgba8, other.to_rgba8().into_raw()),
                    (true, false) => (PixelFormat::Rgb8, other.to_rgb8().into_raw()),
                    (false, true) => (PixelFormat::GrayAlpha8, other.to_luma_alpha8().into_raw()),
                    (false, false) => (PixelFormat::Gray8, other.to_luma8().into_raw()),
                }
            }
        };
        RawImage::new(width, height, format, pixels)
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// A point in display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle in display coordinates (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// A rectangle in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge (saturates instead of overflowing)
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge (saturates instead of overflowing)
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the rectangle lies entirely within a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_short_buffer() {
        let result = RawImage::new(2, 2, PixelFormat::Rgb8, vec![0; 11]);
        assert_eq!(
            result,
            Err(TransformError::BufferSize {
                expected: 12,
                actual: 11
            })
        );
    }

    #[test]
    fn test_new_rejects_zero_dimensions() {
        let result = RawImage::new(0, 4, PixelFormat::Gray8, Vec::new());
        assert_eq!(result, Err(TransformError::ZeroDimensions));
    }

    #[test]
    fn test_pixel_access() {
        let img = RawImage::new(2, 1, PixelFormat::GrayAlpha8, vec![10, 20, 30, 40]).unwrap();
        assert_eq!(img.pixel(1, 0), &[30, 40]);
    }

    #[test]
    fn test_dynamic_conversion_keeps_format() {
        let img = RawImage::filled(3, 2, PixelFormat::Rgba8, &[1, 2, 3, 4]).unwrap();
        let dynamic = img.to_dynamic().unwrap();
        let back = RawImage::try_from(dynamic).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_sixteen_bit_narrowed() {
        let buf = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_pixel(
            2,
            2,
            image::Luma([u16::MAX]),
        );
        let img = RawImage::try_from(DynamicImage::ImageLuma16(buf)).unwrap();
        assert_eq!(img.format(), PixelFormat::Gray8);
        assert!(img.pixels().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_pixel_rect_fits_within() {
        assert!(PixelRect::new(0, 0, 10, 10).fits_within(10, 10));
        assert!(!PixelRect::new(1, 0, 10, 10).fits_within(10, 10));
        assert!(!PixelRect::new(u32::MAX, 0, 2, 1).fits_within(10, 10));
    }
}
