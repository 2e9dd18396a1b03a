//! Shared constants for the scan pipeline
//!
//! This module centralizes magic numbers used by the transforms and the
//! document writer.

// =============================================================================
// Luminance
// =============================================================================

/// Rec. 709 luma weights scaled to integers (sum = `LUMA_WEIGHT_TOTAL`).
///
/// Integer weights that sum exactly to the divisor make the grayscale filter
/// map any neutral pixel (r = g = b) to itself.
pub const LUMA_WEIGHT_R: u32 = 2125;
pub const LUMA_WEIGHT_G: u32 = 7154;
pub const LUMA_WEIGHT_B: u32 = 721;
pub const LUMA_WEIGHT_TOTAL: u32 = LUMA_WEIGHT_R + LUMA_WEIGHT_G + LUMA_WEIGHT_B;

// =============================================================================
// Rotation
// =============================================================================

/// Angles closer than this to a multiple of 90° use an exact pixel remap
pub const RIGHT_ANGLE_TOLERANCE: f64 = 0.001;

/// Canvas fill for opaque formats where the rotated page does not reach
pub const PAPER_WHITE: u8 = 255;

// =============================================================================
// Document Output
// =============================================================================

/// Points per inch in PDF user space
pub const POINTS_PER_INCH: f32 = 72.0;

/// Default page resolution: one point per pixel
pub const DEFAULT_DPI: f32 = 72.0;

/// Value written to the `/Producer` entry of generated documents
pub const PRODUCER: &str = concat!("scan-document ", env!("CARGO_PKG_VERSION"));

/// Resource name of the page image within each page's XObject dictionary
pub const PAGE_IMAGE_NAME: &str = "Im0";

/// Convert a pixel length to points at the given resolution
#[inline]
pub fn px_to_pt(px: u32, dpi: f32) -> f32 {
    px as f32 * POINTS_PER_INCH / dpi
}
