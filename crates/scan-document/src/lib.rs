//! Scan Document - image transforms and PDF encoding for captured pages
//!
//! This crate holds the pure parts of the capture pipeline: the pixel
//! buffer type, the grayscale/rotate/crop transforms, and the codec that
//! turns transformed pages into a paginated PDF and inspects stored ones.

pub mod codec;
pub mod constants;
pub mod transform;
mod types;

pub use codec::{EncodeOptions, encode, encode_async, page_count, page_image, thumbnail};
pub use transform::{crop, map_display_rect_to_pixel_rect, rotate, rotated_bounds, to_grayscale};
pub use types::*;
