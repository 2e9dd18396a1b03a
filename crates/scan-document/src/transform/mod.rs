//! Image transforms for captured pages: grayscale, rotation and crop.
//!
//! All functions here are pure: they borrow the input image and return a
//! new one.
//!
//! # Transform Order
//!
//! A captured page goes through the transforms in this order:
//! 1. Grayscale (once, as soon as the image is captured)
//! 2. Rotation
//! 3. Crop (the crop rectangle is drawn over the rotated image)
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, y grows downward
//! - Rotation angles are in degrees, positive = clockwise on screen
//! - Crop rectangles arrive in display coordinates and are mapped to pixels
//!   with [`map_display_rect_to_pixel_rect`]

mod crop;
mod grayscale;
mod rotation;

pub use crop::{crop, map_display_rect_to_pixel_rect};
pub use grayscale::{luma, to_grayscale};
pub use rotation::{normalize_angle, rotate, rotated_bounds};
