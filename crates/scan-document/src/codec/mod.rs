//! Paginated document codec.
//!
//! Captured pages are stored as PDF: each image becomes one page whose
//! MediaBox matches the image size at the configured resolution. Color
//! data is Flate-compressed; alpha, when present, is written as a soft mask.

mod reader;
mod writer;

pub use reader::{page_count, page_image, thumbnail};
pub use writer::encode;

use crate::constants::DEFAULT_DPI;
use crate::types::*;

/// Options for [`encode`]
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    /// Pixels per inch used to size pages (72 = one point per pixel)
    pub dpi: f32,
    /// Document title written to the `/Info` dictionary
    pub title: Option<String>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            title: None,
        }
    }
}

/// Encode on the blocking pool; image compression is CPU-bound
pub async fn encode_async(
    pages: Vec<RawImage>,
    options: EncodeOptions,
) -> Result<Vec<u8>, CodecError> {
    tokio::task::spawn_blocking(move || encode(&pages, &options)).await?
}

/// Thumbnail rendering on the blocking pool
pub async fn thumbnail_async(bytes: Vec<u8>, max_edge: u32) -> Result<RawImage, CodecError> {
    tokio::task::spawn_blocking(move || thumbnail(&bytes, max_edge)).await?
}
