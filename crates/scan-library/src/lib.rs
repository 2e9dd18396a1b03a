//! Scan Library - stored documents and the capture workflow
//!
//! [`DocumentStore`] owns the directory of PDFs, [`Catalog`] publishes the
//! ordered list the UI shows, and [`CaptureSession`] drives one capture
//! from camera frame to stored document.

pub mod catalog;
pub mod options;
pub mod session;
pub mod store;
mod types;

pub use catalog::{Catalog, Snapshot};
pub use options::{DEFAULT_BASE_NAME, DEFAULT_EXTENSION, LibraryOptions};
pub use session::{CaptureSession, GestureEvent, TransformState};
pub use store::{DocumentStore, generate_unique_name};
pub use types::*;

use std::sync::Arc;

/// Open the configured library directory and load its catalog
pub async fn open_library(options: &LibraryOptions) -> Result<Catalog> {
    options.validate()?;
    let store = DocumentStore::open(&options.library_dir, options.extension.clone()).await?;
    Ok(Catalog::load(Arc::new(store)).await?)
}
