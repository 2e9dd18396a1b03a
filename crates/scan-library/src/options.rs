use crate::types::*;
use scan_document::EncodeOptions;
use scan_document::constants::DEFAULT_DPI;
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Base name used for generated document names
pub const DEFAULT_BASE_NAME: &str = "scannedDocument";

/// Extension of stored documents
pub const DEFAULT_EXTENSION: &str = "pdf";

/// Library and capture configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LibraryOptions {
    /// Directory holding the stored documents
    pub library_dir: PathBuf,

    // Naming
    pub base_name: String,
    pub extension: String,

    // Encoding
    pub dpi: f32,
    pub document_title: Option<String>,

    /// Longest edge of catalog thumbnails, in pixels
    pub thumbnail_max_edge: u32,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            library_dir: PathBuf::from("ScannedDocuments"),
            base_name: DEFAULT_BASE_NAME.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            dpi: DEFAULT_DPI,
            document_title: None,
            thumbnail_max_edge: 256,
        }
    }
}

impl LibraryOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| LibraryError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LibraryError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.library_dir.as_os_str().is_empty() {
            return Err(LibraryError::Config(
                "Library directory must not be empty".to_string(),
            ));
        }

        if self.base_name.trim().is_empty()
            || self.base_name.starts_with('.')
            || self.base_name.contains(['/', '\\'])
        {
            return Err(LibraryError::Config(format!(
                "Base name {:?} is not a usable file name",
                self.base_name
            )));
        }

        if self.extension.is_empty() || !self.extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(LibraryError::Config(format!(
                "Extension {:?} must be non-empty and alphanumeric",
                self.extension
            )));
        }

        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(LibraryError::Config(format!(
                "DPI must be positive, got {}",
                self.dpi
            )));
        }

        if self.thumbnail_max_edge == 0 {
            return Err(LibraryError::Config(
                "Thumbnail edge must be at least one pixel".to_string(),
            ));
        }

        Ok(())
    }

    /// Encoder settings for captured pages
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            dpi: self.dpi,
            title: self.document_title.clone(),
        }
    }
}
