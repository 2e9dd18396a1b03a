use chrono::{DateTime, Utc};
use scan_document::{CodecError, TransformError};
use std::fmt;
use thiserror::Error;

/// Failures of the document directory
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage is full")]
    StorageFull,
    #[error("Write error: {0}")]
    WriteError(#[source] std::io::Error),
    #[error("A document named {0} already exists")]
    NameCollision(String),
    #[error("Document {0} not found")]
    NotFound(DocumentHandle),
    #[error("Invalid document name: {0:?}")]
    InvalidName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Classify an I/O failure that happened while bytes were being persisted
    pub(crate) fn from_write(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::StorageFull => StorageError::StorageFull,
            _ => StorageError::WriteError(err),
        }
    }
}

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Cannot {operation} while the session is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: SessionPhase,
    },
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T, E = LibraryError> = std::result::Result<T, E>;

/// Stable identifier of a stored document: its file name inside the library
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DocumentHandle(String);

impl DocumentHandle {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self(file_name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        match self.0.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.0,
        }
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentHandle {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One stored document as the catalog shows it
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentEntry {
    pub id: DocumentHandle,
    /// Name shown to the user (the file stem)
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl DocumentEntry {
    pub fn new(id: DocumentHandle, created_at: DateTime<Utc>) -> Self {
        let display_name = id.stem().to_string();
        Self {
            id,
            display_name,
            created_at,
        }
    }
}

/// Result of a successful catalog delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The file was removed
    Removed,
    /// The file had already disappeared; only the catalog entry was dropped
    AlreadyMissing,
}

/// Lifecycle of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionPhase {
    #[default]
    Idle,
    Capturing,
    Editing,
    Saving,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Capturing => "capturing",
            SessionPhase::Editing => "editing",
            SessionPhase::Saving => "saving",
        };
        f.write_str(name)
    }
}
