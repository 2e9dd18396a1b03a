//! Message types and the background worker that owns a capture session
//! and the document catalog.
//!
//! A front end sends [`ScanCommand`]s and renders whatever [`ScanUpdate`]s
//! come back; all file and CPU work happens on the worker.

mod worker;

pub use worker::{spawn_worker, worker_task};

// Re-export types from library crates
pub use scan_document::RawImage;
pub use scan_library::{
    DeleteOutcome, DocumentEntry, DocumentHandle, GestureEvent, SessionPhase, Snapshot,
    TransformState,
};

/// Commands sent from UI to worker
#[derive(Debug)]
pub enum ScanCommand {
    StartCapture,
    Deliver {
        image: RawImage,
    },
    CancelCapture,
    /// Queued gestures are applied together and answered with one update
    Gesture(GestureEvent),
    Save,
    Discard,
    Rename {
        id: DocumentHandle,
        new_name: String,
    },
    Delete {
        id: DocumentHandle,
    },
    Refresh,
    PageCount {
        id: DocumentHandle,
    },
    Thumbnail {
        id: DocumentHandle,
        max_edge: u32,
    },
}

/// Updates sent from worker to UI
#[derive(Debug, Clone)]
pub enum ScanUpdate {
    SessionChanged {
        phase: SessionPhase,
        transform: Option<TransformState>,
        preview: Option<RawImage>,
    },
    Saved {
        entry: DocumentEntry,
    },
    Renamed {
        old_id: DocumentHandle,
        entry: DocumentEntry,
    },
    Deleted {
        id: DocumentHandle,
        outcome: DeleteOutcome,
    },
    CatalogRefreshed {
        entries: Snapshot,
    },
    PageCount {
        id: DocumentHandle,
        count: usize,
    },
    Thumbnail {
        id: DocumentHandle,
        image: RawImage,
    },
    Error {
        message: String,
    },
}
