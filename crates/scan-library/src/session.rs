//! One capture from camera frame to stored document.
//!
//! `Idle -> Capturing -> Editing -> Saving -> Idle`. A delivered frame is
//! converted to grayscale immediately; gestures then only adjust the
//! [`TransformState`], and the rotate/crop work happens for the preview
//! and once more, at full resolution, when the document is saved.

use crate::catalog::Catalog;
use crate::options::LibraryOptions;
use crate::types::*;
use scan_document::{
    EncodeOptions, Point, RawImage, Rect, crop, encode_async, map_display_rect_to_pixel_rect,
    rotate, to_grayscale,
};
use std::sync::{Arc, OnceLock};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Edits accumulated while the user adjusts a captured page
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransformState {
    /// Clockwise rotation in degrees
    pub rotation_degrees: f64,
    /// Crop in display coordinates over the rotated preview; `None` keeps it all
    pub crop_rect: Option<Rect>,
    /// Where the preview's top-left pixel is drawn
    pub display_origin: Point,
    /// Preview pixels per display unit
    pub display_scale: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            rotation_degrees: 0.0,
            crop_rect: None,
            display_origin: Point::new(0.0, 0.0),
            display_scale: 1.0,
        }
    }
}

impl TransformState {
    /// Fold one gesture into the state; each field keeps the last value
    /// received. Returns true if the rotation changed.
    pub fn apply(&mut self, event: GestureEvent) -> bool {
        match event {
            GestureEvent::Rotation(degrees) => {
                if !degrees.is_finite() || degrees == self.rotation_degrees {
                    return false;
                }
                self.rotation_degrees = degrees;
                true
            }
            GestureEvent::CropRect(rect) => {
                self.crop_rect = Some(rect);
                false
            }
            GestureEvent::Viewport { origin, scale } => {
                self.display_origin = origin;
                self.display_scale = scale;
                false
            }
        }
    }
}

/// User input while editing
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GestureEvent {
    /// Set the rotation angle in degrees, positive is clockwise
    Rotation(f64),
    /// Replace the crop rectangle (display coordinates)
    CropRect(Rect),
    /// Where and how large the preview is currently drawn
    Viewport { origin: Point, scale: f64 },
}

struct EditState {
    /// Grayscale capture, before rotation
    image: Arc<RawImage>,
    transform: TransformState,
    preview: OnceLock<RawImage>,
}

impl EditState {
    fn preview(&self) -> &RawImage {
        self.preview
            .get_or_init(|| rotate(&self.image, self.transform.rotation_degrees))
    }

    /// Full-resolution rotate and crop, detached from the session so it can
    /// run on the blocking pool
    fn render_job(&self) -> impl FnOnce() -> Result<RawImage> + Send + 'static {
        let source = Arc::clone(&self.image);
        let cached = self.preview.get().cloned();
        let transform = self.transform.clone();

        move || -> Result<RawImage> {
            let rotated = match cached {
                Some(preview) => preview,
                None => rotate(&source, transform.rotation_degrees),
            };
            let region = match transform.crop_rect {
                Some(rect) => map_display_rect_to_pixel_rect(
                    rect,
                    transform.display_origin,
                    transform.display_scale,
                    rotated.dimensions(),
                )?,
                None => rotated.bounds(),
            };
            Ok(crop(&rotated, region)?)
        }
    }
}

enum State {
    Idle,
    Capturing,
    Editing(EditState),
    Saving,
}

impl State {
    fn phase(&self) -> SessionPhase {
        match self {
            State::Idle => SessionPhase::Idle,
            State::Capturing => SessionPhase::Capturing,
            State::Editing(_) => SessionPhase::Editing,
            State::Saving => SessionPhase::Saving,
        }
    }
}

pub struct CaptureSession {
    state: State,
    base_name: String,
    encode: EncodeOptions,
}

impl CaptureSession {
    pub fn new(base_name: impl Into<String>, encode: EncodeOptions) -> Self {
        Self {
            state: State::Idle,
            base_name: base_name.into(),
            encode,
        }
    }

    pub fn from_options(options: &LibraryOptions) -> Self {
        Self::new(options.base_name.clone(), options.encode_options())
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    fn invalid(&self, operation: &'static str) -> LibraryError {
        LibraryError::InvalidState {
            operation,
            phase: self.phase(),
        }
    }

    pub fn start_capture(&mut self) -> Result<()> {
        match self.state {
            State::Idle => {
                self.state = State::Capturing;
                log::debug!("Capture started");
                Ok(())
            }
            _ => Err(self.invalid("start a capture")),
        }
    }

    /// Hand over the captured frame. The session stays in `Capturing` if the
    /// frame cannot be converted.
    pub fn deliver(&mut self, raw: RawImage) -> Result<()> {
        if !matches!(self.state, State::Capturing) {
            return Err(self.invalid("deliver a frame"));
        }
        let gray = to_grayscale(&raw)?;
        log::debug!("Frame delivered: {}x{}", gray.width(), gray.height());
        self.state = State::Editing(EditState {
            image: Arc::new(gray),
            transform: TransformState::default(),
            preview: OnceLock::new(),
        });
        Ok(())
    }

    pub fn cancel_capture(&mut self) -> Result<()> {
        match self.state {
            State::Capturing => {
                self.state = State::Idle;
                log::debug!("Capture cancelled");
                Ok(())
            }
            _ => Err(self.invalid("cancel a capture")),
        }
    }

    pub fn apply(&mut self, event: GestureEvent) -> Result<()> {
        let State::Editing(edit) = &mut self.state else {
            return Err(self.invalid("apply a gesture"));
        };
        if edit.transform.apply(event) {
            edit.preview = OnceLock::new();
        }
        Ok(())
    }

    /// Grayscale, rotated image to show; `None` outside of editing
    pub fn current_preview(&self) -> Option<&RawImage> {
        match &self.state {
            State::Editing(edit) => Some(edit.preview()),
            _ => None,
        }
    }

    pub fn transform_state(&self) -> Option<&TransformState> {
        match &self.state {
            State::Editing(edit) => Some(&edit.transform),
            _ => None,
        }
    }

    /// Throw away the captured page without saving
    pub fn discard(&mut self) -> Result<()> {
        match self.state {
            State::Editing(_) => {
                self.state = State::Idle;
                log::debug!("Capture discarded");
                Ok(())
            }
            _ => Err(self.invalid("discard")),
        }
    }

    /// Rotate, crop, encode and store the page, then add it to `catalog`.
    ///
    /// On failure the session returns to `Editing` with its edits intact,
    /// and so does a save whose future is dropped before it finishes. Once
    /// encoding has finished the write runs on its own task, so the file is
    /// completed even if this future is dropped; it then shows up on the
    /// next catalog refresh.
    pub async fn save(&mut self, catalog: &Catalog) -> Result<DocumentEntry> {
        let edit = match std::mem::replace(&mut self.state, State::Saving) {
            State::Editing(edit) => edit,
            other => {
                self.state = other;
                return Err(self.invalid("save"));
            }
        };

        let render = edit.render_job();
        let pending = PendingSave {
            state: &mut self.state,
            edit: Some(edit),
        };
        match store_page(render, &self.base_name, &self.encode, catalog).await {
            Ok(entry) => {
                pending.complete();
                Ok(entry)
            }
            Err(e) => {
                log::error!("Save failed: {}", e);
                pending.restore();
                Err(e)
            }
        }
    }
}

/// Holds the edit while a save is in flight and puts it back into the
/// session unless the save completed
struct PendingSave<'a> {
    state: &'a mut State,
    edit: Option<EditState>,
}

impl PendingSave<'_> {
    fn complete(mut self) {
        self.edit = None;
        *self.state = State::Idle;
    }

    fn restore(mut self) {
        if let Some(edit) = self.edit.take() {
            *self.state = State::Editing(edit);
        }
    }
}

impl Drop for PendingSave<'_> {
    fn drop(&mut self) {
        if let Some(edit) = self.edit.take() {
            log::warn!("Save abandoned before it finished; back to editing");
            *self.state = State::Editing(edit);
        }
    }
}

async fn store_page(
    render: impl FnOnce() -> Result<RawImage> + Send + 'static,
    base_name: &str,
    encode: &EncodeOptions,
    catalog: &Catalog,
) -> Result<DocumentEntry> {
    let page = tokio::task::spawn_blocking(render).await??;
    let bytes = encode_async(vec![page], encode.clone()).await?;

    let store = Arc::clone(catalog.store());
    let base_name = base_name.to_string();
    let entry = tokio::spawn(async move { store.write_new(&base_name, &bytes).await }).await??;

    catalog.append(entry.clone());
    log::info!("Saved capture as {}", entry.id);
    Ok(entry)
}
