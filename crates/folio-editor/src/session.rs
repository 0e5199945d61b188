// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit session — one image held open in the editor.
//
// A session is created through `ImageStore::open_session`, which refuses a
// second session while one is outstanding. The session is a two-state machine:
// transform operations are only valid in `Transform` mode, crop operations
// only in `Crop` mode. Dropping the session releases the record.

use std::sync::Arc;

use folio_core::error::{FolioError, Result};
use folio_core::types::{ColorAdjustments, FlipAxis, Geometry, ImageId};
use folio_document::ImageProcessor;
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use crate::crop::{CropSettings, CropState};
use crate::store::ImageStore;

/// Which half of the editor is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Transform,
    Crop,
}

enum ModeState {
    Transform,
    Crop(CropState),
}

/// The single open editor over one `ImageRecord`.
pub struct EditSession {
    store: ImageStore,
    target: ImageId,
    name: String,
    snapshot_before_edit: Arc<[u8]>,
    working: DynamicImage,
    geometry: Geometry,
    color: ColorAdjustments,
    mode: ModeState,
    crop_settings: CropSettings,
}

impl ImageStore {
    /// Open `id` in the editor with default crop settings.
    pub fn open_session(&self, id: ImageId) -> Result<EditSession> {
        self.open_session_with(id, CropSettings::default())
    }

    /// Open `id` in the editor.
    ///
    /// Fails with `SessionAlreadyOpen` while another session exists, and with
    /// `ImageNotFound` if `id` is not in the collection.
    #[instrument(skip(self, crop_settings))]
    pub fn open_session_with(
        &self,
        id: ImageId,
        crop_settings: CropSettings,
    ) -> Result<EditSession> {
        let record = self.claim(id)?;
        let working = match ImageProcessor::decode(record.name(), record.current_bytes()) {
            Ok(processor) => processor.into_dynamic(),
            Err(err) => {
                self.release(id);
                return Err(err);
            }
        };

        info!(%id, name = record.name(), "Edit session opened");
        Ok(EditSession {
            store: self.clone(),
            target: id,
            name: record.name().to_owned(),
            snapshot_before_edit: Arc::from(record.current_bytes()),
            working,
            geometry: Geometry::default(),
            color: ColorAdjustments::default(),
            mode: ModeState::Transform,
            crop_settings,
        })
    }
}

impl EditSession {
    // -- Accessors --------------------------------------------------------------

    pub fn target(&self) -> ImageId {
        self.target
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> EditMode {
        match self.mode {
            ModeState::Transform => EditMode::Transform,
            ModeState::Crop(_) => EditMode::Crop,
        }
    }

    /// Pending geometry relative to the working image.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn color(&self) -> ColorAdjustments {
        self.color
    }

    /// The record's current bytes as they were when the session opened.
    pub fn snapshot_before_edit(&self) -> &[u8] {
        &self.snapshot_before_edit
    }

    /// The decoded image edits are previewed against.
    pub fn working_image(&self) -> &DynamicImage {
        &self.working
    }

    /// Whether there are pending edits not yet committed.
    pub fn has_pending_edits(&self) -> bool {
        !self.geometry.is_identity() || !self.color.is_identity()
    }

    /// Renderable frame for the active mode: the working image with pending
    /// edits in transform mode, the boxed region in crop mode.
    pub fn preview(&self) -> DynamicImage {
        match &self.mode {
            ModeState::Transform => {
                ImageProcessor::from_dynamic(self.working.clone())
                    .apply_edits(&self.geometry, &self.color)
                    .into_dynamic()
            }
            ModeState::Crop(state) => state.preview(),
        }
    }

    // -- Transform mode ---------------------------------------------------------

    /// Add `delta` degrees (clockwise) to the pending rotation.
    pub fn rotate(&mut self, delta: f32) -> Result<()> {
        self.require_transform("rotate")?;
        self.geometry.rotate(delta);
        debug!(rotation = self.geometry.rotation, "Rotation pending");
        Ok(())
    }

    /// Toggle the pending flip on `axis`.
    pub fn flip(&mut self, axis: FlipAxis) -> Result<()> {
        self.require_transform("flip")?;
        self.geometry.flip(axis);
        Ok(())
    }

    pub fn set_brightness(&mut self, value: i32) -> Result<()> {
        self.require_transform("brightness")?;
        self.color.brightness = ColorAdjustments::clamp(value);
        Ok(())
    }

    pub fn set_contrast(&mut self, value: i32) -> Result<()> {
        self.require_transform("contrast")?;
        self.color.contrast = ColorAdjustments::clamp(value);
        Ok(())
    }

    pub fn set_saturation(&mut self, value: i32) -> Result<()> {
        self.require_transform("saturation")?;
        self.color.saturation = ColorAdjustments::clamp(value);
        Ok(())
    }

    /// Revert the record to its original bytes, immediately and in the store,
    /// and drop all pending edits. Cannot be undone.
    #[instrument(skip(self), fields(id = %self.target))]
    pub fn reset_to_original(&mut self) -> Result<()> {
        self.require_transform("reset")?;
        let original = self.store.revert_to_original(self.target)?;
        self.working = ImageProcessor::decode(&self.name, &original)?.into_dynamic();
        self.clear_pending();
        warn!(name = %self.name, "Image reset to original");
        Ok(())
    }

    /// Bake pending edits into new PNG bytes and store them as the record's
    /// current bytes. The rendered image becomes the new working image.
    #[instrument(skip(self), fields(id = %self.target))]
    pub fn commit(&mut self) -> Result<()> {
        self.require_transform("commit")?;
        self.require_working_image()?;
        let rendered = render(self.working.clone(), self.geometry, self.color)?;
        self.finish_commit(rendered)
    }

    /// `commit` on the blocking pool. Dropping the future leaves the session
    /// and the store unchanged.
    pub async fn commit_async(&mut self) -> Result<()> {
        self.require_transform("commit")?;
        self.require_working_image()?;
        let (working, geometry, color) = (self.working.clone(), self.geometry, self.color);
        let rendered = tokio::task::spawn_blocking(move || render(working, geometry, color))
            .await
            .map_err(|err| FolioError::RenderError(format!("render task failed: {err}")))??;
        self.finish_commit(rendered)
    }

    // -- Crop mode --------------------------------------------------------------

    /// Switch to crop mode over the record's current bytes. Pending transform
    /// edits are kept for when crop mode is cancelled.
    #[instrument(skip(self), fields(id = %self.target))]
    pub fn enter_crop(&mut self) -> Result<()> {
        self.require_transform("enter crop")?;
        let bytes = self.store.current_bytes(self.target)?;
        let source = ImageProcessor::decode(&self.name, &bytes)?.into_dynamic();
        let state = CropState::new(Arc::new(source), self.crop_settings)?;
        self.mode = ModeState::Crop(state);
        debug!("Crop mode entered");
        Ok(())
    }

    pub fn crop(&self) -> Result<&CropState> {
        match &self.mode {
            ModeState::Crop(state) => Ok(state),
            ModeState::Transform => Err(not_cropping()),
        }
    }

    pub fn crop_mut(&mut self) -> Result<&mut CropState> {
        match &mut self.mode {
            ModeState::Crop(state) => Ok(state),
            ModeState::Transform => Err(not_cropping()),
        }
    }

    /// Rasterize the crop box into the record's current bytes and return to
    /// transform mode with the cropped image loaded. Returns the new bytes.
    #[instrument(skip(self), fields(id = %self.target))]
    pub fn apply_crop(&mut self) -> Result<Vec<u8>> {
        let cropped = crop_and_encode(self.crop()?)?;
        self.finish_crop(cropped)
    }

    /// `apply_crop` on the blocking pool. Dropping the future leaves the
    /// session in crop mode and the store unchanged.
    pub async fn apply_crop_async(&mut self) -> Result<Vec<u8>> {
        let state = self.crop()?.clone();
        let cropped = tokio::task::spawn_blocking(move || crop_and_encode(&state))
            .await
            .map_err(|err| FolioError::RenderError(format!("crop task failed: {err}")))??;
        self.finish_crop(cropped)
    }

    /// Leave crop mode without touching the record.
    pub fn cancel_crop(&mut self) -> Result<()> {
        self.crop()?;
        self.mode = ModeState::Transform;
        debug!("Crop cancelled");
        Ok(())
    }

    /// Close the editor, discarding anything not committed.
    pub fn close(self) {
        if self.has_pending_edits() {
            debug!(name = %self.name, "Closing with uncommitted edits");
        }
    }

    // -- Helpers ----------------------------------------------------------------

    fn require_transform(&self, operation: &str) -> Result<()> {
        match self.mode {
            ModeState::Transform => Ok(()),
            ModeState::Crop(_) => Err(FolioError::InvalidState(format!(
                "{operation} is not available while cropping"
            ))),
        }
    }

    fn require_working_image(&self) -> Result<()> {
        if self.working.width() == 0 || self.working.height() == 0 {
            return Err(FolioError::RenderError("no working image loaded".into()));
        }
        Ok(())
    }

    fn clear_pending(&mut self) {
        self.geometry = Geometry::default();
        self.color = ColorAdjustments::default();
    }

    fn finish_commit(&mut self, (image, bytes): (DynamicImage, Vec<u8>)) -> Result<()> {
        let size = (image.width(), image.height());
        self.store.write_current(self.target, Arc::from(bytes), size)?;
        self.working = image;
        self.clear_pending();
        info!(name = %self.name, width = size.0, height = size.1, "Edits committed");
        Ok(())
    }

    fn finish_crop(&mut self, (image, bytes): (DynamicImage, Vec<u8>)) -> Result<Vec<u8>> {
        let size = (image.width(), image.height());
        self.store
            .write_current(self.target, Arc::from(bytes.as_slice()), size)?;
        self.working = image;
        self.clear_pending();
        self.mode = ModeState::Transform;
        info!(name = %self.name, width = size.0, height = size.1, "Crop applied");
        Ok(bytes)
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        self.store.release(self.target);
        debug!(id = %self.target, "Edit session closed");
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("target", &self.target)
            .field("name", &self.name)
            .field("mode", &self.mode())
            .field("geometry", &self.geometry)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

fn not_cropping() -> FolioError {
    FolioError::InvalidState("not in crop mode".into())
}

fn render(
    working: DynamicImage,
    geometry: Geometry,
    color: ColorAdjustments,
) -> Result<(DynamicImage, Vec<u8>)> {
    let processor = ImageProcessor::from_dynamic(working).apply_edits(&geometry, &color);
    let bytes = processor.to_png_bytes()?;
    Ok((processor.into_dynamic(), bytes))
}

fn crop_and_encode(state: &CropState) -> Result<(DynamicImage, Vec<u8>)> {
    let processor = ImageProcessor::from_dynamic(state.rasterize());
    let bytes = processor.to_png_bytes()?;
    Ok((processor.into_dynamic(), bytes))
}
