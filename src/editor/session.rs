//! One editing session: the history of baked bitmaps, live adjustments, the
//! active edit mode and its transient state.

use std::future::Future;
use std::sync::Arc;

use image::RgbaImage;
use thiserror::Error;

use super::adjustments::{EditorAdjustments, FilterPreset, TransformState};
use super::crop::CropPreset;
use super::mask::{clamp_brush_size, MaskLayer, DEFAULT_BRUSH_SIZE};
use super::tools::{
    InteractionMode, NewObject, ObjectId, ObjectPatch, OverlayObjects, SelectionState, ToolError,
};
use crate::ai::{
    EnhanceResponse, EraseBackgroundResponse, ImageTransformService, InpaintRequest,
    InpaintResponse, PhotoRequest, TransformServiceError, TransformServiceResult,
};
use crate::compositor::{
    self, bake_export, CompositorError, ExportArtifact, LayerScale, TransformKind,
};
use crate::geometry::{display_to_source_scale, CropRegion, Point, Size};
use crate::history::{HistoryAction, HistoryStore};
use crate::media::{decode_data_uri_async, encode_png_data_uri_async, MediaError};
use crate::state::{EditEvent, EditMode, StateError, StateMachine};
use crate::text::FontBook;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("a remote transform is still in progress")]
    Busy,
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Compositor(#[from] CompositorError),
    #[error(transparent)]
    TransformService(#[from] TransformServiceError),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

pub type ImageState = Arc<RgbaImage>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropState {
    pub preset: CropPreset,
    pub region: CropRegion,
}

#[derive(Debug)]
pub struct EditorSession {
    history: HistoryStore<ImageState>,
    adjustments: EditorAdjustments,
    pending_transform: TransformState,
    display: Option<Size>,
    modes: StateMachine,
    crop: Option<CropState>,
    mask: Option<MaskLayer>,
    objects: OverlayObjects,
    fonts: FontBook,
    brush_size: u32,
    is_processing: bool,
}

impl EditorSession {
    pub fn new(initial: ImageState, fonts: FontBook) -> Self {
        tracing::info!(
            width = initial.width(),
            height = initial.height(),
            "editor session started"
        );
        Self {
            history: HistoryStore::new(initial),
            adjustments: EditorAdjustments::NEUTRAL,
            pending_transform: TransformState::IDENTITY,
            display: None,
            modes: StateMachine::new(),
            crop: None,
            mask: None,
            objects: OverlayObjects::default(),
            fonts,
            brush_size: DEFAULT_BRUSH_SIZE,
            is_processing: false,
        }
    }

    /// Decodes the acquired data URI off the caller's task and seeds a session with it.
    pub async fn open(data_uri: String, fonts: FontBook) -> SessionResult<Self> {
        let initial = decode_data_uri_async(data_uri).await?;
        Ok(Self::new(initial, fonts))
    }

    pub fn with_brush_size(mut self, brush_size: u32) -> Self {
        self.set_brush_size(brush_size);
        self
    }

    fn ensure_idle(&self) -> SessionResult<()> {
        if self.is_processing {
            tracing::warn!("rejecting edit while a remote transform is running");
            Err(SessionError::Busy)
        } else {
            Ok(())
        }
    }

    fn ensure_mode(&self, mode: EditMode) -> SessionResult<()> {
        self.ensure_idle()?;
        self.modes.require(mode)?;
        Ok(())
    }

    /// Pushes a new baked state. Scale factors are re-derived from the host's
    /// next `set_display_size` when the dimensions change.
    fn commit(&mut self, image: RgbaImage, operation: &'static str) {
        let previous = self.natural_size();
        self.history.push(Arc::new(image));
        if self.natural_size() != previous {
            self.display = None;
            self.objects.set_canvas(Size::new(0, 0));
        }
        tracing::info!(
            operation,
            cursor = self.history.cursor(),
            len = self.history.len(),
            "history state pushed"
        );
    }

    pub fn current(&self) -> &ImageState {
        self.history.current()
    }

    pub fn natural_size(&self) -> Size {
        let current = self.current();
        Size::new(current.width(), current.height())
    }

    pub fn history(&self) -> &HistoryStore<ImageState> {
        &self.history
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn set_fonts(&mut self, fonts: FontBook) {
        self.fonts = fonts;
    }

    pub const fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn edit_mode(&self) -> EditMode {
        self.modes.state()
    }

    pub fn display_size(&self) -> Option<Size> {
        self.display
    }

    /// Size the image is shown at, or its natural size before the host reports one.
    pub fn effective_display_size(&self) -> Size {
        self.display
            .filter(|display| !display.is_empty())
            .unwrap_or_else(|| self.natural_size())
    }

    /// Records the size the host currently displays the image at. Every
    /// geometry operation derives its scale factors from this.
    pub fn set_display_size(&mut self, shown: Size) {
        tracing::debug!(width = shown.width, height = shown.height, "display size changed");
        self.display = (!shown.is_empty()).then_some(shown);
        self.objects.set_canvas(self.display.unwrap_or(Size::new(0, 0)));
    }

    pub fn display_to_source_scale(&self) -> (f64, f64) {
        display_to_source_scale(self.effective_display_size(), self.natural_size())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Steps history; live adjustments are discarded.
    pub fn step_history(&mut self, action: HistoryAction) -> SessionResult<bool> {
        self.ensure_mode(EditMode::None)?;
        let previous = self.natural_size();
        let moved = self.history.step(action);
        if moved {
            self.adjustments.reset();
            if self.natural_size() != previous {
                self.display = None;
            }
        }
        Ok(moved)
    }

    pub fn undo(&mut self) -> SessionResult<bool> {
        self.step_history(HistoryAction::Undo)
    }

    pub fn redo(&mut self) -> SessionResult<bool> {
        self.step_history(HistoryAction::Redo)
    }

    /// Returns to the original image, dropping history, adjustments and any open mode.
    pub fn reset(&mut self) -> SessionResult<()> {
        self.ensure_idle()?;
        let previous = self.natural_size();
        self.history.reset();
        self.adjustments.reset();
        self.pending_transform = TransformState::IDENTITY;
        self.discard_transient();
        self.modes.reset();
        if self.natural_size() != previous {
            self.display = None;
        }
        tracing::info!("session reset to original image");
        Ok(())
    }

    fn discard_transient(&mut self) {
        self.crop = None;
        self.mask = None;
        self.objects.clear();
    }

    /// Leaves the current mode, discarding its transient state. History is untouched.
    pub fn cancel(&mut self) -> SessionResult<()> {
        self.ensure_idle()?;
        let mode = self.modes.state();
        self.modes.transition(EditEvent::Cancel)?;
        self.discard_transient();
        tracing::debug!(?mode, "edit mode cancelled");
        Ok(())
    }

    fn finish_mode(&mut self) -> SessionResult<()> {
        self.modes.transition(EditEvent::Apply)?;
        self.discard_transient();
        Ok(())
    }

    // Adjustments and transforms

    pub fn adjustments(&self) -> &EditorAdjustments {
        &self.adjustments
    }

    pub fn adjustments_mut(&mut self) -> SessionResult<&mut EditorAdjustments> {
        self.ensure_idle()?;
        Ok(&mut self.adjustments)
    }

    pub fn apply_preset(&mut self, preset: FilterPreset) -> SessionResult<()> {
        self.adjustments_mut()?.apply_preset(preset);
        tracing::debug!(preset = preset.label(), "filter preset applied");
        Ok(())
    }

    /// Bakes the live adjustments into a new state and resets them. Returns
    /// false when there was nothing to bake.
    pub fn apply_filters(&mut self) -> SessionResult<bool> {
        self.ensure_mode(EditMode::None)?;
        if self.adjustments.is_neutral() {
            return Ok(false);
        }
        let baked = compositor::apply_filters(self.current(), &self.adjustments);
        self.commit(baked, "filters");
        self.adjustments.reset();
        Ok(true)
    }

    /// Rotates or flips the current image and pushes the result immediately.
    pub fn transform(&mut self, kind: TransformKind) -> SessionResult<()> {
        self.ensure_mode(EditMode::None)?;
        let transformed = compositor::apply_transform(self.current(), kind);
        self.commit(transformed, "transform");
        Ok(())
    }

    pub fn rotate(&mut self, degrees: f64) -> SessionResult<()> {
        self.transform(TransformKind::Rotate(degrees))
    }

    pub fn flip_horizontal(&mut self) -> SessionResult<()> {
        self.transform(TransformKind::FlipHorizontal)
    }

    pub fn flip_vertical(&mut self) -> SessionResult<()> {
        self.transform(TransformKind::FlipVertical)
    }

    /// Rotation and flips applied only by [`EditorSession::export`].
    pub fn pending_transform(&self) -> &TransformState {
        &self.pending_transform
    }

    pub fn pending_transform_mut(&mut self) -> SessionResult<&mut TransformState> {
        self.ensure_idle()?;
        Ok(&mut self.pending_transform)
    }

    /// Bakes adjustments and the pending transform into a PNG; history is unchanged.
    pub fn export(&self) -> SessionResult<ExportArtifact> {
        self.ensure_mode(EditMode::None)?;
        let artifact = bake_export(self.current(), &self.pending_transform, &self.adjustments)?;
        tracing::info!(
            filename = %artifact.filename,
            width = artifact.width,
            height = artifact.height,
            "export baked"
        );
        Ok(artifact)
    }

    // Crop mode

    pub fn begin_crop(&mut self, preset: CropPreset) -> SessionResult<CropRegion> {
        self.ensure_idle()?;
        self.modes.transition(EditEvent::BeginCrop)?;
        let region = preset.seed_region(self.effective_display_size(), self.natural_size());
        self.crop = Some(CropState { preset, region });
        Ok(region)
    }

    pub fn crop_state(&self) -> Option<&CropState> {
        self.crop.as_ref()
    }

    fn crop_state_mut(&mut self) -> SessionResult<&mut CropState> {
        self.ensure_mode(EditMode::Crop)?;
        self.crop.as_mut().ok_or(SessionError::State(StateError::WrongMode {
            expected: EditMode::Crop,
            actual: EditMode::None,
        }))
    }

    /// Replaces the region with a new seed for `preset`.
    pub fn set_crop_preset(&mut self, preset: CropPreset) -> SessionResult<CropRegion> {
        let display = self.effective_display_size();
        let natural = self.natural_size();
        let crop = self.crop_state_mut()?;
        crop.preset = preset;
        crop.region = preset.seed_region(display, natural);
        Ok(crop.region)
    }

    /// Sets the region in percent of the displayed image, clamped to the image.
    pub fn set_crop_region(&mut self, x: f64, y: f64, width: f64, height: f64) -> SessionResult<CropRegion> {
        let crop = self.crop_state_mut()?;
        let x = x.clamp(0.0, 100.0);
        let y = y.clamp(0.0, 100.0);
        let region = CropRegion::new(
            x,
            y,
            width.clamp(0.0, 100.0 - x),
            height.clamp(0.0, 100.0 - y),
        )
        .with_aspect(crop.region.aspect);
        crop.region = region;
        Ok(region)
    }

    pub fn apply_crop(&mut self) -> SessionResult<()> {
        let display = self.effective_display_size();
        let region = self.crop_state_mut()?.region;
        let cropped = compositor::apply_crop(self.current(), &region, display)?;
        self.commit(cropped, "crop");
        self.finish_mode()
    }

    // Erase and inpaint modes

    pub fn brush_size(&self) -> u32 {
        self.brush_size
    }

    pub fn set_brush_size(&mut self, brush_size: u32) {
        self.brush_size = clamp_brush_size(brush_size);
        if let Some(mask) = self.mask.as_mut() {
            mask.set_brush_size(self.brush_size);
        }
    }

    fn begin_mask_mode(&mut self, event: EditEvent) -> SessionResult<()> {
        self.ensure_idle()?;
        self.modes.transition(event)?;
        self.mask = Some(MaskLayer::new(self.effective_display_size(), self.brush_size));
        Ok(())
    }

    pub fn begin_erase(&mut self) -> SessionResult<()> {
        self.begin_mask_mode(EditEvent::BeginErase)
    }

    pub fn begin_inpaint(&mut self) -> SessionResult<()> {
        self.begin_mask_mode(EditEvent::BeginInpaint)
    }

    pub fn mask(&self) -> Option<&MaskLayer> {
        self.mask.as_ref()
    }

    fn mask_mut(&mut self) -> SessionResult<&mut MaskLayer> {
        self.ensure_idle()?;
        let actual = self.modes.state();
        self.mask
            .as_mut()
            .ok_or(SessionError::State(StateError::NoMask { actual }))
    }

    pub fn mask_begin_stroke(&mut self, point: Point) -> SessionResult<()> {
        self.mask_mut()?.begin_stroke(point);
        Ok(())
    }

    pub fn mask_extend_stroke(&mut self, point: Point) -> SessionResult<()> {
        self.mask_mut()?.extend_stroke(point);
        Ok(())
    }

    pub fn mask_end_stroke(&mut self) -> SessionResult<bool> {
        Ok(self.mask_mut()?.end_stroke())
    }

    pub fn mask_undo(&mut self) -> SessionResult<bool> {
        Ok(self.mask_mut()?.undo())
    }

    pub fn mask_redo(&mut self) -> SessionResult<bool> {
        Ok(self.mask_mut()?.redo())
    }

    /// Wipes every stroke; the cleared mask can still be undone to nothing.
    pub fn mask_clear(&mut self) -> SessionResult<()> {
        self.mask_mut()?.clear();
        tracing::debug!(mode = ?self.modes.state(), "mask cleared");
        Ok(())
    }

    fn painted_mask(&self, mode: EditMode) -> SessionResult<&MaskLayer> {
        self.modes.require(mode)?;
        let mask = self.mask.as_ref().ok_or(SessionError::State(StateError::WrongMode {
            expected: mode,
            actual: self.modes.state(),
        }))?;
        compositor::ensure_painted(mask.preview())?;
        Ok(mask)
    }

    /// Makes every painted pixel transparent in a new state.
    pub fn apply_erase(&mut self) -> SessionResult<()> {
        self.ensure_mode(EditMode::Erase)?;
        let erased = compositor::apply_erase(self.current(), self.painted_mask(EditMode::Erase)?.preview());
        self.commit(erased, "erase");
        self.finish_mode()
    }

    /// Binary mask at source resolution, as sent to the inpainting service.
    pub fn inpaint_mask(&self) -> SessionResult<RgbaImage> {
        let mask = self.painted_mask(EditMode::Inpaint)?;
        let binary = compositor::rasterize_mask(mask.preview());
        Ok(compositor::scale_mask(&binary, self.natural_size()))
    }

    // Objects mode

    pub fn begin_objects(&mut self) -> SessionResult<()> {
        self.ensure_idle()?;
        self.modes.transition(EditEvent::BeginObjects)?;
        self.objects = OverlayObjects::new(self.display.unwrap_or(Size::new(0, 0)));
        Ok(())
    }

    pub fn objects(&self) -> &OverlayObjects {
        &self.objects
    }

    pub fn add_object(&mut self, object: NewObject) -> SessionResult<ObjectId> {
        self.ensure_mode(EditMode::Objects)?;
        Ok(self.objects.add(object))
    }

    /// Decodes `src` off the caller's task and places it as an image object.
    pub async fn add_image(&mut self, src: String) -> SessionResult<ObjectId> {
        self.ensure_mode(EditMode::Objects)?;
        let bitmap = decode_data_uri_async(src.clone()).await?;
        self.add_object(NewObject::Image { src, bitmap })
    }

    pub fn update_object(&mut self, id: ObjectId, patch: ObjectPatch) -> SessionResult<()> {
        self.ensure_mode(EditMode::Objects)?;
        self.objects.update(id, patch)?;
        Ok(())
    }

    pub fn remove_object(&mut self, id: ObjectId) -> SessionResult<()> {
        self.ensure_mode(EditMode::Objects)?;
        self.objects.remove(id)?;
        Ok(())
    }

    pub fn select_object(&mut self, id: Option<ObjectId>) -> SessionResult<SelectionState> {
        self.ensure_mode(EditMode::Objects)?;
        Ok(self.objects.select(id))
    }

    pub fn begin_interaction(&mut self, pointer: Point) -> SessionResult<Option<InteractionMode>> {
        self.ensure_mode(EditMode::Objects)?;
        Ok(self.objects.begin_interaction(pointer, &self.fonts))
    }

    pub fn continue_interaction(&mut self, pointer: Point) -> SessionResult<bool> {
        self.ensure_mode(EditMode::Objects)?;
        Ok(self.objects.continue_interaction(pointer))
    }

    pub fn end_interaction(&mut self) -> SessionResult<Option<InteractionMode>> {
        self.ensure_mode(EditMode::Objects)?;
        Ok(self.objects.end_interaction())
    }

    /// Bakes every object and the watermark at source resolution.
    pub fn apply_objects(&mut self) -> SessionResult<()> {
        self.ensure_mode(EditMode::Objects)?;
        let (scale_x, scale_y) = self.display_to_source_scale();
        let baked = compositor::apply_object_layer(
            self.current(),
            self.objects.objects(),
            self.objects.watermark(),
            LayerScale::new(scale_x, scale_y),
            &self.fonts,
        )?;
        self.commit(baked, "objects");
        self.finish_mode()
    }

    // Remote transforms. Each `prepare_*` raises `is_processing`; the
    // matching `complete_*` clears it whatever the outcome. A host driving
    // the two halves itself must pass `Err` to `complete_*` when it abandons
    // a request. The one-shot methods clear the flag if their future is
    // dropped mid-request.

    fn begin_processing(&mut self, mode: EditMode) -> SessionResult<()> {
        self.ensure_mode(mode)?;
        self.is_processing = true;
        Ok(())
    }

    /// Awaits a service call, unlocking the session if the caller gives up on it.
    async fn await_service<T>(&mut self, call: impl Future<Output = T>) -> T {
        let guard = ProcessingGuard::arm(&mut self.is_processing);
        let response = call.await;
        guard.disarm();
        response
    }

    async fn finish_processing(
        &mut self,
        image: TransformServiceResult<String>,
    ) -> SessionResult<ImageState> {
        self.is_processing = false;
        let decoded = match image {
            Ok(uri) => decode_data_uri_async(uri).await.map_err(SessionError::from),
            Err(err) => Err(SessionError::from(err)),
        };
        if let Err(err) = &decoded {
            tracing::warn!(%err, "remote transform failed; history unchanged");
        }
        decoded
    }

    /// Encodes the current state off the caller's task.
    async fn photo_request(&self) -> SessionResult<PhotoRequest> {
        Ok(PhotoRequest {
            photo_data_uri: encode_png_data_uri_async(Arc::clone(self.current())).await?,
        })
    }

    pub async fn prepare_enhance(&mut self) -> SessionResult<PhotoRequest> {
        self.ensure_mode(EditMode::None)?;
        let request = self.photo_request().await?;
        self.begin_processing(EditMode::None)?;
        Ok(request)
    }

    /// Pushes the enhanced image and returns the service's explanation.
    pub async fn complete_enhance(
        &mut self,
        response: TransformServiceResult<EnhanceResponse>,
    ) -> SessionResult<String> {
        let (image, reasoning) = match response.and_then(EnhanceResponse::validate) {
            Ok(response) => (Ok(response.enhanced_photo_data_uri), response.reasoning),
            Err(err) => (Err(err), String::new()),
        };
        let enhanced = self.finish_processing(image).await?;
        self.commit(Arc::unwrap_or_clone(enhanced), "enhance");
        Ok(reasoning)
    }

    pub async fn enhance<S: ImageTransformService>(&mut self, service: &S) -> SessionResult<String> {
        let request = self.prepare_enhance().await?;
        let response = self.await_service(service.enhance(request)).await;
        self.complete_enhance(response).await
    }

    pub async fn prepare_erase_background(&mut self) -> SessionResult<PhotoRequest> {
        self.ensure_mode(EditMode::None)?;
        let request = self.photo_request().await?;
        self.begin_processing(EditMode::None)?;
        Ok(request)
    }

    pub async fn complete_erase_background(
        &mut self,
        response: TransformServiceResult<EraseBackgroundResponse>,
    ) -> SessionResult<()> {
        let image = response
            .and_then(EraseBackgroundResponse::validate)
            .map(|response| response.photo_with_transparent_background);
        let cutout = self.finish_processing(image).await?;
        self.commit(Arc::unwrap_or_clone(cutout), "erase background");
        Ok(())
    }

    pub async fn erase_background<S: ImageTransformService>(&mut self, service: &S) -> SessionResult<()> {
        let request = self.prepare_erase_background().await?;
        let response = self.await_service(service.erase_background(request)).await;
        self.complete_erase_background(response).await
    }

    pub async fn prepare_inpaint(&mut self) -> SessionResult<InpaintRequest> {
        self.ensure_mode(EditMode::Inpaint)?;
        let mask = Arc::new(self.inpaint_mask()?);
        let PhotoRequest { photo_data_uri } = self.photo_request().await?;
        let request = InpaintRequest {
            photo_data_uri,
            mask_data_uri: encode_png_data_uri_async(mask).await?,
        };
        self.begin_processing(EditMode::Inpaint)?;
        Ok(request)
    }

    /// On success pushes the result and leaves inpaint mode; on failure the
    /// mask stays so the caller may retry or cancel.
    pub async fn complete_inpaint(
        &mut self,
        response: TransformServiceResult<InpaintResponse>,
    ) -> SessionResult<()> {
        let image = response
            .and_then(InpaintResponse::validate)
            .map(|response| response.inpainted_photo_data_uri);
        let inpainted = self.finish_processing(image).await?;
        self.commit(Arc::unwrap_or_clone(inpainted), "inpaint");
        self.finish_mode()
    }

    pub async fn inpaint<S: ImageTransformService>(&mut self, service: &S) -> SessionResult<()> {
        let request = self.prepare_inpaint().await?;
        let response = self.await_service(service.inpaint(request)).await;
        self.complete_inpaint(response).await
    }
}

/// Lowers the processing flag on drop unless the request ran to completion.
struct ProcessingGuard<'a> {
    flag: &'a mut bool,
    armed: bool,
}

impl<'a> ProcessingGuard<'a> {
    fn arm(flag: &'a mut bool) -> Self {
        Self { flag, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.flag = false;
            tracing::warn!("remote transform abandoned before completion");
        }
    }
}
