//! The editing session facade.
//!
//! [`Editor`] is everything a UI needs: it owns the document, turns raw
//! pointer events into selection and drag changes, schedules redraws through
//! a [`FrameHost`], and produces the full-resolution export. Every entry
//! point records failures in a single error slot and also returns them.

use crate::config::{ConfigError, EditorConfig};
use image::RgbaImage;
use kurbo::{Point, Rect, Size};
use stampink_core::{
    Attribute, BaseImage, BoundsMap, CanvasLayout, DocumentView, DragCommit, DragController,
    EditorError, EditorResult, ElementId, ElementRef, ElementStore, ElementView, ErrorSlot,
    FrameHost, FrameScheduler, FrameToken, ImageHandle, ManualFrameHost, PointerInput,
    StartOutcome, TextElement, WatermarkElement,
};
use stampink_render::{
    CpuRenderer, DecodeTask, ExportCompositor, ExportedImage, FontBook, ImageLoader,
    RenderContext, RenderResult, RenderStyle, Renderer, canvas_buffer_size,
};
use std::path::Path;

/// Download name used when the base image had no usable file name.
const DEFAULT_EXPORT_NAME: &str = "watermarked.png";

/// One editing session.
pub struct Editor {
    config: EditorConfig,
    style: RenderStyle,
    store: ElementStore,
    drag: DragController,
    frames: FrameScheduler,
    host: Box<dyn FrameHost>,
    renderer: Box<dyn Renderer>,
    loader: ImageLoader,
    /// Last successfully rendered frame.
    surface: RgbaImage,
    /// Element bounds from the last successful render.
    bounds: BoundsMap,
    /// On-screen canvas rectangle; `None` until the host reports one.
    display_rect: Option<Rect>,
    /// Canvas size when the base image was installed; element geometry is stored at this size.
    document_size: Option<Size>,
    errors: ErrorSlot,
    pending_decodes: usize,
}

impl Editor {
    /// Create an editor with system fonts and a host that never calls back.
    ///
    /// Use [`Editor::flush`] or [`Editor::render_now`] to draw.
    pub fn new(config: EditorConfig) -> Result<Self, ConfigError> {
        let fonts = FontBook::load(&config.font_sources());
        Self::with_parts(
            config,
            Box::new(CpuRenderer::new(fonts)),
            Box::new(ManualFrameHost),
        )
    }

    /// Create an editor with an explicit renderer and frame host.
    pub fn with_parts(
        config: EditorConfig,
        renderer: Box<dyn Renderer>,
        host: Box<dyn FrameHost>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let style = config.render_style()?;
        let mut editor = Self {
            config,
            style,
            store: ElementStore::new(),
            drag: DragController::new(),
            frames: FrameScheduler::new(),
            host,
            renderer,
            loader: ImageLoader::new(),
            surface: RgbaImage::new(1, 1),
            bounds: BoundsMap::new(),
            display_rect: None,
            document_size: None,
            errors: ErrorSlot::new(),
            pending_decodes: 0,
        };
        editor.invalidate();
        Ok(editor)
    }

    // --- Base image ---

    /// Decode and install a new base image.
    ///
    /// On success all elements are cleared and id counters reset. On failure
    /// the previous session is untouched.
    pub async fn load_base_image(
        &mut self,
        bytes: Vec<u8>,
        name: Option<String>,
    ) -> EditorResult<()> {
        let task = self.begin_decode(bytes.clone());
        let result = task.await;
        self.apply_base_image(result, bytes, name)
    }

    /// Start decoding without applying the result.
    ///
    /// [`Editor::is_loading`] stays true until the result is handed to
    /// [`Editor::apply_base_image`] or [`Editor::apply_watermark`].
    pub fn begin_decode(&mut self, bytes: Vec<u8>) -> DecodeTask {
        self.pending_decodes += 1;
        self.loader.decode(bytes)
    }

    /// Apply a finished base-image decode. The last applied result wins.
    pub fn apply_base_image(
        &mut self,
        result: RenderResult<ImageHandle>,
        encoded: Vec<u8>,
        name: Option<String>,
    ) -> EditorResult<()> {
        self.pending_decodes = self.pending_decodes.saturating_sub(1);
        let bitmap = self.errors.capture(result.map_err(EditorError::from))?;

        if self.drag.interaction_cancel() {
            self.frames.stop_animation(self.host.as_mut());
        }
        self.store.set_base_image(BaseImage::new(bitmap, encoded, name));
        self.document_size = Some(self.canvas_size());
        self.bounds.clear();
        self.errors.clear();
        self.sync();
        Ok(())
    }

    // --- Elements ---

    /// Decode a watermark image and add it, selected, at the origin.
    pub async fn add_watermark(
        &mut self,
        bytes: Vec<u8>,
        name: impl Into<String>,
    ) -> EditorResult<ElementId> {
        let name = name.into();
        if !self.store.has_base_image() {
            log::warn!("Watermark {name:?} rejected: no base image");
            return self.errors.capture(Err(EditorError::NO_BASE_IMAGE));
        }
        let task = self.begin_decode(bytes);
        let result = task.await;
        self.apply_watermark(result, name)
    }

    /// Apply a finished watermark decode.
    pub fn apply_watermark(
        &mut self,
        result: RenderResult<ImageHandle>,
        name: impl Into<String>,
    ) -> EditorResult<ElementId> {
        self.pending_decodes = self.pending_decodes.saturating_sub(1);
        let bitmap = self.errors.capture(result.map_err(EditorError::from))?;
        let id = self.errors.capture(self.store.add_watermark(bitmap, name))?;
        self.errors.clear();
        self.sync();
        Ok(id)
    }

    /// Add a text label, selected, at the default position.
    pub fn add_text(&mut self, content: impl Into<String>) -> EditorResult<ElementId> {
        let id = self.errors.capture(self.store.add_text(content))?;
        self.errors.clear();
        self.sync();
        Ok(id)
    }

    /// Change an attribute of the active element. No-op without a selection.
    pub fn set_active_element_attribute(&mut self, attribute: Attribute) -> bool {
        let changed = self.store.update_active(attribute);
        self.sync();
        changed
    }

    /// Remove the active element, cancelling a drag on it.
    pub fn remove_active_element(&mut self) -> bool {
        let Some(active) = self.store.active() else {
            return false;
        };
        if self.drag.session().is_some_and(|s| s.target == active) {
            self.drag.interaction_cancel();
            self.frames.stop_animation(self.host.as_mut());
        }
        let removed = self.store.remove(active);
        self.sync();
        removed
    }

    /// Select an element, or clear the selection with `None`.
    pub fn select_element(&mut self, target: Option<ElementRef>) -> bool {
        let selected = self.store.select(target);
        self.sync();
        selected
    }

    /// Drop the base image, all elements, the selection and the error.
    pub fn reset_session(&mut self) {
        if self.drag.interaction_cancel() {
            self.frames.stop_animation(self.host.as_mut());
        }
        self.store.reset();
        self.document_size = None;
        self.bounds.clear();
        self.errors.clear();
        self.sync();
    }

    // --- Export ---

    /// Composite at the base image's native resolution and encode as PNG.
    ///
    /// Rejected while a drag is in progress, since the dragged element's
    /// position is not committed yet.
    pub fn export_composite(&mut self) -> EditorResult<ExportedImage> {
        if self.drag.is_dragging() {
            log::warn!("Export rejected: drag in progress");
            return self
                .errors
                .capture(Err(EditorError::Export("finish moving the element first".into())));
        }
        if !self.store.has_base_image() {
            let err = EditorError::Export("no base image loaded".into());
            return self.errors.capture(Err(err));
        }
        let document = self.view().document_size;
        let result = ExportCompositor::new(self.renderer.fonts())
            .export(&self.store, document)
            .map_err(|e| EditorError::Export(e.to_string()));
        let exported = self.errors.capture(result)?;
        self.errors.clear();
        Ok(exported)
    }

    // --- Pointer input ---

    /// Pointer or touch went down at raw display coordinates.
    ///
    /// Returns `None` if the canvas is not laid out or the event had no point.
    pub fn on_interaction_start(&mut self, input: &PointerInput) -> Option<StartOutcome> {
        let point = self.canvas_point(input)?;
        // Hit testing needs bounds that reflect the current document
        self.flush();
        let view = self.view();
        let outcome = self
            .drag
            .interaction_start(point, &mut self.store, &self.bounds, &view);
        if matches!(outcome, StartOutcome::Grabbed(_)) {
            self.frames.start_animation(self.host.as_mut());
        }
        self.sync();
        Some(outcome)
    }

    /// Pointer moved. Only the live drag offset changes; the redraw happens on the next frame.
    pub fn on_interaction_move(&mut self, input: &PointerInput) -> bool {
        if !self.drag.is_dragging() {
            return false;
        }
        let Some(point) = self.canvas_point(input) else {
            return false;
        };
        let view = self.view();
        if self.drag.interaction_move(point, &view).is_none() {
            return false;
        }
        self.invalidate();
        true
    }

    /// Pointer released: commit the clamped position.
    pub fn on_interaction_end(&mut self) -> Option<DragCommit> {
        let view = self.view();
        let was_dragging = self.drag.is_dragging();
        let commit = self.drag.interaction_end(&mut self.store, &self.bounds, &view);
        if was_dragging {
            self.invalidate();
            self.frames.stop_animation(self.host.as_mut());
        }
        self.sync();
        commit
    }

    /// Pointer lost (e.g. touch cancelled): drop the drag without committing.
    pub fn on_interaction_cancel(&mut self) -> bool {
        let cancelled = self.drag.interaction_cancel();
        if cancelled {
            // Redraw at the committed position
            self.invalidate();
            self.frames.stop_animation(self.host.as_mut());
        }
        cancelled
    }

    // --- Frames and layout ---

    /// The host's refresh tick for `token`. Returns `true` if a frame was drawn.
    pub fn on_animation_frame(&mut self, token: FrameToken) -> bool {
        if !self.frames.on_frame(token, self.host.as_mut()) {
            return false;
        }
        self.render_now().is_ok()
    }

    /// Render now if anything changed since the last frame.
    pub fn flush(&mut self) -> bool {
        self.sync();
        if !self.frames.is_dirty() {
            return false;
        }
        self.render_now().is_ok()
    }

    /// Render a frame immediately.
    ///
    /// On failure the previous frame and bounds are kept and the error is reported.
    pub fn render_now(&mut self) -> EditorResult<()> {
        let view = self.view();
        let ctx = RenderContext::new(&self.store, view.canvas_size, &self.style)
            .with_document_size(view.document_size)
            .with_drag(self.drag.session())
            .with_hints(self.config.show_hints);
        let result = self.renderer.render(&ctx, &mut self.surface);
        self.frames.mark_drawn();
        match result {
            Ok(bounds) => {
                self.bounds = bounds;
                Ok(())
            }
            Err(e) => self.errors.capture(Err(e.into())),
        }
    }

    /// The canvas element's on-screen rectangle, in display pixels.
    pub fn set_display_rect(&mut self, rect: Rect) {
        self.display_rect = Some(rect);
    }

    /// Change the area the base image is fitted into.
    ///
    /// Only the canvas is rescaled. Element geometry and the export stay as
    /// they were, and a live drag keeps following the pointer.
    pub fn resize_container(&mut self, width: f64, height: f64) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            log::warn!("Ignoring container resize to {width}x{height}");
            return;
        }
        self.config.container_width = width;
        self.config.container_height = height;
        self.invalidate();
    }

    // --- Queries ---

    /// Size of the canvas buffer for the current document.
    pub fn canvas_size(&self) -> Size {
        canvas_buffer_size(
            &self.store,
            self.config.container_size(),
            self.config.placeholder_size(),
        )
    }

    /// Current document-to-canvas mapping.
    pub fn view(&self) -> DocumentView {
        let canvas = self.canvas_size();
        DocumentView::new(self.document_size.unwrap_or(canvas), canvas)
    }

    /// Current display-to-canvas mapping.
    pub fn layout(&self) -> CanvasLayout {
        let buffer = self.canvas_size();
        match self.display_rect {
            Some(rect) => CanvasLayout::new(rect, buffer),
            None => CanvasLayout::unscaled(buffer),
        }
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Last successfully rendered frame.
    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    /// Element bounds from the last successful render.
    pub fn bounds(&self) -> &BoundsMap {
        &self.bounds
    }

    pub fn active_element(&self) -> Option<ElementView<'_>> {
        self.store.active_element()
    }

    pub fn watermarks(&self) -> &[WatermarkElement] {
        self.store.watermarks()
    }

    pub fn texts(&self) -> &[TextElement] {
        self.store.texts()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// True while a decode started through this editor has not been applied.
    pub fn is_loading(&self) -> bool {
        self.pending_decodes > 0
    }

    /// The current reported error.
    pub fn error(&self) -> Option<&EditorError> {
        self.errors.current()
    }

    pub fn error_message(&self) -> Option<String> {
        self.errors.message()
    }

    /// Dismiss the current error.
    pub fn clear_error(&mut self) {
        self.errors.clear();
    }

    /// Download file name derived from the base image's name.
    pub fn suggested_export_name(&self) -> String {
        self.store
            .base_image()
            .and_then(|base| base.name.as_deref())
            .and_then(|name| Path::new(name).file_stem())
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .map(|stem| format!("{stem}_watermarked.png"))
            .unwrap_or_else(|| DEFAULT_EXPORT_NAME.to_string())
    }

    fn canvas_point(&self, input: &PointerInput) -> Option<Point> {
        let position = input.primary_position()?;
        self.layout().to_canvas_space(position)
    }

    fn invalidate(&mut self) {
        self.frames.invalidate(self.host.as_mut());
    }

    /// Schedule a redraw if the store changed.
    fn sync(&mut self) {
        if self.store.take_dirty() {
            self.invalidate();
        }
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        self.frames.shutdown(self.host.as_mut());
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("canvas_size", &self.canvas_size())
            .field("elements", &self.store.element_count())
            .field("active", &self.store.active())
            .field("dragging", &self.drag.is_dragging())
            .field("error", &self.errors.current())
            .finish()
    }
}
