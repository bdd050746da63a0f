//! Renderer trait abstraction and the CPU compositor.

use crate::fonts::FontBook;
use crate::raster::{draw_image, fill, stroke_rect};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use kurbo::{Point, Size};
use peniko::Color;
use stampink_core::geometry::{DocumentView, clamped_rect, fit_scale};
use stampink_core::{
    BoundsMap, DragSession, EditorError, ElementRef, ElementStore, ElementView, FontFamily,
};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Decode was cancelled before completing")]
    DecodeCancelled,
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("Invalid surface size {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },
    #[error("No base image loaded")]
    MissingBaseImage,
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

impl From<RenderError> for EditorError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Decode(_)
            | RenderError::DecodeCancelled
            | RenderError::InvalidSurface { .. } => EditorError::Decode(err.to_string()),
            RenderError::Encode(_) | RenderError::MissingBaseImage => {
                EditorError::Export(err.to_string())
            }
        }
    }
}

/// Colours, stroke widths and hint strings used by the interactive canvas.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub placeholder_background: Color,
    pub hint_color: Color,
    pub selection_color: Color,
    pub selection_width: f64,
    pub hint_font_size: f64,
    pub placeholder_text: String,
    pub call_to_action_text: String,
    pub add_element_hint_text: String,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            placeholder_background: Color::from_rgba8(0xf0, 0xf0, 0xf0, 255),
            hint_color: Color::from_rgba8(0x88, 0x88, 0x88, 255),
            selection_color: Color::from_rgba8(0x63, 0x66, 0xf1, 255),
            selection_width: 3.0,
            hint_font_size: 16.0,
            placeholder_text: "No image loaded".into(),
            call_to_action_text: "Upload a base image to get started".into(),
            add_element_hint_text: "Add a watermark or text to begin".into(),
        }
    }
}

/// Context for a single render pass.
pub struct RenderContext<'a> {
    /// Document to draw.
    pub store: &'a ElementStore,
    /// Size of the canvas buffer in pixels.
    pub canvas_size: Size,
    /// Size of the space element geometry is stored in.
    pub document_size: Size,
    /// Live drag, drawn at its preview position instead of the committed one.
    pub drag: Option<&'a DragSession>,
    /// Outline the active element.
    pub show_selection: bool,
    /// Draw the instructional hint lines.
    pub show_hints: bool,
    pub style: &'a RenderStyle,
}

impl<'a> RenderContext<'a> {
    /// Create a context with selection outline and hints enabled.
    ///
    /// The document initially coincides with the canvas.
    pub fn new(store: &'a ElementStore, canvas_size: Size, style: &'a RenderStyle) -> Self {
        Self {
            store,
            canvas_size,
            document_size: canvas_size,
            drag: None,
            show_selection: true,
            show_hints: true,
            style,
        }
    }

    /// Set the document size element geometry is expressed in.
    pub fn with_document_size(mut self, size: Size) -> Self {
        self.document_size = size;
        self
    }

    /// Set the live drag session.
    pub fn with_drag(mut self, drag: Option<&'a DragSession>) -> Self {
        self.drag = drag;
        self
    }

    /// Enable or disable the selection outline.
    pub fn with_selection(mut self, show: bool) -> Self {
        self.show_selection = show;
        self
    }

    /// Enable or disable hint text.
    pub fn with_hints(mut self, show: bool) -> Self {
        self.show_hints = show;
        self
    }

    /// Document position to draw `target` at: the drag preview if it is being dragged.
    fn draw_position(&self, target: ElementRef, committed: Point) -> Point {
        match self.drag {
            Some(session) if session.target == target => session.preview_position(),
            _ => committed,
        }
    }

    fn is_outlined(&self, target: ElementRef) -> bool {
        self.show_selection && self.store.active() == Some(target)
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Draw one frame into `surface`, returning the on-screen bounds of every element.
    ///
    /// On error `surface` keeps its previous contents.
    fn render(&mut self, ctx: &RenderContext, surface: &mut RgbaImage) -> RenderResult<BoundsMap>;

    /// Fonts used for text metrics and glyphs.
    fn fonts(&self) -> &FontBook;
}

/// Size the canvas buffer should have for the current document.
///
/// With a base image, the image's native size scaled to fit `container`
/// (never upscaled); otherwise the placeholder size.
pub fn canvas_buffer_size(store: &ElementStore, container: Size, placeholder: Size) -> Size {
    match store.base_image() {
        Some(base) => {
            let native = base.size();
            let fit = fit_scale(native, container);
            Size::new(
                (native.width * fit).round().max(1.0),
                (native.height * fit).round().max(1.0),
            )
        }
        None => placeholder,
    }
}

/// Integer pixel dimensions of a canvas size, rejecting empty or non-finite sizes.
pub(crate) fn surface_dimensions(size: Size) -> RenderResult<(u32, u32)> {
    let valid = |v: f64| v.is_finite() && v >= 1.0 && v <= u32::MAX as f64;
    if !valid(size.width) || !valid(size.height) {
        return Err(RenderError::InvalidSurface {
            width: size.width.max(0.0) as u32,
            height: size.height.max(0.0) as u32,
        });
    }
    Ok((size.width.round() as u32, size.height.round() as u32))
}

/// Base image resampled to the canvas, reused until either changes.
#[derive(Debug)]
struct FittedBase {
    generation: u64,
    pixels: RgbaImage,
}

/// Software compositor producing straight-alpha RGBA frames.
#[derive(Debug, Default)]
pub struct CpuRenderer {
    fonts: FontBook,
    fitted_base: Option<FittedBase>,
}

impl CpuRenderer {
    pub fn new(fonts: FontBook) -> Self {
        Self {
            fonts,
            fitted_base: None,
        }
    }

    /// `source` resized to `width`x`height`, resampling only when the base
    /// image or the canvas size changed since the last frame.
    fn fitted_base(
        &mut self,
        source: &RgbaImage,
        generation: u64,
        (width, height): (u32, u32),
    ) -> &RgbaImage {
        let fresh = matches!(
            &self.fitted_base,
            Some(cached) if cached.generation == generation
                && cached.pixels.dimensions() == (width, height)
        );
        if !fresh {
            self.fitted_base = None;
        }
        let cached = self.fitted_base.get_or_insert_with(|| {
            log::debug!("Resampling base image to {width}x{height}");
            FittedBase {
                generation,
                pixels: imageops::resize(source, width, height, FilterType::Triangle),
            }
        });
        &cached.pixels
    }

    fn draw_centered_hint(
        &self,
        frame: &mut RgbaImage,
        text: &str,
        center: Point,
        style: &RenderStyle,
    ) {
        let size = self.fonts.measure(FontFamily::default(), text, style.hint_font_size);
        let origin = Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0);
        self.fonts.draw_text(
            frame,
            FontFamily::default(),
            text,
            origin,
            style.hint_font_size,
            style.hint_color,
        );
    }
}

impl Renderer for CpuRenderer {
    fn render(&mut self, ctx: &RenderContext, surface: &mut RgbaImage) -> RenderResult<BoundsMap> {
        let (width, height) = surface_dimensions(ctx.canvas_size)?;
        let canvas = Size::new(width as f64, height as f64);
        let view = DocumentView::new(ctx.document_size, canvas);
        let center = Point::new(canvas.width / 2.0, canvas.height / 2.0);
        let line = ctx.style.hint_font_size * 2.0;
        let mut frame = RgbaImage::new(width, height);
        let mut bounds = BoundsMap::new();

        // Base layer
        match ctx.store.base_image() {
            Some(base) => {
                let fit = fit_scale(base.size(), canvas);
                let fitted = (
                    (base.size().width * fit).round().max(1.0) as u32,
                    (base.size().height * fit).round().max(1.0) as u32,
                );
                let pixels = base.bitmap.pixels();
                if pixels.dimensions() == fitted {
                    imageops::replace(&mut frame, pixels, 0, 0);
                } else {
                    let generation = ctx.store.base_generation();
                    let fitted = self.fitted_base(pixels, generation, fitted);
                    imageops::replace(&mut frame, fitted, 0, 0);
                }
            }
            None => {
                fill(&mut frame, ctx.style.placeholder_background);
                if ctx.show_hints {
                    let at = Point::new(center.x, center.y - line / 2.0);
                    self.draw_centered_hint(&mut frame, &ctx.style.placeholder_text, at, ctx.style);
                }
            }
        }

        for target in ctx.store.render_order() {
            let rect = match ctx.store.get(target) {
                Some(ElementView::Watermark(w)) => {
                    let position = view.to_canvas(ctx.draw_position(target, w.position));
                    let size = view.size_to_canvas(w.scaled_size());
                    let rect = clamped_rect(position, size, canvas);
                    draw_image(&mut frame, w.bitmap.pixels(), rect, w.opacity);
                    rect
                }
                Some(ElementView::Text(t)) => {
                    let position = view.to_canvas(ctx.draw_position(target, t.position));
                    let font_size = t.font_size * view.scale().y;
                    let size = self.fonts.measure(t.font_family, &t.content, font_size);
                    let rect = clamped_rect(position, size, canvas);
                    self.fonts.draw_text(
                        &mut frame,
                        t.font_family,
                        &t.content,
                        rect.origin(),
                        font_size,
                        t.color.with_opacity(t.opacity),
                    );
                    rect
                }
                None => continue,
            };
            bounds.record(target, rect);
            if ctx.is_outlined(target) {
                let style = ctx.style;
                stroke_rect(&mut frame, rect, style.selection_color, style.selection_width);
            }
        }

        if ctx.show_hints && ctx.store.is_empty() {
            let (text, at) = if ctx.store.has_base_image() {
                let at = Point::new(center.x, center.y + line * 2.0);
                (&ctx.style.add_element_hint_text, at)
            } else {
                let at = Point::new(center.x, center.y + line / 2.0);
                (&ctx.style.call_to_action_text, at)
            };
            self.draw_centered_hint(&mut frame, text, at, ctx.style);
        }

        *surface = frame;
        Ok(bounds)
    }

    fn fonts(&self) -> &FontBook {
        &self.fonts
    }
}
