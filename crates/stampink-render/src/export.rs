//! Full-resolution composite export.
//!
//! Element geometry lives in document space, which is usually a downscaled
//! view of the base image. Export redraws every element at the base image's
//! native resolution, scaling positions and sizes by `native / document` per
//! axis, with no selection outline or hint text.

use crate::fonts::FontBook;
use crate::loader::ImageLoader;
use crate::raster::draw_image;
use crate::renderer::{RenderError, RenderResult, surface_dimensions};
use image::RgbaImage;
use kurbo::{Point, Rect, Size, Vec2};
use stampink_core::ElementStore;
use stampink_core::geometry::{clamp_origin, clamped_rect};

/// An encoded export.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    /// PNG file bytes.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Draws the session at native resolution.
#[derive(Debug, Clone, Copy)]
pub struct ExportCompositor<'a> {
    fonts: &'a FontBook,
}

impl<'a> ExportCompositor<'a> {
    pub fn new(fonts: &'a FontBook) -> Self {
        Self { fonts }
    }

    /// Composite the base image and all elements at native resolution.
    ///
    /// `document_size` is the size of the space element geometry is
    /// expressed in. It does not follow later container resizes.
    pub fn compose(&self, store: &ElementStore, document_size: Size) -> RenderResult<RgbaImage> {
        let base = store.base_image().ok_or(RenderError::MissingBaseImage)?;
        surface_dimensions(document_size)?;

        let native = if base.encoded.is_empty() {
            base.bitmap.clone()
        } else {
            ImageLoader::decode_now(&base.encoded)?
        };
        let native_size = native.size();
        let ratio = Vec2::new(
            native_size.width / document_size.width,
            native_size.height / document_size.height,
        );
        let to_native =
            |r: Rect| Rect::new(r.x0 * ratio.x, r.y0 * ratio.y, r.x1 * ratio.x, r.y1 * ratio.y);

        let mut out = native.pixels().clone();

        for w in store.watermarks() {
            let on_screen = clamped_rect(w.position, w.scaled_size(), document_size);
            draw_image(&mut out, w.bitmap.pixels(), to_native(on_screen), w.opacity);
        }

        for t in store.texts() {
            let measured = self.fonts.measure(t.font_family, &t.content, t.font_size);
            let on_screen = clamped_rect(t.position, measured, document_size);
            let font_size = t.font_size * ratio.y;
            let origin = Point::new(on_screen.x0 * ratio.x, on_screen.y0 * ratio.y);
            let size = self.fonts.measure(t.font_family, &t.content, font_size);
            let origin = clamp_origin(origin, size, native_size);
            self.fonts.draw_text(
                &mut out,
                t.font_family,
                &t.content,
                origin,
                font_size,
                t.color.with_opacity(t.opacity),
            );
        }

        Ok(out)
    }

    /// Composite and encode as PNG.
    pub fn export(&self, store: &ElementStore, document_size: Size) -> RenderResult<ExportedImage> {
        let composite = self.compose(store, document_size)?;
        let (width, height) = composite.dimensions();
        let png = encode_png(composite.as_raw(), width, height)?;
        log::info!(
            "Exported {}x{} composite ({} elements, {} bytes)",
            width,
            height,
            store.element_count(),
            png.len()
        );
        Ok(ExportedImage { png, width, height })
    }
}

/// Encode straight-alpha RGBA8 pixels as PNG.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgba_data)?;
        writer.finish()?;
    }
    Ok(png_data)
}
