//! Watermark overlay: a decoded raster image with position, scale and opacity.

use super::{Attribute, ElementId, clamp_opacity};
use image::RgbaImage;
use kurbo::{Point, Size};

/// Owned decoded bitmap.
///
/// Each handle belongs to exactly one element (or the base image); dropping
/// the owner releases the pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    pixels: RgbaImage,
}

impl ImageHandle {
    /// Wrap decoded RGBA pixels.
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Native pixel width.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Native pixel height.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Native size as floating-point dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width() as f64, self.height() as f64)
    }

    /// Borrow the pixels.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// A watermark image placed on the canvas.
#[derive(Debug, Clone)]
pub struct WatermarkElement {
    pub(crate) id: ElementId,
    /// Decoded image, owned by this element.
    pub bitmap: ImageHandle,
    /// File name it was uploaded with.
    pub name: String,
    /// Top-left corner in document units.
    pub position: Point,
    /// Uniform scale relative to the bitmap's native size.
    pub scale: f64,
    /// Opacity in [0, 1].
    pub opacity: f64,
}

impl WatermarkElement {
    pub const DEFAULT_SCALE: f64 = 0.3;
    pub const MIN_SCALE: f64 = 0.05;
    pub const MAX_SCALE: f64 = 1.0;

    /// Create a watermark at the origin with default scale and full opacity.
    pub(crate) fn new(id: ElementId, bitmap: ImageHandle, name: impl Into<String>) -> Self {
        Self {
            id,
            bitmap,
            name: name.into(),
            position: Point::ORIGIN,
            scale: Self::DEFAULT_SCALE,
            opacity: 1.0,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// On-screen size: native size times scale.
    pub fn scaled_size(&self) -> Size {
        self.bitmap.size() * self.scale
    }

    /// Apply an attribute edit. Returns `true` if anything changed.
    pub(crate) fn apply(&mut self, attribute: &Attribute) -> bool {
        match attribute {
            Attribute::Position(p) => self.position = *p,
            Attribute::Scale(s) => self.scale = clamp_scale(*s),
            Attribute::Opacity(o) => self.opacity = clamp_opacity(*o),
            _ => return false,
        }
        true
    }
}

fn clamp_scale(value: f64) -> f64 {
    if value.is_nan() {
        WatermarkElement::DEFAULT_SCALE
    } else {
        value.clamp(WatermarkElement::MIN_SCALE, WatermarkElement::MAX_SCALE)
    }
}
