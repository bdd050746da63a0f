//! Overlay elements: watermarks and text labels.

mod text;
mod watermark;

pub use text::{FontFamily, GenericFamily, ParseColorError, TextColor, TextElement};
pub use watermark::{ImageHandle, WatermarkElement};

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-kind element identifier, assigned monotonically and never reused.
pub type ElementId = u32;

/// Opacity range shared by all overlays.
pub const MIN_OPACITY: f64 = 0.0;
pub const MAX_OPACITY: f64 = 1.0;

/// The two kinds of overlay element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Watermark,
    Text,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Watermark => f.write_str("watermark"),
            ElementKind::Text => f.write_str("text"),
        }
    }
}

/// Identity of a single element: `(kind, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub kind: ElementKind,
    pub id: ElementId,
}

impl ElementRef {
    pub fn watermark(id: ElementId) -> Self {
        Self {
            kind: ElementKind::Watermark,
            id,
        }
    }

    pub fn text(id: ElementId) -> Self {
        Self {
            kind: ElementKind::Text,
            id,
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// A single attribute edit.
///
/// Edits that do not apply to the target's kind (e.g. `Scale` on text) are
/// ignored. Numeric values are clamped to their valid ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attribute {
    /// Top-left position in document units.
    Position(Point),
    /// Watermark scale, clamped to [0.05, 1.0].
    Scale(f64),
    /// Opacity, clamped to [0.0, 1.0].
    Opacity(f64),
    /// Text content.
    Content(String),
    /// Font size in document units, clamped to [10, 100].
    FontSize(f64),
    FontFamily(FontFamily),
    Color(TextColor),
}

impl Attribute {
    /// Name of the edited field, for logging.
    pub fn field(&self) -> &'static str {
        match self {
            Attribute::Position(_) => "position",
            Attribute::Scale(_) => "scale",
            Attribute::Opacity(_) => "opacity",
            Attribute::Content(_) => "content",
            Attribute::FontSize(_) => "font_size",
            Attribute::FontFamily(_) => "font_family",
            Attribute::Color(_) => "color",
        }
    }
}

/// Clamp an opacity value, mapping NaN to fully opaque.
pub fn clamp_opacity(value: f64) -> f64 {
    if value.is_nan() {
        MAX_OPACITY
    } else {
        value.clamp(MIN_OPACITY, MAX_OPACITY)
    }
}

/// Read-only view of either element kind.
#[derive(Debug, Clone, Copy)]
pub enum ElementView<'a> {
    Watermark(&'a WatermarkElement),
    Text(&'a TextElement),
}

impl ElementView<'_> {
    pub fn element_ref(&self) -> ElementRef {
        match self {
            ElementView::Watermark(w) => ElementRef::watermark(w.id),
            ElementView::Text(t) => ElementRef::text(t.id),
        }
    }

    /// Committed top-left position (never includes a live drag offset).
    pub fn position(&self) -> Point {
        match self {
            ElementView::Watermark(w) => w.position,
            ElementView::Text(t) => t.position,
        }
    }

    pub fn opacity(&self) -> f64 {
        match self {
            ElementView::Watermark(w) => w.opacity,
            ElementView::Text(t) => t.opacity,
        }
    }
}
