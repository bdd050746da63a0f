//! Text label overlay.

use super::{Attribute, ElementId, clamp_opacity};
use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed list of selectable font families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Inter,
    Arial,
    Verdana,
    Georgia,
    TimesNewRoman,
    CourierNew,
    Impact,
}

/// Generic fallback used when the named family is not installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericFamily {
    SansSerif,
    Serif,
    Monospace,
}

impl FontFamily {
    /// Family name as installed on the system.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Inter => "Inter",
            FontFamily::Arial => "Arial",
            FontFamily::Verdana => "Verdana",
            FontFamily::Georgia => "Georgia",
            FontFamily::TimesNewRoman => "Times New Roman",
            FontFamily::CourierNew => "Courier New",
            FontFamily::Impact => "Impact",
        }
    }

    pub fn generic(&self) -> GenericFamily {
        match self {
            FontFamily::Georgia | FontFamily::TimesNewRoman => GenericFamily::Serif,
            FontFamily::CourierNew => GenericFamily::Monospace,
            _ => GenericFamily::SansSerif,
        }
    }

    /// Get all available font families.
    pub fn all() -> &'static [FontFamily] {
        &[
            FontFamily::Inter,
            FontFamily::Arial,
            FontFamily::Verdana,
            FontFamily::Georgia,
            FontFamily::TimesNewRoman,
            FontFamily::CourierNew,
            FontFamily::Impact,
        ]
    }
}

/// Opaque RGB text colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TextColor {
    pub const BLACK: TextColor = TextColor::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Colour with the given alpha applied.
    pub fn with_opacity(&self, opacity: f64) -> Color {
        let a = (clamp_opacity(opacity) * 255.0).round() as u8;
        Color::from_rgba8(self.r, self.g, self.b, a)
    }
}

/// Error returned when a colour string is not `#rgb` or `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid colour: {0:?}")]
pub struct ParseColorError(String);

impl FromStr for TextColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        // from_str_radix alone would accept a leading '+'
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel =
            |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|_| err());
        match hex.len() {
            3 => Ok(TextColor::new(
                channel(0..1)? * 17,
                channel(1..2)? * 17,
                channel(2..3)? * 17,
            )),
            6 => Ok(TextColor::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A text label placed on the canvas.
///
/// On-screen size is not stored; the renderer measures it every pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    pub(crate) id: ElementId,
    pub content: String,
    /// Top-left corner of the text box in document units.
    pub position: Point,
    /// Font size in pixels.
    pub font_size: f64,
    pub font_family: FontFamily,
    pub color: TextColor,
    pub opacity: f64,
}

impl TextElement {
    pub const DEFAULT_POSITION: Point = Point::new(50.0, 50.0);
    pub const DEFAULT_FONT_SIZE: f64 = 30.0;
    pub const MIN_FONT_SIZE: f64 = 10.0;
    pub const MAX_FONT_SIZE: f64 = 100.0;
    /// Line box height as a multiple of the font size.
    pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

    pub(crate) fn new(id: ElementId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            position: Self::DEFAULT_POSITION,
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            color: TextColor::BLACK,
            opacity: 1.0,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Height of the text box, `font_size * 1.2`.
    pub fn line_height(&self) -> f64 {
        self.font_size * Self::LINE_HEIGHT_FACTOR
    }

    pub(crate) fn apply(&mut self, attribute: &Attribute) -> bool {
        match attribute {
            Attribute::Position(p) => self.position = *p,
            Attribute::Opacity(o) => self.opacity = clamp_opacity(*o),
            Attribute::Content(c) => self.content.clone_from(c),
            Attribute::FontSize(s) => self.font_size = clamp_font_size(*s),
            Attribute::FontFamily(f) => self.font_family = *f,
            Attribute::Color(c) => self.color = *c,
            Attribute::Scale(_) => return false,
        }
        true
    }
}

fn clamp_font_size(value: f64) -> f64 {
    if value.is_nan() {
        TextElement::DEFAULT_FONT_SIZE
    } else {
        value.clamp(TextElement::MIN_FONT_SIZE, TextElement::MAX_FONT_SIZE)
    }
}
