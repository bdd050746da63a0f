//! Font resolution, text metrics and glyph rasterization.

use crate::raster::{blend_pixel, color_bytes};
use ab_glyph::{Font, FontArc, FontVec, GlyphId, PxScale, ScaleFont, point};
use image::RgbaImage;
use kurbo::{Point, Size};
use peniko::Color;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use stampink_core::elements::{FontFamily, GenericFamily, TextElement};

/// Bundled face used for any family the system cannot provide.
static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const DEJAVU_SANS_FAMILY: &str = "DejaVu Sans";

/// Installed families tried, in order, for each generic family.
const SANS_SERIF_CANDIDATES: &[&str] = &[
    "Arial",
    "Helvetica",
    "Liberation Sans",
    "Noto Sans",
    "DejaVu Sans",
];
const SERIF_CANDIDATES: &[&str] = &[
    "Times New Roman",
    "Times",
    "Liberation Serif",
    "Noto Serif",
    "DejaVu Serif",
];
const MONOSPACE_CANDIDATES: &[&str] = &[
    "Courier New",
    "Courier",
    "Liberation Mono",
    "Noto Sans Mono",
    "DejaVu Sans Mono",
];

/// Average advance, as a fraction of the font size, if even the bundled face is unusable.
const APPROX_ADVANCE: f64 = 0.6;

/// Where to look for fonts.
#[derive(Debug, Clone, Default)]
pub struct FontSources {
    /// Scan the system font directories.
    pub load_system_fonts: bool,
    /// Additional directories to scan.
    pub font_dirs: Vec<PathBuf>,
}

/// Faces for the fixed family list.
///
/// Families the system cannot resolve use the bundled DejaVu Sans face, so
/// text always measures and draws with real glyphs.
#[derive(Clone)]
pub struct FontBook {
    faces: HashMap<FontFamily, FontArc>,
    fallback: Option<FontArc>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("resolved", &self.faces.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::bundled()
    }
}

impl FontBook {
    /// A book where every family draws with the bundled face.
    pub fn bundled() -> Self {
        let fallback = match FontArc::try_from_slice(DEJAVU_SANS) {
            Ok(font) => Some(font),
            Err(e) => {
                log::error!("Bundled font could not be parsed: {e}");
                None
            }
        };
        Self {
            faces: HashMap::new(),
            fallback,
        }
    }

    /// Resolve every family in [`FontFamily::all`] against the given sources.
    ///
    /// Generic fallbacks are pointed at families that are actually installed;
    /// anything still unresolved uses the bundled face.
    pub fn load(sources: &FontSources) -> Self {
        let mut db = fontdb::Database::new();
        if sources.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &sources.font_dirs {
            db.load_fonts_dir(dir);
        }
        db.load_font_data(DEJAVU_SANS.to_vec());
        configure_generic_families(&mut db);

        let mut book = Self::bundled();
        let mut loaded: HashMap<fontdb::ID, FontArc> = HashMap::new();
        for &family in FontFamily::all() {
            let generic = match family.generic() {
                GenericFamily::SansSerif => fontdb::Family::SansSerif,
                GenericFamily::Serif => fontdb::Family::Serif,
                GenericFamily::Monospace => fontdb::Family::Monospace,
            };
            let query = fontdb::Query {
                families: &[fontdb::Family::Name(family.name()), generic],
                ..Default::default()
            };
            let Some(id) = db.query(&query) else {
                log::warn!("No installed face for {:?}; using bundled font", family.name());
                continue;
            };
            if let Some(font) = loaded.get(&id) {
                book.faces.insert(family, font.clone());
                continue;
            }
            let font = db.with_face_data(id, |data, index| {
                FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
            });
            match font.flatten() {
                Some(font) => {
                    let font = FontArc::new(font);
                    loaded.insert(id, font.clone());
                    book.faces.insert(family, font);
                }
                None => log::warn!("Font face for {:?} could not be parsed", family.name()),
            }
        }
        log::info!(
            "Resolved {} of {} font families ({} distinct faces)",
            book.faces.len(),
            FontFamily::all().len(),
            loaded.len()
        );
        book
    }

    /// Register a face for a family, replacing any previous one.
    pub fn insert(&mut self, family: FontFamily, font: FontArc) {
        self.faces.insert(family, font);
    }

    /// Whether `family` resolved to its own face rather than the bundled one.
    pub fn is_resolved(&self, family: FontFamily) -> bool {
        self.faces.contains_key(&family)
    }

    /// Face used to draw `family`.
    pub fn font(&self, family: FontFamily) -> Option<&FontArc> {
        self.faces.get(&family).or(self.fallback.as_ref())
    }

    /// On-screen size of a single line of text.
    ///
    /// Height is always `font_size * 1.2`; width comes from glyph advances.
    pub fn measure(&self, family: FontFamily, text: &str, font_size: f64) -> Size {
        let height = font_size * TextElement::LINE_HEIGHT_FACTOR;
        let width = match self.font(family) {
            Some(font) => {
                let scaled = font.as_scaled(px_scale(font, font_size));
                let mut width = 0.0f32;
                let mut last: Option<GlyphId> = None;
                for ch in text.chars() {
                    let id = font.glyph_id(ch);
                    if let Some(prev) = last {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    last = Some(id);
                }
                width as f64
            }
            None => text.chars().count() as f64 * font_size * APPROX_ADVANCE,
        };
        Size::new(width, height)
    }

    /// Draw a single line of text whose line box has its top-left at `origin`.
    ///
    /// Glyphs are vertically centred in the `font_size * 1.2` line box.
    pub fn draw_text(
        &self,
        surface: &mut RgbaImage,
        family: FontFamily,
        text: &str,
        origin: Point,
        font_size: f64,
        color: Color,
    ) {
        let Some(font) = self.font(family) else {
            return;
        };
        let scale = px_scale(font, font_size);
        let scaled = font.as_scaled(scale);
        let line_height = font_size * TextElement::LINE_HEIGHT_FACTOR;
        let glyph_height = (scaled.ascent() - scaled.descent()) as f64;
        let baseline = origin.y + (line_height - glyph_height) / 2.0 + scaled.ascent() as f64;
        let src = color_bytes(color);

        let mut caret = origin.x as f32;
        let mut last: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = last {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline as f32));
            caret += scaled.h_advance(id);
            last = Some(id);

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    blend_pixel(
                        surface,
                        bounds.min.x as i64 + gx as i64,
                        bounds.min.y as i64 + gy as i64,
                        src,
                        coverage,
                    );
                });
            }
        }
    }
}

/// Point fontdb's generic families at the first installed candidate.
///
/// fontdb's defaults name Windows families, which most Linux hosts lack.
fn configure_generic_families(db: &mut fontdb::Database) {
    let available: HashSet<String> = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(family, _lang)| family.clone()))
        .collect();
    let pick = |candidates: &[&str]| {
        candidates
            .iter()
            .find(|family| available.contains(**family))
            .map(|family| family.to_string())
    };

    if let Some(family) = pick(SANS_SERIF_CANDIDATES) {
        db.set_sans_serif_family(family);
    } else {
        db.set_sans_serif_family(DEJAVU_SANS_FAMILY);
    }
    if let Some(family) = pick(SERIF_CANDIDATES) {
        db.set_serif_family(family);
    }
    if let Some(family) = pick(MONOSPACE_CANDIDATES) {
        db.set_monospace_family(family);
    }
}

/// Pixel scale such that one em equals `font_size` pixels, as in CSS.
fn px_scale(font: &FontArc, font_size: f64) -> PxScale {
    let size = font_size as f32;
    match font.units_per_em() {
        Some(units_per_em) if units_per_em > 0.0 => {
            PxScale::from(size * font.height_unscaled() / units_per_em)
        }
        _ => PxScale::from(size),
    }
}
