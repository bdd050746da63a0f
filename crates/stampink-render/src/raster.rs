//! Pixel-level drawing on straight-alpha RGBA buffers.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use kurbo::Rect;
use peniko::Color;

/// Composite `src` over the pixel at `(x, y)` with extra `coverage` in [0, 1].
///
/// Out-of-bounds coordinates are ignored, so callers can draw partially
/// off-surface shapes without clipping first.
pub fn blend_pixel(surface: &mut RgbaImage, x: i64, y: i64, src: [u8; 4], coverage: f32) {
    if x < 0 || y < 0 || x >= surface.width() as i64 || y >= surface.height() as i64 {
        return;
    }
    let sa = (src[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let dst = surface.get_pixel_mut(x as u32, y as u32);
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    *dst = Rgba(out);
}

/// Straight-alpha RGBA bytes of a colour.
pub fn color_bytes(color: Color) -> [u8; 4] {
    let rgba = color.to_rgba8();
    [rgba.r, rgba.g, rgba.b, rgba.a]
}

/// Fill the whole surface with a solid colour (no blending).
pub fn fill(surface: &mut RgbaImage, color: Color) {
    let px = Rgba(color_bytes(color));
    for p in surface.pixels_mut() {
        *p = px;
    }
}

/// Pixel span covered by `[lo, hi)` after rounding, clipped to `[0, limit)`.
fn span(lo: f64, hi: f64, limit: u32) -> std::ops::Range<i64> {
    let start = lo.round().max(0.0) as i64;
    let end = (hi.round() as i64).min(limit as i64);
    start..end.max(start)
}

/// Blend a solid rectangle onto the surface.
pub fn fill_rect(surface: &mut RgbaImage, rect: Rect, color: Color) {
    let src = color_bytes(color);
    let xs = span(rect.x0, rect.x1, surface.width());
    for y in span(rect.y0, rect.y1, surface.height()) {
        for x in xs.clone() {
            blend_pixel(surface, x, y, src, 1.0);
        }
    }
}

/// Stroke a rectangle outline of `width` pixels centred on the rectangle's edges.
pub fn stroke_rect(surface: &mut RgbaImage, rect: Rect, color: Color, width: f64) {
    if width <= 0.0 {
        return;
    }
    let half = width / 2.0;
    let outer = rect.inflate(half, half);
    let inner = rect.inflate(-half, -half);
    let src = color_bytes(color);
    for y in span(outer.y0, outer.y1, surface.height()) {
        for x in span(outer.x0, outer.x1, surface.width()) {
            let (fx, fy) = (x as f64 + 0.5, y as f64 + 0.5);
            let inside_inner = inner.width() > 0.0
                && inner.height() > 0.0
                && fx > inner.x0
                && fx < inner.x1
                && fy > inner.y0
                && fy < inner.y1;
            if !inside_inner {
                blend_pixel(surface, x, y, src, 1.0);
            }
        }
    }
}

/// Draw `image` scaled into `dest` with the given opacity.
///
/// The destination is snapped to whole pixels; pixels outside the surface
/// are clipped.
pub fn draw_image(surface: &mut RgbaImage, image: &RgbaImage, dest: Rect, opacity: f64) {
    let x0 = dest.x0.round() as i64;
    let y0 = dest.y0.round() as i64;
    let w = (dest.x1.round() as i64 - x0).max(0) as u32;
    let h = (dest.y1.round() as i64 - y0).max(0) as u32;
    if w == 0 || h == 0 || opacity <= 0.0 || image.width() == 0 || image.height() == 0 {
        return;
    }

    let resized;
    let src = if image.dimensions() == (w, h) {
        image
    } else {
        resized = imageops::resize(image, w, h, FilterType::Triangle);
        &resized
    };

    let coverage = opacity.clamp(0.0, 1.0) as f32;
    for (sx, sy, px) in src.enumerate_pixels() {
        blend_pixel(surface, x0 + sx as i64, y0 + sy as i64, px.0, coverage);
    }
}
