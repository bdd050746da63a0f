//! Mapping between display pixels, canvas buffer pixels and document space.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Layout of the canvas: where it sits on screen and how big its buffer is.
///
/// The rendered (CSS) size and the internal buffer size generally differ, so
/// pointer positions must be rescaled before they can be compared with
/// anything drawn into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasLayout {
    /// On-screen bounding rectangle of the canvas element, in display pixels.
    pub display_rect: Rect,
    /// Internal pixel buffer dimensions.
    pub buffer_size: Size,
}

impl CanvasLayout {
    /// Create a layout.
    pub fn new(display_rect: Rect, buffer_size: Size) -> Self {
        Self {
            display_rect,
            buffer_size,
        }
    }

    /// A layout whose display rect is at the origin with the buffer's own size.
    pub fn unscaled(buffer_size: Size) -> Self {
        Self::new(Rect::from_origin_size(Point::ORIGIN, buffer_size), buffer_size)
    }

    /// Buffer pixels per display pixel along each axis.
    ///
    /// Returns `None` while the canvas has no rendered area (not laid out yet).
    pub fn scale(&self) -> Option<Vec2> {
        let rendered = self.display_rect.size();
        if rendered.width <= 0.0 || rendered.height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            self.buffer_size.width / rendered.width,
            self.buffer_size.height / rendered.height,
        ))
    }

    /// Convert a pointer position in display pixels to buffer coordinates.
    pub fn to_canvas_space(&self, pointer: Point) -> Option<Point> {
        let scale = self.scale()?;
        Some(Point::new(
            (pointer.x - self.display_rect.x0) * scale.x,
            (pointer.y - self.display_rect.y0) * scale.y,
        ))
    }

    /// Convert a buffer position back to display pixels.
    pub fn to_display_space(&self, canvas_point: Point) -> Option<Point> {
        let scale = self.scale()?;
        Some(Point::new(
            canvas_point.x / scale.x + self.display_rect.x0,
            canvas_point.y / scale.y + self.display_rect.y0,
        ))
    }
}

/// Mapping between document space and the current canvas buffer.
///
/// Element positions and sizes are stored in document space, fixed to the
/// canvas size at the time the base image was loaded. Resizing the container
/// changes only the canvas side, so committed geometry and the export are
/// unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentView {
    pub document_size: Size,
    pub canvas_size: Size,
}

impl DocumentView {
    pub fn new(document_size: Size, canvas_size: Size) -> Self {
        Self {
            document_size,
            canvas_size,
        }
    }

    /// A view where document and canvas coincide.
    pub fn identity(size: Size) -> Self {
        Self::new(size, size)
    }

    /// Canvas pixels per document unit along each axis.
    pub fn scale(&self) -> Vec2 {
        let axis = |canvas: f64, document: f64| {
            let k = canvas / document;
            if k.is_finite() && k > 0.0 { k } else { 1.0 }
        };
        Vec2::new(
            axis(self.canvas_size.width, self.document_size.width),
            axis(self.canvas_size.height, self.document_size.height),
        )
    }

    pub fn to_canvas(&self, point: Point) -> Point {
        let k = self.scale();
        Point::new(point.x * k.x, point.y * k.y)
    }

    pub fn to_document(&self, point: Point) -> Point {
        let k = self.scale();
        Point::new(point.x / k.x, point.y / k.y)
    }

    pub fn size_to_canvas(&self, size: Size) -> Size {
        let k = self.scale();
        Size::new(size.width * k.x, size.height * k.y)
    }

    pub fn size_to_document(&self, size: Size) -> Size {
        let k = self.scale();
        Size::new(size.width / k.x, size.height / k.y)
    }
}

/// Uniform downscale factor that fits `image` inside `container` without upscaling.
pub fn fit_scale(image: Size, container: Size) -> f64 {
    if image.width <= 0.0 || image.height <= 0.0 {
        return 1.0;
    }
    let factor = (container.width / image.width)
        .min(container.height / image.height)
        .min(1.0);
    if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    }
}

/// Clamp a top-left origin so a box of `size` stays inside `bounds`.
///
/// Each axis is clamped independently. A box larger than the bounds is
/// pinned to the origin on that axis.
pub fn clamp_origin(origin: Point, size: Size, bounds: Size) -> Point {
    Point::new(
        origin.x.min(bounds.width - size.width).max(0.0),
        origin.y.min(bounds.height - size.height).max(0.0),
    )
}

/// Clamped on-screen rectangle for a box of `size` placed at `origin`.
pub fn clamped_rect(origin: Point, size: Size, bounds: Size) -> Rect {
    Rect::from_origin_size(clamp_origin(origin, size, bounds), size)
}

/// Inclusive point-in-rectangle test (edges count as inside).
pub fn rect_contains_inclusive(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_layout() {
        let layout = CanvasLayout::unscaled(Size::new(800.0, 600.0));
        let p = layout.to_canvas_space(Point::new(100.0, 200.0)).unwrap();
        assert!((p.x - 100.0).abs() < f64::EPSILON);
        assert!((p.y - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_offset_and_css_scaling() {
        // Buffer is 800x600 but displayed at 400x300, 10px from the left and 20px from the top
        let layout = CanvasLayout::new(
            Rect::new(10.0, 20.0, 410.0, 320.0),
            Size::new(800.0, 600.0),
        );
        let p = layout.to_canvas_space(Point::new(110.0, 70.0)).unwrap();
        assert!((p.x - 200.0).abs() < 1e-10);
        assert!((p.y - 100.0).abs() < 1e-10);

        let back = layout.to_display_space(p).unwrap();
        assert!((back.x - 110.0).abs() < 1e-10);
        assert!((back.y - 70.0).abs() < 1e-10);
    }

    #[test]
    fn test_non_uniform_scale() {
        let layout = CanvasLayout::new(Rect::new(0.0, 0.0, 100.0, 400.0), Size::new(200.0, 200.0));
        let scale = layout.scale().unwrap();
        assert!((scale.x - 2.0).abs() < f64::EPSILON);
        assert!((scale.y - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unlaid_out_canvas_has_no_mapping() {
        let layout = CanvasLayout::new(Rect::ZERO, Size::new(800.0, 600.0));
        assert!(layout.scale().is_none());
        assert!(layout.to_canvas_space(Point::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_fit_scale_never_upscales() {
        let container = Size::new(800.0, 600.0);
        assert!((fit_scale(Size::new(400.0, 300.0), container) - 1.0).abs() < f64::EPSILON);
        assert!((fit_scale(Size::new(1600.0, 600.0), container) - 0.5).abs() < f64::EPSILON);
        assert!((fit_scale(Size::new(800.0, 1200.0), container) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_origin_per_axis() {
        let bounds = Size::new(800.0, 600.0);
        let size = Size::new(100.0, 50.0);

        let p = clamp_origin(Point::new(710.0, 10.0), size, bounds);
        assert!((p.x - 700.0).abs() < f64::EPSILON);
        assert!((p.y - 10.0).abs() < f64::EPSILON);

        let p = clamp_origin(Point::new(-5.0, 580.0), size, bounds);
        assert!(p.x.abs() < f64::EPSILON);
        assert!((p.y - 550.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_oversized_box_pins_to_origin() {
        let bounds = Size::new(800.0, 600.0);
        let p = clamp_origin(Point::new(30.0, 30.0), Size::new(900.0, 10.0), bounds);
        assert!(p.x.abs() < f64::EPSILON);
        assert!((p.y - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inclusive_contains() {
        let rect = Rect::new(10.0, 10.0, 110.0, 60.0);
        assert!(rect_contains_inclusive(rect, Point::new(10.0, 10.0)));
        assert!(rect_contains_inclusive(rect, Point::new(110.0, 60.0)));
        assert!(!rect_contains_inclusive(rect, Point::new(110.1, 60.0)));
    }

    #[test]
    fn test_document_view_after_shrink() {
        let view = DocumentView::new(Size::new(800.0, 600.0), Size::new(400.0, 300.0));
        assert_eq!(view.scale(), Vec2::new(0.5, 0.5));
        assert_eq!(view.to_canvas(Point::new(700.0, 10.0)), Point::new(350.0, 5.0));
        assert_eq!(view.to_document(Point::new(350.0, 5.0)), Point::new(700.0, 10.0));
        assert_eq!(view.size_to_canvas(Size::new(100.0, 50.0)), Size::new(50.0, 25.0));
        assert_eq!(view.size_to_document(Size::new(50.0, 25.0)), Size::new(100.0, 50.0));
    }

    #[test]
    fn test_degenerate_document_view_is_identity() {
        let view = DocumentView::new(Size::ZERO, Size::new(400.0, 300.0));
        assert_eq!(view.scale(), Vec2::new(1.0, 1.0));
        let p = Point::new(12.0, 34.0);
        assert_eq!(DocumentView::identity(Size::new(10.0, 10.0)).to_canvas(p), p);
    }
}
