//! Hit testing against the bounds recorded by the last render pass.

use crate::elements::ElementRef;
use crate::geometry::rect_contains_inclusive;
use kurbo::{Point, Rect};

/// On-screen rectangles of every element drawn in the last render pass, in render order.
///
/// Rebuilt from scratch each pass; never edited incrementally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundsMap {
    entries: Vec<(ElementRef, Rect)>,
}

impl BoundsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the bounds of the next element drawn.
    pub fn record(&mut self, element: ElementRef, rect: Rect) {
        self.entries.push((element, rect));
    }

    /// Bounds of a specific element.
    pub fn get(&self, element: ElementRef) -> Option<Rect> {
        self.entries
            .iter()
            .find(|(r, _)| *r == element)
            .map(|(_, rect)| *rect)
    }

    /// Entries in render order (back to front).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &(ElementRef, Rect)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Topmost element whose rectangle contains `point` (edges inclusive).
    pub fn hit_test(&self, point: Point) -> Option<ElementRef> {
        // Later-rendered entries are drawn on top
        self.entries
            .iter()
            .rev()
            .find(|(_, rect)| rect_contains_inclusive(*rect, point))
            .map(|(r, _)| *r)
    }
}

/// Hit test with interaction gating: nothing is hittable without a base image.
pub fn hit_test(point: Point, bounds: &BoundsMap, interactive: bool) -> Option<ElementRef> {
    if !interactive {
        return None;
    }
    bounds.hit_test(point)
}
