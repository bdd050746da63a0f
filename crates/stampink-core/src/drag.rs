//! Drag interaction state machine.
//!
//! While a drag is live only the ephemeral [`DragSession`] changes; the
//! element store is written once, when the drag ends. Pointers arrive in
//! canvas pixels and are tracked in document space, so a container resize
//! mid-drag keeps the grabbed point under the pointer.
//!
//! ```text
//! Idle --start(hit)--> Dragging --move--> Dragging --end--> Idle (commit)
//! Idle --start(miss)--> Idle (selection cleared)
//! any  --cancel--> Idle (no commit)
//! ```

use crate::elements::{Attribute, ElementRef, ElementView};
use crate::geometry::{DocumentView, clamp_origin};
use crate::hit::{BoundsMap, hit_test};
use crate::store::ElementStore;
use kurbo::{Point, Size, Vec2};

/// Ephemeral state of a live drag. Never stored in the element collections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Element being dragged.
    pub target: ElementRef,
    /// Pointer position at interaction start, in document coordinates.
    pub start_pointer: Point,
    /// Element position at interaction start.
    pub initial_position: Point,
    /// Pointer offset accumulated since the start.
    pub offset: Vec2,
}

impl DragSession {
    pub fn new(target: ElementRef, start_pointer: Point, initial_position: Point) -> Self {
        Self {
            target,
            start_pointer,
            initial_position,
            offset: Vec2::ZERO,
        }
    }

    /// Unclamped position the element would have if the drag ended now.
    pub fn preview_position(&self) -> Point {
        self.initial_position + self.offset
    }
}

/// Interaction states.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// What an interaction start did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// An element was hit, selected, and is now being dragged.
    Grabbed(ElementRef),
    /// Nothing was hit; the selection was cleared.
    Missed,
    /// Interaction is disabled (no base image).
    Disabled,
}

/// A committed drag result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragCommit {
    pub target: ElementRef,
    /// Final, clamped position written to the store.
    pub position: Point,
}

/// Converts pointer down/move/up sequences into element repositioning.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// The live session, if dragging.
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Pointer down at `point` (canvas coordinates).
    ///
    /// Hit tests against the last rendered bounds. A hit selects the element
    /// and starts a drag; a miss clears the selection. No position changes.
    pub fn interaction_start(
        &mut self,
        point: Point,
        store: &mut ElementStore,
        bounds: &BoundsMap,
        view: &DocumentView,
    ) -> StartOutcome {
        // A second start without an end (e.g. another touch) begins afresh
        self.state = DragState::Idle;

        let Some(target) = hit_test(point, bounds, store.has_base_image()) else {
            if !store.has_base_image() {
                return StartOutcome::Disabled;
            }
            store.select(None);
            return StartOutcome::Missed;
        };
        let Some(initial_position) = store.get(target).map(|e| e.position()) else {
            // Bounds are from a render that predates a removal
            store.select(None);
            return StartOutcome::Missed;
        };

        store.select(Some(target));
        let start = view.to_document(point);
        self.state = DragState::Dragging(DragSession::new(target, start, initial_position));
        log::debug!("Drag start on {target} at ({:.1}, {:.1})", point.x, point.y);
        StartOutcome::Grabbed(target)
    }

    /// Pointer moved to `point` (canvas coordinates). Updates the offset only.
    ///
    /// Returns the session so the caller can schedule a preview redraw.
    pub fn interaction_move(&mut self, point: Point, view: &DocumentView) -> Option<&DragSession> {
        match &mut self.state {
            DragState::Dragging(session) => {
                session.offset = view.to_document(point) - session.start_pointer;
                Some(session)
            }
            DragState::Idle => None,
        }
    }

    /// Pointer released. Commits the clamped final position and returns to idle.
    ///
    /// `bounds` supplies the last measured size of text elements; watermark
    /// size comes straight from the element's scale. The position is clamped
    /// to the document.
    pub fn interaction_end(
        &mut self,
        store: &mut ElementStore,
        bounds: &BoundsMap,
        view: &DocumentView,
    ) -> Option<DragCommit> {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return None;
        };
        let size = element_size(store, bounds, session.target, view)?;
        let position = clamp_origin(session.preview_position(), size, view.document_size);
        store.update_attribute(session.target, Attribute::Position(position));
        log::debug!(
            "Drag end on {}: committed ({:.1}, {:.1})",
            session.target,
            position.x,
            position.y
        );
        Some(DragCommit {
            target: session.target,
            position,
        })
    }

    /// Abort the drag without committing anything.
    pub fn interaction_cancel(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        if was_dragging {
            log::debug!("Drag cancelled");
        }
        self.state = DragState::Idle;
        was_dragging
    }
}

/// Size of an element in document units, as used for clamping.
pub fn element_size(
    store: &ElementStore,
    bounds: &BoundsMap,
    target: ElementRef,
    view: &DocumentView,
) -> Option<Size> {
    match store.get(target)? {
        ElementView::Watermark(w) => Some(w.scaled_size()),
        ElementView::Text(t) => Some(
            bounds
                .get(target)
                .map(|r| view.size_to_document(r.size()))
                .unwrap_or(Size::new(0.0, t.line_height())),
        ),
    }
}
