//! Pointer/touch input normalisation.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Raw pointer position as delivered by the host, in display pixels.
///
/// Mouse and touch events are handled uniformly: a touch event uses its
/// first active touch point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerInput {
    /// A mouse (or pen) event at a client position.
    Mouse { position: Point },
    /// A touch event with the currently active touch points, in order.
    Touch { touches: Vec<Point> },
}

impl PointerInput {
    /// Mouse event at `(x, y)`.
    pub fn mouse(x: f64, y: f64) -> Self {
        PointerInput::Mouse {
            position: Point::new(x, y),
        }
    }

    /// Touch event with a single touch point at `(x, y)`.
    pub fn touch(x: f64, y: f64) -> Self {
        PointerInput::Touch {
            touches: vec![Point::new(x, y)],
        }
    }

    /// The position to act on, if any.
    ///
    /// A touch event without touch points (e.g. the final `touchend`) has none.
    pub fn primary_position(&self) -> Option<Point> {
        match self {
            PointerInput::Mouse { position } => Some(*position),
            PointerInput::Touch { touches } => touches.first().copied(),
        }
    }
}

/// Phase of an interaction as seen by the drag state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InteractionEvent {
    /// Pointer down / touch start.
    Start(PointerInput),
    /// Pointer move / touch move.
    Move(PointerInput),
    /// Pointer up / touch end / pointer leaving the canvas.
    End,
    /// Touch cancel or host-initiated abort.
    Cancel,
}
