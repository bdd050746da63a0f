//! Dispatch of normalised pointer events to the editor.

use crate::editor::Editor;
use stampink_core::{DragCommit, InteractionEvent, StartOutcome};

/// What an event did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventResponse {
    /// Nothing happened (no drag, no layout, or interaction disabled).
    Ignored,
    /// An element was grabbed and is now being dragged.
    Grabbed,
    /// The selection was cleared by a click on empty canvas.
    Deselected,
    /// The live drag moved.
    Moved,
    /// A drag finished and its position was committed.
    Committed(DragCommit),
    /// A drag was aborted.
    Cancelled,
}

impl Editor {
    /// Route an interaction event to the matching entry point.
    pub fn handle_event(&mut self, event: &InteractionEvent) -> EventResponse {
        match event {
            InteractionEvent::Start(input) => match self.on_interaction_start(input) {
                Some(StartOutcome::Grabbed(_)) => EventResponse::Grabbed,
                Some(StartOutcome::Missed) => EventResponse::Deselected,
                Some(StartOutcome::Disabled) | None => EventResponse::Ignored,
            },
            InteractionEvent::Move(input) => {
                if self.on_interaction_move(input) {
                    EventResponse::Moved
                } else {
                    EventResponse::Ignored
                }
            }
            InteractionEvent::End => match self.on_interaction_end() {
                Some(commit) => EventResponse::Committed(commit),
                None => EventResponse::Ignored,
            },
            InteractionEvent::Cancel => {
                if self.on_interaction_cancel() {
                    EventResponse::Cancelled
                } else {
                    EventResponse::Ignored
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use image::RgbaImage;
    use kurbo::Point;
    use stampink_core::{Attribute, ImageHandle, ManualFrameHost, PointerInput};
    use stampink_render::CpuRenderer;

    fn editor_with_watermark() -> Editor {
        let config = EditorConfig {
            load_system_fonts: false,
            ..EditorConfig::default()
        };
        let renderer = Box::new(CpuRenderer::default());
        let mut editor = Editor::with_parts(config, renderer, Box::new(ManualFrameHost)).unwrap();
        editor
            .apply_base_image(Ok(ImageHandle::new(RgbaImage::new(800, 600))), Vec::new(), None)
            .unwrap();
        editor
            .apply_watermark(Ok(ImageHandle::new(RgbaImage::new(100, 100))), "logo.png")
            .unwrap();
        editor.set_active_element_attribute(Attribute::Position(Point::new(100.0, 100.0)));
        editor
    }

    #[test]
    fn test_full_drag_sequence() {
        let mut editor = editor_with_watermark();

        let events = [
            InteractionEvent::Start(PointerInput::mouse(110.0, 110.0)),
            InteractionEvent::Move(PointerInput::mouse(130.0, 120.0)),
            InteractionEvent::End,
        ];
        let responses: Vec<_> = events.iter().map(|e| editor.handle_event(e)).collect();

        assert_eq!(responses[0], EventResponse::Grabbed);
        assert_eq!(responses[1], EventResponse::Moved);
        match responses[2] {
            EventResponse::Committed(commit) => {
                assert_eq!(commit.position, Point::new(120.0, 110.0))
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn test_click_on_empty_canvas_deselects() {
        let mut editor = editor_with_watermark();
        let start = InteractionEvent::Start(PointerInput::mouse(700.0, 500.0));
        let response = editor.handle_event(&start);
        assert_eq!(response, EventResponse::Deselected);
        assert!(editor.active_element().is_none());
    }

    #[test]
    fn test_stray_end_and_cancel_are_ignored() {
        let mut editor = editor_with_watermark();
        assert_eq!(editor.handle_event(&InteractionEvent::End), EventResponse::Ignored);
        assert_eq!(editor.handle_event(&InteractionEvent::Cancel), EventResponse::Ignored);
        assert_eq!(
            editor.handle_event(&InteractionEvent::Move(PointerInput::mouse(1.0, 1.0))),
            EventResponse::Ignored
        );
    }

    #[test]
    fn test_touch_without_points_is_ignored() {
        let mut editor = editor_with_watermark();
        let empty = PointerInput::Touch { touches: Vec::new() };
        assert_eq!(editor.handle_event(&InteractionEvent::Start(empty)), EventResponse::Ignored);
    }
}
