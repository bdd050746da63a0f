//! StampInk Core Library
//!
//! Platform-agnostic data model and interaction logic for the StampInk image
//! annotator: overlay elements, selection, hit testing, dragging and redraw
//! scheduling. Pixels are produced by `stampink-render`.

pub mod drag;
pub mod elements;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod store;

pub use drag::{DragCommit, DragController, DragSession, DragState, StartOutcome};
pub use elements::{
    Attribute, ElementId, ElementKind, ElementRef, ElementView, FontFamily, ImageHandle, TextColor,
    TextElement, WatermarkElement,
};
pub use error::{EditorError, EditorResult, ErrorSlot};
pub use frame::{FrameHost, FrameScheduler, FrameToken, ManualFrameHost};
pub use geometry::{CanvasLayout, DocumentView};
pub use hit::BoundsMap;
pub use input::{InteractionEvent, PointerInput};
pub use store::{BaseImage, ElementStore};
