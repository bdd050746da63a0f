//! StampInk Application
//!
//! The editing session a UI embeds: configuration, the [`Editor`] facade
//! and pointer event dispatch. The UI chrome itself lives in the host.

mod config;
mod editor;
mod event_handler;

pub use config::{ConfigError, EditorConfig};
pub use editor::Editor;
pub use event_handler::EventResponse;

pub use stampink_core::{
    Attribute, EditorError, EditorResult, ElementKind, ElementRef, ElementView, FontFamily,
    FrameHost, FrameToken, InteractionEvent, PointerInput, TextColor,
};
pub use stampink_render::{ExportedImage, RenderError};
