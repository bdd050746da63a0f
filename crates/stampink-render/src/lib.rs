//! StampInk Render Library
//!
//! Image decoding, the interactive-canvas compositor and full-resolution
//! PNG export. Everything draws on the CPU into `image::RgbaImage` buffers.

pub mod export;
pub mod fonts;
pub mod loader;
pub mod raster;
mod renderer;

pub use export::{ExportCompositor, ExportedImage, encode_png};
pub use fonts::{FontBook, FontSources};
pub use loader::{DecodeTask, ImageLoader};
pub use renderer::{
    CpuRenderer, RenderContext, RenderError, RenderResult, RenderStyle, Renderer,
    canvas_buffer_size,
};
