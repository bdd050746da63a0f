//! Image decoding, synchronous and off-thread.

use crate::renderer::{RenderError, RenderResult};
use futures::channel::oneshot;
use stampink_core::ImageHandle;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Decodes encoded raster bytes (PNG, JPEG, WebP) into RGBA bitmaps.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageLoader;

impl ImageLoader {
    pub fn new() -> Self {
        Self
    }

    /// Decode on the calling thread.
    pub fn decode_now(bytes: &[u8]) -> RenderResult<ImageHandle> {
        let pixels = image::load_from_memory(bytes)?.to_rgba8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(RenderError::InvalidSurface {
                width: pixels.width(),
                height: pixels.height(),
            });
        }
        log::debug!("Decoded {}x{} image", pixels.width(), pixels.height());
        Ok(ImageHandle::new(pixels))
    }

    /// Decode on a worker thread.
    ///
    /// The returned task resolves once decoding finishes. If the worker
    /// cannot be started or dies before replying, the task resolves to
    /// [`RenderError::DecodeCancelled`].
    pub fn decode(&self, bytes: Vec<u8>) -> DecodeTask {
        let (tx, rx) = oneshot::channel();
        let spawned = std::thread::Builder::new()
            .name("stampink-decode".into())
            .spawn(move || {
                // Receiver may already be gone; nothing to do then
                let _ = tx.send(Self::decode_now(&bytes));
            });
        if let Err(e) = spawned {
            log::error!("Failed to spawn decode worker: {e}");
        }
        DecodeTask { rx }
    }
}

/// Pending result of [`ImageLoader::decode`].
#[derive(Debug)]
pub struct DecodeTask {
    rx: oneshot::Receiver<RenderResult<ImageHandle>>,
}

impl Future for DecodeTask {
    type Output = RenderResult<ImageHandle>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(RenderError::DecodeCancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_now() {
        let handle = ImageLoader::decode_now(&png_bytes(7, 3)).unwrap();
        assert_eq!((handle.width(), handle.height()), (7, 3));
        assert_eq!(handle.pixels().get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = ImageLoader::decode_now(b"definitely not an image").unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }

    #[test]
    fn test_async_decode() {
        let loader = ImageLoader::new();
        let handle = pollster::block_on(loader.decode(png_bytes(4, 5))).unwrap();
        assert_eq!((handle.width(), handle.height()), (4, 5));
    }

    #[test]
    fn test_overlapping_decodes_resolve_independently() {
        let loader = ImageLoader::new();
        let first = loader.decode(png_bytes(2, 2));
        let second = loader.decode(b"broken".to_vec());

        assert!(pollster::block_on(second).is_err());
        assert!(pollster::block_on(first).is_ok());
    }
}
