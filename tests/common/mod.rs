//! Common test utilities and helpers for the sticker library tests
//!
//! Fixture sheets with one distinct colour per cell, and a scripted backend
//! that counts its calls and can be told to fail or to hold an upscale until
//! released.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use sticker_grid::{
    StickerBackend, StickerConfig, StickerError, StickerImage, StickerResult, StickerSession,
    Upscaler,
};
use tokio::sync::Notify;

/// Colour used for cell `index` of a fixture sheet.
pub fn cell_color(index: u32) -> Rgba<u8> {
    let i = (index % 16) as u8;
    Rgba([i * 16, 255 - i * 16, i.wrapping_mul(7), 255])
}

/// `width`×`height` sheet where every cell of a `rows`×`cols` grid is a
/// solid [`cell_color`]. Remainder pixels are black.
pub fn sheet_pixels(width: u32, height: u32, rows: u32, cols: u32) -> RgbaImage {
    let (cw, ch) = (width / cols, height / rows);
    RgbaImage::from_fn(width, height, |x, y| {
        let (col, row) = (x / cw, y / ch);
        if col < cols && row < rows {
            cell_color(row * cols + col)
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

pub fn png_bytes(pixels: &RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    pixels
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode fixture");
    out.into_inner()
}

/// Encoded PNG sheet, see [`sheet_pixels`].
pub fn sheet_png(width: u32, height: u32, rows: u32, cols: u32) -> Vec<u8> {
    png_bytes(&sheet_pixels(width, height, rows, cols))
}

pub fn solid_png(side: u32, color: [u8; 4]) -> Vec<u8> {
    png_bytes(&RgbaImage::from_pixel(side, side, Rgba(color)))
}

/// Scripted backend with call counters and failure switches.
#[derive(Default)]
pub struct MockBackend {
    pub upscale_calls: AtomicUsize,
    pub label_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
    pub regenerate_calls: AtomicUsize,
    pub fail_upscale: AtomicBool,
    pub fail_labels: AtomicBool,
    /// Labels returned by `label_sheet`
    pub labels: Vec<String>,
    /// When set, upscale returns this side instead of the requested one
    pub upscale_side: Option<u32>,
    gate: Option<Arc<Notify>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn failing_upscale(self) -> Self {
        self.fail_upscale.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_upscale_side(mut self, side: u32) -> Self {
        self.upscale_side = Some(side);
        self
    }

    /// Hold every upscale until [`release`](Self::release) is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn upscales(&self) -> usize {
        self.upscale_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upscaler for MockBackend {
    async fn upscale(&self, _image: &StickerImage, target_size: u32) -> StickerResult<Vec<u8>> {
        self.upscale_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_upscale.load(Ordering::SeqCst) {
            return Err(StickerError::remote("upscale", Some(503), "model overloaded"));
        }
        let side = self.upscale_side.unwrap_or(target_size);
        Ok(solid_png(side, [200, 100, 50, 255]))
    }
}

#[async_trait]
impl StickerBackend for MockBackend {
    async fn label_sheet(&self, _sheet: &StickerImage) -> StickerResult<Vec<String>> {
        self.label_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_labels.load(Ordering::SeqCst) {
            return Err(StickerError::remote("label", Some(500), "labeler unavailable"));
        }
        Ok(self.labels.clone())
    }

    async fn generate_sheet(
        &self,
        _prompt: &str,
        _references: &[StickerImage],
    ) -> StickerResult<Vec<u8>> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(sheet_png(512, 512, 4, 4))
    }

    async fn regenerate_sticker(
        &self,
        image: &StickerImage,
        _instruction: &str,
    ) -> StickerResult<Vec<u8>> {
        self.regenerate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(solid_png(image.width(), [1, 2, 3, 255]))
    }
}

/// Session over a shared mock with the default 4×4 PNG configuration.
pub fn session_with(backend: Arc<MockBackend>) -> StickerSession {
    StickerSession::builder()
        .with_config(StickerConfig::default())
        .with_shared_backend(backend)
        .build()
        .expect("default config is valid")
}
