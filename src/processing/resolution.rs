//! # Resolution Adjuster
//!
//! Resizes one sticker to a square target. The target is compared with the
//! sticker's current width:
//!
//! - `target <= width`: local Lanczos3 resample on the blocking pool, never touches
//!   the network
//! - `target > width`: one call to the [`Upscaler`]; generated detail has to
//!   come from the model
//!
//! Equality takes the local path and re-encodes at the same size.
//!
//! The adjuster never mutates the segment it is given. On success it returns
//! a new segment (same id and label, new picture, processing cleared); on
//! failure the caller still holds the untouched original. Nothing is retried.

use fast_image_resize::Resizer;
use image::RgbaImage;
use log::{debug, info, warn};
use sticker_scale::cpu::scale_rgba_to_vec;
use sticker_scale::presets::{build_plan, ScaleTarget, Size, SquareFit};

use crate::core::segment::Segment;
use crate::error::{StickerError, StickerResult};
use crate::payload::{dimensions_of, OutputFormat, StickerImage};
use crate::remote::Upscaler;

/// Which path produced the new picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePath {
    /// Local resample
    Local,
    /// Delegated AI upscale
    Remote,
}

/// Resize dispatcher for single stickers.
pub struct ResolutionAdjuster<'a, U: Upscaler + ?Sized> {
    upscaler: &'a U,
    fit: SquareFit,
    format: OutputFormat,
}

impl<'a, U: Upscaler + ?Sized> ResolutionAdjuster<'a, U> {
    /// `fit` controls non-square stickers; `format` is used whenever the
    /// adjuster encodes pixels itself.
    pub fn new(upscaler: &'a U, fit: SquareFit, format: OutputFormat) -> Self {
        Self {
            upscaler,
            fit,
            format,
        }
    }

    /// Resize `segment` to `target_size`×`target_size`.
    ///
    /// # Errors
    ///
    /// - `Validation` for a zero target
    /// - `Decode` if the current picture cannot be read
    /// - `RemoteOperation` / `Decode` if the upscale fails or returns garbage
    /// - `Scale` / `Encode` if local resampling fails
    pub async fn adjust_resolution(
        &self,
        segment: &Segment,
        target_size: u32,
    ) -> StickerResult<Segment> {
        self.adjust_with_path(segment, target_size)
            .await
            .map(|(segment, _)| segment)
    }

    /// Like [`adjust_resolution`](Self::adjust_resolution), also reporting
    /// which path was taken.
    pub async fn adjust_with_path(
        &self,
        segment: &Segment,
        target_size: u32,
    ) -> StickerResult<(Segment, ResizePath)> {
        if target_size == 0 {
            return Err(StickerError::validation(
                "target_size",
                "must be a positive number of pixels",
                "0",
            ));
        }
        let current = dimensions_of(segment.image().bytes())?;

        if target_size <= current.width {
            debug!(
                "sticker {}: local resample {}px -> {}px",
                segment.id(),
                current.width,
                target_size
            );
            let image =
                resample_blocking(segment.image().clone(), target_size, self.fit, self.format)
                    .await?;
            return Ok((segment.with_image(image), ResizePath::Local));
        }

        info!(
            "sticker {}: requesting upscale {}px -> {}px",
            segment.id(),
            current.width,
            target_size
        );
        let bytes = self
            .upscaler
            .upscale(segment.image(), target_size)
            .await
            .map_err(|e| e.with_operation(format!("upscale sticker {}", segment.id())))?;
        let mut image = StickerImage::from_bytes(bytes)
            .map_err(|e| e.with_context("reading upscaled sticker"))?;
        if (image.width(), image.height()) != (target_size, target_size) {
            warn!(
                "sticker {}: upscale returned {}x{}, refitting to {}px",
                segment.id(),
                image.width(),
                image.height(),
                target_size
            );
            image = resample_blocking(image, target_size, self.fit, self.format).await?;
        }
        Ok((segment.with_image(image), ResizePath::Remote))
    }
}

async fn resample_blocking(
    image: StickerImage,
    side: u32,
    fit: SquareFit,
    format: OutputFormat,
) -> StickerResult<StickerImage> {
    tokio::task::spawn_blocking(move || resample_square(&image, side, fit, format))
        .await
        .map_err(|e| StickerError::encode("resized sticker", e.to_string()))?
}

/// Resample a picture onto a `side`×`side` canvas and encode it.
pub fn resample_square(
    image: &StickerImage,
    side: u32,
    fit: SquareFit,
    format: OutputFormat,
) -> StickerResult<StickerImage> {
    let pixels = image.to_rgba()?;
    let src = Size {
        w: pixels.width(),
        h: pixels.height(),
    };
    let plan = build_plan(src, ScaleTarget::Square(side), fit);
    let out = scale_rgba_to_vec(&mut Resizer::new(), pixels.as_raw(), src, &plan)
        .map_err(|e| StickerError::scale(format!("resize to {}px", side), e))?;
    let resized = RgbaImage::from_raw(plan.out.w, plan.out.h, out)
        .ok_or_else(|| StickerError::encode("resized sticker", "output buffer size mismatch"))?;
    StickerImage::encode(&resized, format)
}
