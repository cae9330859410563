//! # Backend Collaborators
//!
//! Everything that needs a generative model goes through these traits:
//! labelling a sheet, upscaling a sticker, generating a sheet from a prompt
//! and regenerating a single sticker. The pipeline only sees requests going
//! out and image bytes or labels coming back.
//!
//! [`Upscaler`] is the narrow seam the resolution adjuster needs;
//! [`StickerBackend`] adds the rest. [`http::HttpBackend`] is the concrete
//! client used by the CLI; tests plug in their own implementations.
//!
//! Implementations must not retry on their own. A failure is reported once
//! as `RemoteOperation` and the caller decides what to do.

use async_trait::async_trait;

use crate::error::StickerResult;
use crate::payload::StickerImage;

pub mod http;

pub use http::HttpBackend;

/// AI upscaling of a single sticker.
#[async_trait]
pub trait Upscaler: Send + Sync {
    /// Produce a `target_size`×`target_size` version of `image`.
    ///
    /// Returns encoded image bytes; the caller validates them.
    async fn upscale(&self, image: &StickerImage, target_size: u32) -> StickerResult<Vec<u8>>;
}

/// The full backend used by a sticker session.
#[async_trait]
pub trait StickerBackend: Upscaler {
    /// Suggest one label per cell of `sheet`, in reading order.
    async fn label_sheet(&self, sheet: &StickerImage) -> StickerResult<Vec<String>>;

    /// Generate a new sheet from a text prompt and optional reference pictures.
    async fn generate_sheet(
        &self,
        prompt: &str,
        references: &[StickerImage],
    ) -> StickerResult<Vec<u8>>;

    /// Redraw one sticker following `instruction`.
    async fn regenerate_sticker(
        &self,
        image: &StickerImage,
        instruction: &str,
    ) -> StickerResult<Vec<u8>>;
}
