//! # Configuration Module
//!
//! Explicit configuration passed into every sticker session. Nothing in the
//! pipeline reads ambient settings; the CLI builds a [`StickerConfig`] from a
//! file, the environment and its own flags, then hands it over.

#[allow(clippy::module_inception)]
pub mod config;

pub use config::{BackendConfig, FitMode, StickerConfig};
