//! # Processing Module
//!
//! The two pixel pipelines of the sticker tool: cutting a sheet into stickers
//! and resizing a single sticker.

pub mod resolution;
pub mod slicer;

// Re-export commonly used types for convenience
pub use resolution::{resample_square, ResizePath, ResolutionAdjuster};
pub use slicer::{slice, slice_image, slice_sheet};
