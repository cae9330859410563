//! # Sticker Grid Library
//!
//! Turns one generated sticker sheet into a set of independent stickers and
//! lets each one be resized, relabelled or redrawn on its own.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `payload`: encoded pictures, data URIs and header-only dimension reads
//! - `processing`: the grid slicer and the resolution adjuster
//! - `core`: the segment model and the ticketed segment store
//! - `remote`: backend traits and the HTTP client
//! - `config`: configuration loading and validation
//! - `session`: high-level session orchestration
//! - `error`: error taxonomy shared by everything above
//!
//! Pixel-level work (grid geometry, scale plans, Lanczos3 resampling) lives
//! in the `sticker-scale` crate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sticker_grid::{StickerConfig, StickerSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = StickerSession::builder()
//!     .with_config(StickerConfig::default())
//!     .build()?;
//!
//! let sheet = std::fs::read("sheet.png")?;
//! let stickers = session.load_sheet(sheet).await?;
//! assert_eq!(stickers.len(), 16);
//!
//! // Downscales locally, upscales through the backend.
//! session.adjust_resolution(0, 512).await?;
//! session.export_to_dir("out").await?;
//! # Ok(())
//! # }
//! ```

// Internal module imports
pub mod config;
pub mod core;
pub mod error;
pub mod payload;
pub mod processing;
pub mod remote;
pub mod session;

/// Re-export error types for convenience
pub use error::{
    ErrorSeverity, HasRecoverySuggestion, HasSeverity, Retryable, StickerError, StickerResult,
};

pub use config::{BackendConfig, FitMode, StickerConfig};
pub use core::{Segment, SegmentStore};
pub use payload::{dimensions_of, Dimensions, OutputFormat, StickerImage};
pub use processing::{slice, ResizePath, ResolutionAdjuster};
pub use remote::{HttpBackend, StickerBackend, Upscaler};
pub use session::{StickerSession, StickerSessionBuilder};

/// Re-export grid and size types from the scaling crate
pub use sticker_scale::grid::GridShape;
pub use sticker_scale::presets::StickerSize;
