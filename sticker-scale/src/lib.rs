// SPDX-License-Identifier: MIT
//! # sticker-scale: Grid Geometry and Square Resampling for Sticker Sheets
//!
//! This crate holds the pure raster half of the sticker pipeline: cutting a
//! sheet into equal grid cells and resampling a single cell to a square target.
//! It performs no I/O and knows nothing about encoded image formats; callers
//! hand it tightly packed RGBA8 buffers.
//!
//! ## Key Components
//!
//! - [`grid`]: Cell geometry for an R×C sheet and independent cell crops
//! - [`presets`]: Square resize plans and the common sticker target sizes
//! - [`cpu`]: CPU resampler built on `fast_image_resize` (SIMD-accelerated)
//!
//! ## Rounding
//!
//! Cell sizes use floor division of the sheet dimensions by the grid shape.
//! Every cell of a sheet therefore has exactly the same size, and any
//! remainder columns/rows on the right and bottom edges belong to no cell.
//!
//! ## Usage Example
//!
//! ```rust
//! use sticker_scale::grid::{grid_rects, GridShape};
//! use sticker_scale::presets::{build_plan, ScaleTarget, Size, SquareFit};
//!
//! let shape = GridShape::new(4, 4);
//! let rects = grid_rects(1024, 1024, shape).expect("sheet large enough");
//! assert_eq!(rects.len(), 16);
//! assert_eq!((rects[15].x, rects[15].y), (768, 768));
//!
//! let plan = build_plan(
//!     Size { w: 256, h: 256 },
//!     ScaleTarget::Square(128),
//!     SquareFit::Stretch,
//! );
//! assert_eq!((plan.out.w, plan.out.h), (128, 128));
//! ```

pub mod cpu;
pub mod grid;
pub mod presets;
