// SPDX-License-Identifier: MIT
//! # Square Resize Plans and Sticker Size Presets
//!
//! Stickers are square. Resizing one means picking a square side and deciding
//! what to do when the source cell is not square itself.
//!
//! ## Design
//!
//! 1. **ScaleTarget**: the output canvas
//! 2. **SquareFit**: how a non-matching aspect ratio lands on that canvas
//! 3. **ScalePlan**: the computed output canvas and destination ROI
//!
//! Unlike a fit-within plan, a sticker plan upscales as readily as it
//! downscales: the caller has already decided which path produces the pixels.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// Defines how a source whose aspect differs from the canvas is placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SquareFit {
    /// Stretch/squeeze the source to fill the whole canvas.
    #[default]
    Stretch,
    /// Keep the aspect ratio, center the content and fill the rest with
    /// `bg_rgba` (transparent by default in the CLI).
    Pad { bg_rgba: [u8; 4] },
}

/// Defines the output canvas of a resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleTarget {
    /// `side`×`side` canvas.
    Square(u32),
}

impl ScaleTarget {
    pub fn canvas(self) -> Size {
        match self {
            ScaleTarget::Square(side) => Size { w: side, h: side },
        }
    }
}

/// Complete scaling plan computed from input parameters.
#[derive(Clone, Copy, Debug)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Placement strategy used for planning
    pub fit: SquareFit,
    /// Final output canvas
    pub out: Size,
    /// If padding is used, the sub-rectangle that receives the scaled content.
    /// Format: (x, y, width, height) in output coordinate space.
    pub dst_roi: Option<(u32, u32, u32, u32)>,
}

/// Compute a scaling plan from input parameters.
///
/// # Arguments
/// * `input` - Source image dimensions
/// * `target` - Output canvas
/// * `fit` - How to place a source whose aspect differs from the canvas
///
/// # Returns
/// A ScalePlan containing all parameters needed for scaling execution
pub fn build_plan(input: Size, target: ScaleTarget, fit: SquareFit) -> ScalePlan {
    let out = target.canvas();
    let dst_roi = match fit {
        SquareFit::Stretch => None,
        SquareFit::Pad { .. } => {
            let (rw, rh) = fit_within(input, out);
            if (rw, rh) == (out.w, out.h) {
                None
            } else {
                Some(((out.w - rw) / 2, (out.h - rh) / 2, rw, rh))
            }
        }
    };
    ScalePlan {
        input,
        fit,
        out,
        dst_roi,
    }
}

/// Largest size with the input's aspect ratio that fits in `box_`, scaling up
/// or down as needed.
fn fit_within(input: Size, box_: Size) -> (u32, u32) {
    let (w, h) = (input.w.max(1) as f64, input.h.max(1) as f64);
    let (bw, bh) = (box_.w as f64, box_.h as f64);
    let s = (bw / w).min(bh / h);
    (
        ((w * s).round() as u32).clamp(1, box_.w.max(1)),
        ((h * s).round() as u32).clamp(1, box_.h.max(1)),
    )
}

/// Common square sticker sizes offered by the tools.
///
/// Any positive side is valid for a resize; these are only the sizes the CLI
/// lists by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StickerSize {
    #[value(name = "256")]
    S256,
    #[value(name = "512")]
    S512,
    #[value(name = "1024")]
    S1024,
    #[value(name = "2048")]
    S2048,
}

impl StickerSize {
    /// Side length in pixels.
    pub fn side(self) -> u32 {
        match self {
            StickerSize::S256 => 256,
            StickerSize::S512 => 512,
            StickerSize::S1024 => 1024,
            StickerSize::S2048 => 2048,
        }
    }

    pub fn to_target(self) -> ScaleTarget {
        ScaleTarget::Square(self.side())
    }
}
