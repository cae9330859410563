// SPDX-License-Identifier: MIT
// CPU resampler built on fast_image_resize (SIMD-accelerated).
// Tightly packed RGBA8 in → RGBA8 out, Lanczos3 with alpha-aware filtering.

use fast_image_resize as fir;
use fir::images::{TypedCroppedImageMut, TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};

use crate::presets::{ScalePlan, Size, SquareFit};

#[derive(Debug)]
pub enum ScaleError {
    BufferTooSmall,
    ZeroSizedTarget,
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
    Crop(fir::CropBoxError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }
impl From<fir::CropBoxError> for ScaleError { fn from(e: fir::CropBoxError) -> Self { Self::Crop(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferTooSmall => write!(f, "Output buffer too small"),
            ScaleError::ZeroSizedTarget => write!(f, "Target canvas has a zero dimension"),
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
            ScaleError::Crop(e) => write!(f, "Crop error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            ScaleError::Crop(e) => Some(e),
            _ => None,
        }
    }
}

/// Main scaling entry point.
/// `src_rgba` must be tightly packed (`src.w * 4` bytes per row).
/// `dst` must hold at least `plan.out.w * plan.out.h * 4` bytes (RGBA).
pub fn scale_rgba_cpu(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    src: Size,
    plan: &ScalePlan,
    dst: &mut [u8],
) -> Result<(), ScaleError> {
    if plan.out.w == 0 || plan.out.h == 0 {
        return Err(ScaleError::ZeroSizedTarget);
    }
    let dst_len = (plan.out.w as usize) * (plan.out.h as usize) * 4;
    if dst.len() < dst_len {
        return Err(ScaleError::BufferTooSmall);
    }

    let src_view = TypedImageRef::<U8x4>::from_buffer(src.w, src.h, src_rgba)?;

    // Background must be in place before the canvas view borrows dst.
    if let SquareFit::Pad { bg_rgba } = plan.fit {
        fill_rgba(&mut dst[..dst_len], bg_rgba);
    }
    let mut dst_image = TypedImage::<U8x4>::from_buffer(plan.out.w, plan.out.h, &mut dst[..dst_len])?;

    let opts = ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3))
        .use_alpha(true);

    match plan.dst_roi {
        Some((x, y, w, h)) => {
            let mut roi = TypedCroppedImageMut::from_ref(&mut dst_image, x, y, w, h)?;
            resizer.resize_typed::<U8x4>(&src_view, &mut roi, &opts)?;
        }
        None => resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &opts)?,
    }

    Ok(())
}

/// Allocate the output canvas for `plan` and scale into it.
pub fn scale_rgba_to_vec(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    src: Size,
    plan: &ScalePlan,
) -> Result<Vec<u8>, ScaleError> {
    let mut out = vec![0u8; (plan.out.w as usize) * (plan.out.h as usize) * 4];
    scale_rgba_cpu(resizer, src_rgba, src, plan, &mut out)?;
    Ok(out)
}

#[inline]
fn fill_rgba(dst: &mut [u8], bg: [u8; 4]) {
    for px in dst.chunks_exact_mut(4) {
        px.copy_from_slice(&bg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{build_plan, ScaleTarget};

    fn solid(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
        px.iter().copied().cycle().take((w * h * 4) as usize).collect()
    }

    #[test]
    fn downscale_solid_stays_solid() {
        let src = solid(64, 64, [200, 10, 30, 255]);
        let plan = build_plan(Size { w: 64, h: 64 }, ScaleTarget::Square(16), SquareFit::Stretch);
        let out = scale_rgba_to_vec(&mut Resizer::new(), &src, Size { w: 64, h: 64 }, &plan).unwrap();
        assert_eq!(out.len(), 16 * 16 * 4);
        for px in out.chunks_exact(4) {
            for (got, want) in px.iter().zip([200u8, 10, 30, 255]) {
                assert!(got.abs_diff(want) <= 1, "{px:?}");
            }
        }
    }

    #[test]
    fn pad_leaves_background_outside_roi() {
        let src = solid(40, 20, [255, 255, 255, 255]);
        let plan = build_plan(
            Size { w: 40, h: 20 },
            ScaleTarget::Square(20),
            SquareFit::Pad { bg_rgba: [0, 0, 0, 0] },
        );
        assert_eq!(plan.dst_roi, Some((0, 5, 20, 10)));
        let out = scale_rgba_to_vec(&mut Resizer::new(), &src, Size { w: 40, h: 20 }, &plan).unwrap();
        // top-left corner is padding, center is content
        assert_eq!(&out[0..4], &[0, 0, 0, 0]);
        let center = ((10 * 20 + 10) * 4) as usize;
        assert!(out[center..center + 4].iter().all(|&c| c >= 254));
    }

    #[test]
    fn rejects_short_destination() {
        let src = solid(4, 4, [1, 2, 3, 4]);
        let plan = build_plan(Size { w: 4, h: 4 }, ScaleTarget::Square(2), SquareFit::Stretch);
        let mut dst = vec![0u8; 3];
        let err = scale_rgba_cpu(&mut Resizer::new(), &src, Size { w: 4, h: 4 }, &plan, &mut dst);
        assert!(matches!(err, Err(ScaleError::BufferTooSmall)));
    }

    #[test]
    fn rejects_zero_target() {
        let src = solid(4, 4, [1, 2, 3, 4]);
        let plan = build_plan(Size { w: 4, h: 4 }, ScaleTarget::Square(0), SquareFit::Stretch);
        let err = scale_rgba_to_vec(&mut Resizer::new(), &src, Size { w: 4, h: 4 }, &plan);
        assert!(matches!(err, Err(ScaleError::ZeroSizedTarget)));
    }
}
