//! # Grid Slicer
//!
//! Cuts one sheet into `rows * cols` independent stickers.
//!
//! ## Pipeline
//!
//! 1. Decode the sheet to RGBA8 (`Decode` on failure, nothing produced)
//! 2. Compute the shared cell size by floor division (`InvalidImage` if zero)
//! 3. Copy every cell into its own zeroed buffer, row by row, column by column
//! 4. Encode the cells concurrently on the blocking pool
//! 5. Re-sort by id; encoding may finish in any order
//!
//! Any failure fails the whole call. A caller never sees a partial sheet.

use futures_util::future::join_all;
use image::RgbaImage;
use log::{debug, info};
use sticker_scale::grid::{crop_rgba, grid_rects, CellRect, GridShape};

use crate::core::segment::Segment;
use crate::error::{StickerError, StickerResult};
use crate::payload::{decode_rgba, OutputFormat, StickerImage};

/// Slice an encoded sheet into stickers.
///
/// Returns exactly `shape.rows * shape.cols` segments, ascending by id, each
/// with the default label and the processing flag set.
///
/// # Errors
///
/// - `Validation` if the shape has zero rows or columns
/// - `Decode` if `source` is not a decodable image
/// - `InvalidImage` if a cell would be zero pixels wide or tall
/// - `Encode` if any cell fails to encode
pub async fn slice(
    source: &[u8],
    shape: GridShape,
    format: OutputFormat,
) -> StickerResult<Vec<Segment>> {
    check_shape(shape)?;
    let bytes = source.to_vec();
    let sheet = tokio::task::spawn_blocking(move || decode_rgba(&bytes))
        .await
        .map_err(|e| StickerError::decode("sheet", e.to_string()))??;
    slice_decoded(sheet, shape, format).await
}

/// Like [`slice`], but takes ownership of the encoded sheet and hands it back
/// as a [`StickerImage`] next to the stickers. The sheet is decoded once.
pub async fn slice_sheet(
    source: Vec<u8>,
    shape: GridShape,
    format: OutputFormat,
) -> StickerResult<(StickerImage, Vec<Segment>)> {
    check_shape(shape)?;
    let (sheet, pixels) = tokio::task::spawn_blocking(move || StickerImage::decode_owned(source))
        .await
        .map_err(|e| StickerError::decode("sheet", e.to_string()))??;
    let segments = slice_decoded(pixels, shape, format).await?;
    Ok((sheet, segments))
}

async fn slice_decoded(
    sheet: RgbaImage,
    shape: GridShape,
    format: OutputFormat,
) -> StickerResult<Vec<Segment>> {
    let cells = cut_cells(&sheet, shape)?;
    drop(sheet);

    let mut segments = Vec::with_capacity(cells.len());
    let encodes = cells.into_iter().map(|(rect, pixels)| {
        tokio::task::spawn_blocking(move || encode_cell(rect, pixels, format))
    });
    for joined in join_all(encodes).await {
        let segment = joined.map_err(|e| StickerError::encode("sticker", e.to_string()))??;
        segments.push(segment);
    }
    segments.sort_by_key(Segment::id);

    info!(
        "sliced sheet into {}x{} stickers ({} total)",
        shape.rows,
        shape.cols,
        segments.len()
    );
    Ok(segments)
}

/// Synchronous variant of [`slice`] for already decoded pixels.
pub fn slice_image(
    sheet: &RgbaImage,
    shape: GridShape,
    format: OutputFormat,
) -> StickerResult<Vec<Segment>> {
    check_shape(shape)?;
    cut_cells(sheet, shape)?
        .into_iter()
        .map(|(rect, pixels)| encode_cell(rect, pixels, format))
        .collect()
}

fn check_shape(shape: GridShape) -> StickerResult<()> {
    if shape.rows == 0 || shape.cols == 0 {
        return Err(StickerError::validation(
            "grid",
            "rows and columns must be at least 1",
            format!("{}x{}", shape.rows, shape.cols),
        ));
    }
    if shape.cell_count().is_none() {
        return Err(StickerError::validation(
            "grid",
            "rows * cols must fit in a u32",
            format!("{}x{}", shape.rows, shape.cols),
        ));
    }
    Ok(())
}

/// Crop every cell of the sheet into an independent pixel buffer.
fn cut_cells(sheet: &RgbaImage, shape: GridShape) -> StickerResult<Vec<(CellRect, RgbaImage)>> {
    let (width, height) = sheet.dimensions();
    let rects = grid_rects(width, height, shape).ok_or_else(|| {
        StickerError::invalid_image(width, height, shape.rows, shape.cols)
            .with_recovery_suggestion("Use a larger sheet or a smaller grid")
    })?;

    let pitch = (width as usize) * 4;
    let raw = sheet.as_raw();
    rects
        .into_iter()
        .map(|rect| {
            debug!(
                "cell {} at ({}, {}) size {}x{}",
                rect.index, rect.x, rect.y, rect.w, rect.h
            );
            let pixels = RgbaImage::from_raw(rect.w, rect.h, crop_rgba(raw, pitch, rect))
                .ok_or_else(|| {
                    StickerError::encode(format!("sticker {}", rect.index), "cell buffer size mismatch")
                })?;
            Ok((rect, pixels))
        })
        .collect()
}

fn encode_cell(rect: CellRect, pixels: RgbaImage, format: OutputFormat) -> StickerResult<Segment> {
    let image = StickerImage::encode(&pixels, format)
        .map_err(|e| e.with_context(format!("encoding sticker {}", rect.index)))?;
    Ok(Segment::new(rect.index, image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn quadrants() -> RgbaImage {
        RgbaImage::from_fn(8, 8, |x, y| match (x < 4, y < 4) {
            (true, true) => Rgba([255, 0, 0, 255]),
            (false, true) => Rgba([0, 255, 0, 128]),
            (true, false) => Rgba([0, 0, 255, 0]),
            (false, false) => Rgba([9, 9, 9, 255]),
        })
    }

    #[test]
    fn slice_image_maps_ids_to_reading_order() {
        let segments = slice_image(&quadrants(), GridShape::new(2, 2), OutputFormat::Png).unwrap();
        let expected = [
            Rgba([255, 0, 0, 255]),
            Rgba([0, 255, 0, 128]),
            Rgba([0, 0, 255, 0]),
            Rgba([9, 9, 9, 255]),
        ];
        for (segment, px) in segments.iter().zip(expected) {
            let pixels = segment.image().to_rgba().unwrap();
            assert_eq!(pixels.dimensions(), (4, 4));
            assert!(pixels.pixels().all(|p| *p == px), "sticker {}", segment.id());
        }
    }

    #[test]
    fn slice_image_rejects_zero_shape() {
        let err = slice_image(&quadrants(), GridShape::new(0, 2), OutputFormat::Png).unwrap_err();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn slice_image_rejects_overflowing_shape() {
        let err = slice_image(&quadrants(), GridShape::new(u32::MAX, 2), OutputFormat::Png)
            .unwrap_err();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn remainder_pixels_are_not_part_of_any_cell() {
        let sheet = RgbaImage::from_pixel(9, 5, Rgba([1, 2, 3, 4]));
        let segments = slice_image(&sheet, GridShape::new(2, 2), OutputFormat::Png).unwrap();
        assert!(segments.iter().all(|s| (s.image().width(), s.image().height()) == (4, 2)));
    }
}
