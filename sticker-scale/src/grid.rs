// SPDX-License-Identifier: MIT
//! # Sticker Sheet Grid Geometry
//!
//! A sticker sheet is an R×C grid of equal cells read left-to-right,
//! top-to-bottom. This module computes where each cell lives in the sheet and
//! copies a cell out into its own buffer.
//!
//! ## Cell Size
//!
//! - `cell_w = floor(width / cols)`, `cell_h = floor(height / rows)`
//! - A zero cell dimension means the sheet is too small for the grid
//! - Remainder pixels on the right/bottom edge are not part of any cell
//!
//! ## Independence
//!
//! [`crop_rgba`] always allocates a fresh, zero-initialized buffer for the
//! cell. The result shares nothing with the sheet or with sibling cells, so a
//! cell can later be resampled or replaced on its own.

use crate::presets::Size;

/// Grid shape of a sticker sheet. Rows and columns may differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridShape {
    pub rows: u32,
    pub cols: u32,
}

impl GridShape {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Total number of cells (`rows * cols`), or `None` if that does not fit
    /// in a `u32`.
    pub fn cell_count(&self) -> Option<u32> {
        self.rows.checked_mul(self.cols)
    }

    /// Reading-order index of the cell at `(row, col)`.
    pub fn index_of(&self, row: u32, col: u32) -> u32 {
        row * self.cols + col
    }
}

impl Default for GridShape {
    fn default() -> Self {
        Self { rows: 4, cols: 4 }
    }
}

/// Rectangle definition in sheet pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    /// Reading-order index (`row * cols + col`)
    pub index: u32,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Size shared by every cell of a `width`×`height` sheet cut into `shape`.
///
/// Returns `None` when the grid has no rows/columns, has more cells than a
/// `u32` can index, or when either cell dimension floors to zero.
pub fn cell_size(width: u32, height: u32, shape: GridShape) -> Option<Size> {
    if shape.rows == 0 || shape.cols == 0 {
        return None;
    }
    shape.cell_count()?;
    let w = width / shape.cols;
    let h = height / shape.rows;
    if w == 0 || h == 0 {
        return None;
    }
    Some(Size { w, h })
}

/// Generate the cell rectangles of a sheet, row-major.
///
/// # Arguments
/// * `width`, `height` - Sheet dimensions
/// * `shape` - Grid dimensions
///
/// # Returns
/// `rows * cols` rectangles ordered by `index`, or `None` if the sheet is too
/// small for the grid (see [`cell_size`]).
pub fn grid_rects(width: u32, height: u32, shape: GridShape) -> Option<Vec<CellRect>> {
    let cell = cell_size(width, height, shape)?;
    let mut rects = Vec::with_capacity(shape.cell_count()? as usize);
    for row in 0..shape.rows {
        for col in 0..shape.cols {
            rects.push(CellRect {
                index: shape.index_of(row, col),
                x: col * cell.w,
                y: row * cell.h,
                w: cell.w,
                h: cell.h,
            });
        }
    }
    Some(rects)
}

/// Copy a rectangular region of a tightly packed or strided RGBA8 buffer into
/// a new tightly packed buffer.
///
/// # Arguments
/// * `src` - Source RGBA buffer
/// * `src_pitch` - Bytes per row in `src`
/// * `roi` - Region to extract; must lie inside the source
///
/// # Panics
/// Panics if `roi` reaches outside `src`. Rectangles from [`grid_rects`]
/// for the same sheet never do.
pub fn crop_rgba(src: &[u8], src_pitch: usize, roi: CellRect) -> Vec<u8> {
    let row_bytes = (roi.w as usize) * 4;
    // Fresh canvas per cell: nothing from a previous cell can bleed through.
    let mut out = vec![0u8; row_bytes * (roi.h as usize)];
    for (r, dst) in out.chunks_exact_mut(row_bytes).enumerate() {
        let row_off = (roi.y as usize + r) * src_pitch + (roi.x as usize) * 4;
        dst.copy_from_slice(&src[row_off..row_off + row_bytes]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_sheet(w: u32, h: u32) -> Vec<u8> {
        // Each pixel encodes its own coordinates; alpha varies too.
        let mut buf = Vec::with_capacity((w * h * 4) as usize);
        for y in 0..h {
            for x in 0..w {
                buf.extend_from_slice(&[x as u8, y as u8, (x ^ y) as u8, (x + y) as u8]);
            }
        }
        buf
    }

    #[test]
    fn cell_size_floors() {
        let s = cell_size(1024, 1024, GridShape::new(4, 4)).unwrap();
        assert_eq!((s.w, s.h), (256, 256));

        let s = cell_size(1030, 1023, GridShape::new(4, 4)).unwrap();
        assert_eq!((s.w, s.h), (257, 255));
    }

    #[test]
    fn cell_size_rejects_tiny_sheets() {
        assert!(cell_size(3, 3, GridShape::new(4, 4)).is_none());
        assert!(cell_size(100, 3, GridShape::new(4, 4)).is_none());
        assert!(cell_size(100, 100, GridShape::new(0, 4)).is_none());
    }

    #[test]
    fn oversized_grid_has_no_cell_count() {
        let shape = GridShape::new(u32::MAX, 2);
        assert_eq!(shape.cell_count(), None);
        assert_eq!(GridShape::new(3, 5).cell_count(), Some(15));
        assert!(cell_size(u32::MAX, u32::MAX, shape).is_none());
    }

    #[test]
    fn rects_are_row_major_and_equal_sized() {
        let shape = GridShape::new(2, 3);
        let rects = grid_rects(90, 40, shape).unwrap();
        assert_eq!(rects.len(), 6);
        for (i, r) in rects.iter().enumerate() {
            assert_eq!(r.index as usize, i);
            assert_eq!((r.w, r.h), (30, 20));
        }
        assert_eq!((rects[2].x, rects[2].y), (60, 0));
        assert_eq!((rects[3].x, rects[3].y), (0, 20));
    }

    #[test]
    fn crop_copies_exact_pixels() {
        let (w, h) = (8, 8);
        let sheet = numbered_sheet(w, h);
        let rect = CellRect { index: 3, x: 4, y: 4, w: 4, h: 4 };
        let cell = crop_rgba(&sheet, (w * 4) as usize, rect);
        assert_eq!(cell.len(), 4 * 4 * 4);
        // first pixel of the cell is sheet pixel (4, 4)
        assert_eq!(&cell[0..4], &[4, 4, 0, 8]);
        // last pixel is sheet pixel (7, 7)
        assert_eq!(&cell[cell.len() - 4..], &[7, 7, 0, 14]);
    }

    #[test]
    fn crop_handles_strided_source() {
        let (w, h) = (4u32, 2u32);
        let pitch = (w as usize) * 4 + 8;
        let mut sheet = vec![0xEEu8; pitch * h as usize];
        for y in 0..h as usize {
            for x in 0..w as usize {
                let o = y * pitch + x * 4;
                sheet[o..o + 4].copy_from_slice(&[x as u8, y as u8, 1, 2]);
            }
        }
        let rect = CellRect { index: 0, x: 2, y: 1, w: 2, h: 1 };
        assert_eq!(crop_rgba(&sheet, pitch, rect), vec![2, 1, 1, 2, 3, 1, 1, 2]);
    }
}
