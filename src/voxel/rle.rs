//! Run-length codec for voxel occupancy streams
//!
//! A stream is a flat sequence of single-byte run counts alternating between
//! empty and occupied cells, starting with an empty run. Runs longer than 255
//! are split by inserting zero-length runs of the opposite value. Streams
//! always have even length; a trailing zero occupied-count is appended when
//! needed. Decoding is self-terminating: it stops once the grid's cell count
//! has been produced, so trailing zero padding from fixed-width storage is
//! ignored.

use crate::core::error::Error;
use crate::core::types::Result;
use crate::voxel::DenseVoxels;

/// Encode a flat cell sequence into RLE bytes.
pub fn encode(cells: &[bool]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut value = false;
    let mut run = 0usize;
    for &cell in cells {
        if cell == value {
            run += 1;
        } else {
            push_run(&mut out, run);
            value = cell;
            run = 1;
        }
    }
    push_run(&mut out, run);
    if out.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn push_run(out: &mut Vec<u8>, mut run: usize) {
    while run > 255 {
        out.push(255);
        out.push(0);
        run -= 255;
    }
    out.push(run as u8);
}

/// Decode RLE bytes into exactly `n_cells` cells.
///
/// Trailing padding past the point where `n_cells` is reached is ignored.
pub fn decode(rle: &[u8], n_cells: usize) -> Result<Vec<bool>> {
    let mut cells = Vec::with_capacity(n_cells);
    let mut value = false;
    for &byte in rle {
        if cells.len() == n_cells {
            break;
        }
        let run = byte as usize;
        if cells.len() + run > n_cells {
            return Err(Error::Rle(format!(
                "run of {} overflows grid of {} cells at offset {}",
                run,
                n_cells,
                cells.len()
            )));
        }
        cells.resize(cells.len() + run, value);
        value = !value;
    }
    if cells.len() < n_cells {
        return Err(Error::Rle(format!(
            "stream exhausted after {} of {} cells",
            cells.len(),
            n_cells
        )));
    }
    Ok(cells)
}

/// Zero-pad an RLE stream to a fixed storage width.
pub fn pad_to(rle: &[u8], width: usize) -> Vec<u8> {
    debug_assert!(rle.len() <= width);
    let mut out = Vec::with_capacity(width);
    out.extend_from_slice(rle);
    out.resize(width, 0);
    out
}

/// Strip trailing zero padding, recovering the original stream.
///
/// Trailing zeros are removed, then a single zero is restored if the result
/// has odd length (the final occupied-count of a valid stream may
/// legitimately be zero). Exact inverse of [`pad_to`] for any valid stream.
pub fn strip_length_padding(padded: &[u8]) -> &[u8] {
    let mut end = padded.len();
    while end > 0 && padded[end - 1] == 0 {
        end -= 1;
    }
    if end % 2 == 1 {
        end += 1;
    }
    &padded[..end]
}

/// RLE-represented voxel grid: raw stream plus grid dimensions.
#[derive(Clone, Debug)]
pub struct RleVoxels {
    data: Vec<u8>,
    dims: (usize, usize, usize),
}

impl RleVoxels {
    /// Wrap raw per-object row bytes with known dimensions. The row may carry
    /// trailing zero padding from fixed-width storage.
    pub fn new(data: Vec<u8>, dims: (usize, usize, usize)) -> Self {
        Self { data, dims }
    }

    pub fn from_dense(dense: &DenseVoxels) -> Self {
        Self {
            data: encode(dense.cells()),
            dims: dense.dims(),
        }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        self.dims
    }

    pub fn rle_data(&self) -> &[u8] {
        &self.data
    }

    /// Expand to a full occupancy grid.
    pub fn dense(&self) -> Result<DenseVoxels> {
        let (dx, dy, dz) = self.dims;
        let cells = decode(&self.data, dx * dy * dz)?;
        Ok(DenseVoxels::new(self.dims, cells))
    }
}
