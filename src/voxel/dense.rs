//! Dense occupancy voxel grids

/// Full 3-D occupancy grid, one bool per cell, C-order (x-major) layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenseVoxels {
    dims: (usize, usize, usize),
    cells: Vec<bool>,
}

impl DenseVoxels {
    /// Wrap an existing cell buffer. `cells.len()` must equal `dx * dy * dz`.
    pub fn new(dims: (usize, usize, usize), cells: Vec<bool>) -> Self {
        debug_assert_eq!(cells.len(), dims.0 * dims.1 * dims.2);
        Self { dims, cells }
    }

    /// Grid with every cell set to `value`.
    pub fn filled(dims: (usize, usize, usize), value: bool) -> Self {
        Self {
            dims,
            cells: vec![value; dims.0 * dims.1 * dims.2],
        }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.dims.1 + y) * self.dims.2 + z
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> bool {
        self.cells[self.index(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: bool) {
        let idx = self.index(x, y, z);
        self.cells[idx] = value;
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [bool] {
        &mut self.cells
    }

    /// New grid with the y axis (axis 1) reversed.
    ///
    /// The frustum conversion flips this axis on the way in and back out to
    /// match the handedness the eye-to-world transform assumes.
    pub fn flip_y(&self) -> DenseVoxels {
        let (dx, dy, dz) = self.dims;
        let mut out = vec![false; self.cells.len()];
        for x in 0..dx {
            for y in 0..dy {
                let src = (x * dy + y) * dz;
                let dst = (x * dy + (dy - 1 - y)) * dz;
                out[dst..dst + dz].copy_from_slice(&self.cells[src..src + dz]);
            }
        }
        DenseVoxels::new(self.dims, out)
    }

    /// Serialize to the minimal RLE byte stream.
    pub fn rle_data(&self) -> Vec<u8> {
        super::rle::encode(&self.cells)
    }

    /// Count of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_order() {
        let mut v = DenseVoxels::filled((2, 3, 4), false);
        v.set(1, 2, 3, true);
        assert!(v.get(1, 2, 3));
        // C order: last axis contiguous
        assert!(v.cells()[(1 * 3 + 2) * 4 + 3]);
    }

    #[test]
    fn test_flip_y_involution() {
        let cells: Vec<bool> = (0..2 * 3 * 4).map(|i| i % 5 == 0).collect();
        let v = DenseVoxels::new((2, 3, 4), cells);
        assert_eq!(v.flip_y().flip_y(), v);
    }

    #[test]
    fn test_flip_y_moves_cells() {
        let mut v = DenseVoxels::filled((2, 3, 2), false);
        v.set(0, 0, 1, true);
        let flipped = v.flip_y();
        assert!(flipped.get(0, 2, 1));
        assert!(!flipped.get(0, 0, 1));
    }
}
