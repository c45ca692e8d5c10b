//! External data providers: per-category camera positions and the source
//! RLE voxel datasets. Both reuse the Fixed container layout; `create`
//! variants exist for upstream tooling and test fixtures.

use std::path::{Path, PathBuf};

use crate::config::VoxelConfig;
use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::store::container::FixedStore;
use crate::store::paths::make_parent_dir;

const EYE_BYTES: usize = 12; // three little-endian f32s

/// Per-category camera eye positions, shape `(n_objects, n_renderings)`.
#[derive(Debug)]
pub struct CameraPositions {
    store: FixedStore,
}

impl CameraPositions {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::DatasetMissing(path.to_path_buf()));
        }
        Ok(Self {
            store: FixedStore::open(path)?,
        })
    }

    /// Write a complete camera position dataset. Every object must carry the
    /// same number of eye positions.
    pub fn create(path: &Path, eyes: &[Vec<Vec3>]) -> Result<()> {
        let n_objects = eyes.len();
        let n_renderings = eyes.first().map(Vec::len).unwrap_or(0);
        make_parent_dir(path)?;
        let mut store = FixedStore::create(path, n_objects, n_renderings, EYE_BYTES)?;
        for (i, object_eyes) in eyes.iter().enumerate() {
            debug_assert_eq!(object_eyes.len(), n_renderings);
            for (j, eye) in object_eyes.iter().enumerate() {
                let mut buf = [0u8; EYE_BYTES];
                buf[0..4].copy_from_slice(&eye.x.to_le_bytes());
                buf[4..8].copy_from_slice(&eye.y.to_le_bytes());
                buf[8..12].copy_from_slice(&eye.z.to_le_bytes());
                store.write_entry(i, j, &buf)?;
            }
        }
        store.commit(n_objects, EYE_BYTES)?;
        store.sync()
    }

    pub fn n_objects(&self) -> usize {
        self.store.n_objects()
    }

    pub fn n_renderings(&self) -> usize {
        self.store.n_renderings()
    }

    pub fn eye(&mut self, i: usize, j: usize) -> Result<Vec3> {
        let buf = self.store.read_entry(i, j)?;
        let f = |k: usize| f32::from_le_bytes(buf[k..k + 4].try_into().unwrap());
        Ok(Vec3::new(f(0), f(4), f(8)))
    }
}

/// Per-category source voxel dataset: `(n_objects, width)` padded RLE rows.
#[derive(Debug)]
pub struct SourceVoxels {
    store: FixedStore,
}

impl SourceVoxels {
    /// `<root>/voxels/<voxel_id>/rle-pad/<cat_id>.fvx`
    pub fn path(root_dir: &Path, voxel_config: &VoxelConfig, cat_id: &str) -> PathBuf {
        root_dir
            .join("voxels")
            .join(&voxel_config.voxel_id)
            .join("rle-pad")
            .join(format!("{}.fvx", cat_id))
    }

    pub fn open(root_dir: &Path, voxel_config: &VoxelConfig, cat_id: &str) -> Result<Self> {
        let path = Self::path(root_dir, voxel_config, cat_id);
        if !path.is_file() {
            return Err(Error::DatasetMissing(path));
        }
        Ok(Self {
            store: FixedStore::open(&path)?,
        })
    }

    /// Write a complete source dataset; rows shorter than `width` are
    /// zero-padded.
    pub fn create(path: &Path, rows: &[Vec<u8>], width: usize) -> Result<()> {
        make_parent_dir(path)?;
        let mut store = FixedStore::create(path, rows.len(), 1, width)?;
        for (i, row) in rows.iter().enumerate() {
            store.write_entry(i, 0, row)?;
        }
        store.commit(rows.len(), width)?;
        store.sync()
    }

    /// `(n_objects, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.store.n_objects(), self.store.width())
    }

    pub fn read_row(&mut self, i: usize) -> Result<Vec<u8>> {
        self.store.read_entry(i, 0)
    }
}
