//! Pipeline orchestrator: idempotent creation of the final frustum voxel
//! store for one category.

use std::path::PathBuf;

use log::info;

use crate::config::{RenderManager, VoxelConfig};
use crate::core::types::Result;
use crate::store::container::PackedStore;
use crate::store::paths::frustrum_voxels_path;
use crate::store::shrink::{concat_data, shrink_data, DEFAULT_CHUNK_SIZE};
use crate::store::temp::create_temp_frustrum_voxels;

/// Final store layout selection. Fixed is the default; Concat is the
/// alternate variable-length layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FinalLayout {
    #[default]
    Fixed,
    Concat,
}

/// Path of the final store for `(voxel_config, out_dim, cat_id)`.
pub fn get_frustrum_voxels_path(
    manager: &RenderManager,
    voxel_config: &VoxelConfig,
    out_dim: usize,
    cat_id: &str,
) -> PathBuf {
    frustrum_voxels_path(manager.root_dir(), voxel_config, out_dim, cat_id, None)
}

/// Open the final fixed-width store for reading.
pub fn open_frustrum_voxels(
    manager: &RenderManager,
    voxel_config: &VoxelConfig,
    out_dim: usize,
    cat_id: &str,
) -> Result<PackedStore> {
    PackedStore::open(&get_frustrum_voxels_path(
        manager,
        voxel_config,
        out_dim,
        cat_id,
    ))
}

/// Build the final frustum voxel store for one category.
///
/// No-op when the final store already exists. Otherwise drives the temp
/// accumulator (resuming any earlier interrupted run) and then compacts the
/// intermediate store into the final layout. The intermediate store is left
/// in place; deleting it is the caller's call.
pub fn create_frustrum_voxels(
    manager: &RenderManager,
    voxel_config: &VoxelConfig,
    out_dim: usize,
    cat_id: &str,
) -> Result<()> {
    create_frustrum_voxels_with_layout(manager, voxel_config, out_dim, cat_id, FinalLayout::Fixed)
}

pub fn create_frustrum_voxels_with_layout(
    manager: &RenderManager,
    voxel_config: &VoxelConfig,
    out_dim: usize,
    cat_id: &str,
    layout: FinalLayout,
) -> Result<()> {
    let dst_path = get_frustrum_voxels_path(manager, voxel_config, out_dim, cat_id);
    if dst_path.is_file() {
        info!("Already present at {}", dst_path.display());
        return Ok(());
    }
    let temp_path = create_temp_frustrum_voxels(manager, voxel_config, out_dim, cat_id)?;
    match layout {
        FinalLayout::Fixed => shrink_data(&temp_path, &dst_path, DEFAULT_CHUNK_SIZE),
        FinalLayout::Concat => concat_data(&temp_path, &dst_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderParams;
    use crate::core::types::Vec3;
    use crate::sources::{CameraPositions, SourceVoxels};
    use crate::store::container::ConcatStore;
    use crate::transform::convert;
    use crate::voxel::{rle, DenseVoxels, RleVoxels};

    const SOURCE_WIDTH: usize = 10;
    const OUT_DIM: usize = 4;
    const N_RENDERINGS: usize = 3;

    fn eyes() -> Vec<Vec<Vec3>> {
        (0..2)
            .map(|i| {
                (0..N_RENDERINGS)
                    .map(|j| {
                        let angle = (i * N_RENDERINGS + j) as f32 * 0.9;
                        Vec3::new(angle.cos(), angle.sin(), 0.3)
                    })
                    .collect()
            })
            .collect()
    }

    fn setup(root: &std::path::Path, config: &VoxelConfig) -> RenderManager {
        // Two all-occupied 4x4x4 source grids
        let rows: Vec<Vec<u8>> = (0..2)
            .map(|_| DenseVoxels::filled((4, 4, 4), true).rle_data())
            .collect();
        SourceVoxels::create(
            &SourceVoxels::path(root, config, "cat"),
            &rows,
            SOURCE_WIDTH,
        )
        .unwrap();
        let manager = RenderManager::new(
            root,
            RenderParams {
                n_renderings: N_RENDERINGS,
            },
        );
        CameraPositions::create(&manager.camera_positions_path("cat"), &eyes()).unwrap();
        manager
    }

    #[test]
    fn test_end_to_end_fixed_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = VoxelConfig::new("base_4", 4);
        let manager = setup(dir.path(), &config);

        create_frustrum_voxels(&manager, &config, OUT_DIM, "cat").unwrap();

        let mut store = open_frustrum_voxels(&manager, &config, OUT_DIM, "cat").unwrap();
        assert_eq!(store.n_objects(), 2);
        assert_eq!(store.n_renderings(), N_RENDERINGS);

        let source = RleVoxels::from_dense(&DenseVoxels::filled((4, 4, 4), true));
        let eyes = eyes();
        let mut longest = 0;
        for i in 0..2 {
            for j in 0..N_RENDERINGS {
                let expected = convert(&source, eyes[i][j], (OUT_DIM, OUT_DIM, OUT_DIM)).unwrap();
                longest = longest.max(expected.rle_data().len());
                let row = store.read_entry(i, j).unwrap();
                let decoded = RleVoxels::new(row, (OUT_DIM, OUT_DIM, OUT_DIM))
                    .dense()
                    .unwrap();
                assert_eq!(decoded, expected, "entry ({}, {})", i, j);
            }
        }
        // max_len is exactly the longest of the six encoded frustum grids
        assert_eq!(store.max_len(), longest);
    }

    #[test]
    fn test_orchestrator_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = VoxelConfig::new("base_4", 4);
        let manager = setup(dir.path(), &config);

        create_frustrum_voxels(&manager, &config, OUT_DIM, "cat").unwrap();
        let dst = get_frustrum_voxels_path(&manager, &config, OUT_DIM, "cat");
        let bytes = std::fs::read(&dst).unwrap();
        let mtime = std::fs::metadata(&dst).unwrap().modified().unwrap();

        // Second run performs no writes
        create_frustrum_voxels(&manager, &config, OUT_DIM, "cat").unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), bytes);
        assert_eq!(std::fs::metadata(&dst).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn test_end_to_end_concat_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = VoxelConfig::new("base_4", 4);
        let manager = setup(dir.path(), &config);

        create_frustrum_voxels_with_layout(
            &manager,
            &config,
            OUT_DIM,
            "cat",
            FinalLayout::Concat,
        )
        .unwrap();

        let dst = get_frustrum_voxels_path(&manager, &config, OUT_DIM, "cat");
        let mut store = ConcatStore::open(&dst).unwrap();
        assert_eq!(store.starts().len(), 2 * N_RENDERINGS + 1);
        assert_eq!(store.starts()[0], 0);

        let source = RleVoxels::from_dense(&DenseVoxels::filled((4, 4, 4), true));
        let eyes = eyes();
        let mut k = 0;
        for i in 0..2 {
            for j in 0..N_RENDERINGS {
                let expected = convert(&source, eyes[i][j], (OUT_DIM, OUT_DIM, OUT_DIM)).unwrap();
                let stream = store.read_stream(k).unwrap();
                assert_eq!(&stream, &expected.rle_data(), "stream {}", k);
                k += 1;
            }
        }
    }

    #[test]
    fn test_final_path_layout() {
        let manager = RenderManager::new("/data", RenderParams { n_renderings: 8 });
        let config = VoxelConfig::new("base_64", 64);
        assert_eq!(
            get_frustrum_voxels_path(&manager, &config, 32, "03001627"),
            std::path::PathBuf::from("/data/frustrum_voxels/base_64/v032/03001627.fvx")
        );
    }

    #[test]
    fn test_missing_source_fails_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = VoxelConfig::new("base_4", 4);
        let manager = RenderManager::new(dir.path(), RenderParams { n_renderings: 2 });
        CameraPositions::create(
            &manager.camera_positions_path("cat"),
            &[vec![Vec3::ONE, Vec3::ONE]],
        )
        .unwrap();

        assert!(create_frustrum_voxels(&manager, &config, OUT_DIM, "cat").is_err());
        assert!(!get_frustrum_voxels_path(&manager, &config, OUT_DIM, "cat").exists());
    }

    #[test]
    fn test_concat_streams_match_stripped_temp_rows() {
        let dir = tempfile::tempdir().unwrap();
        let config = VoxelConfig::new("base_4", 4);
        let manager = setup(dir.path(), &config);

        let temp = create_temp_frustrum_voxels(&manager, &config, OUT_DIM, "cat").unwrap();
        let dst = get_frustrum_voxels_path(&manager, &config, OUT_DIM, "cat");
        concat_data(&temp, &dst).unwrap();

        let mut temp_store = crate::store::container::FixedStore::open(&temp).unwrap();
        let mut store = ConcatStore::open(&dst).unwrap();
        let mut k = 0;
        for i in 0..2 {
            for j in 0..N_RENDERINGS {
                let row = temp_store.read_entry(i, j).unwrap();
                assert_eq!(
                    store.read_stream(k).unwrap(),
                    rle::strip_length_padding(&row),
                    "stream {}",
                    k
                );
                k += 1;
            }
        }
    }
}
