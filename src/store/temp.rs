//! Temp accumulator: builds the padded intermediate frustum voxel store,
//! one committed object at a time, resuming from the persisted checkpoint.

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::config::{RenderManager, VoxelConfig};
use crate::core::error::Error;
use crate::core::types::Result;
use crate::sources::{CameraPositions, SourceVoxels};
use crate::store::container::FixedStore;
use crate::store::paths::{frustrum_voxels_path, make_parent_dir};
use crate::transform::convert;
use crate::voxel::RleVoxels;

/// Worst-case growth of an RLE row under frustum resampling. Resampling can
/// fragment long runs into many short ones; 3x the source row width bounds
/// the expansion for this transform family, and exceeding it is treated as a
/// fatal capacity violation rather than a recoverable condition.
pub const RLE_EXPANSION_FACTOR: usize = 3;

fn progress_bar(len: usize, msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap()
            .progress_chars("▉▊▋▌▍▎▏ "),
    );
    pb.set_message(msg);
    pb
}

/// Build (or resume) the intermediate per-object x per-rendering RLE store
/// for one category. Returns the path of the temp store, which is complete
/// (`prog == n_objects`) on success.
///
/// Each object is committed only after all of its renderings are written, so
/// interrupting the process at any point loses at most the object in flight;
/// the next invocation resumes at the checkpoint.
pub fn create_temp_frustrum_voxels(
    manager: &RenderManager,
    voxel_config: &VoxelConfig,
    out_dim: usize,
    cat_id: &str,
) -> Result<PathBuf> {
    let n_renderings = manager.params().n_renderings;
    let in_dim = voxel_config.voxel_dim;
    let in_dims = (in_dim, in_dim, in_dim);
    let ray_shape = (out_dim, out_dim, out_dim);

    let mut cameras = CameraPositions::open(&manager.camera_positions_path(cat_id))?;
    let n0 = cameras.n_objects();

    let mut source = SourceVoxels::open(manager.root_dir(), voxel_config, cat_id)?;
    let (n, m) = source.shape();
    if n != n0 {
        return Err(Error::RowCountMismatch {
            cameras: n0,
            voxels: n,
        });
    }
    let capacity = m * RLE_EXPANSION_FACTOR;

    let temp_path = frustrum_voxels_path(
        manager.root_dir(),
        voxel_config,
        out_dim,
        cat_id,
        Some("temp"),
    );
    make_parent_dir(&temp_path)?;
    let mut dst = FixedStore::open_or_create(&temp_path, n, n_renderings, capacity)?;

    let prog = dst.prog();
    if prog == n {
        info!("Temp store already complete at {}", temp_path.display());
        return Ok(temp_path);
    }

    info!(
        "Creating temp rle frustrum voxel data at {}",
        temp_path.display()
    );
    let mut max_len = dst.max_len();
    let pb = progress_bar(n - prog, "Converting objects");
    for i in prog..n {
        let vox = RleVoxels::new(source.read_row(i)?, in_dims);
        for j in 0..n_renderings {
            let eye = cameras.eye(i, j)?;
            let out = convert(&vox, eye, ray_shape)?;
            let data = out.rle_data();
            if data.len() > capacity {
                return Err(Error::CapacityExceeded {
                    len: data.len(),
                    capacity,
                });
            }
            if data.len() > max_len {
                max_len = data.len();
            }
            dst.write_entry(i, j, &data)?;
        }
        dst.commit(i + 1, max_len)?;
        pb.inc(1);
    }
    pb.finish_with_message("Conversion complete");
    dst.sync()?;
    Ok(temp_path)
}
