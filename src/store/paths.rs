//! Dataset path conventions

use std::path::{Path, PathBuf};

use crate::config::VoxelConfig;
use crate::core::types::Result;

/// Path of a frustum voxel store:
/// `<root>/frustrum_voxels/<voxel_id>/v<out_dim>/[<code>_]<cat_id>.fvx`.
///
/// `code` distinguishes intermediate artifacts (`"temp"`) from the final
/// store (`None`).
pub fn frustrum_voxels_path(
    root_dir: &Path,
    voxel_config: &VoxelConfig,
    out_dim: usize,
    cat_id: &str,
    code: Option<&str>,
) -> PathBuf {
    let file_name = match code {
        None => format!("{}.fvx", cat_id),
        Some(code) => format!("{}_{}.fvx", code, cat_id),
    };
    frustrum_voxels_dir(root_dir, voxel_config, out_dim).join(file_name)
}

/// Directory holding every store for one `(voxel_id, out_dim)` pair.
pub fn frustrum_voxels_dir(root_dir: &Path, voxel_config: &VoxelConfig, out_dim: usize) -> PathBuf {
    root_dir
        .join("frustrum_voxels")
        .join(&voxel_config.voxel_id)
        .join(format!("v{:03}", out_dim))
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn make_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_path() {
        let config = VoxelConfig::new("base_64", 64);
        let path = frustrum_voxels_path(Path::new("/data"), &config, 32, "03001627", None);
        assert_eq!(
            path,
            PathBuf::from("/data/frustrum_voxels/base_64/v032/03001627.fvx")
        );
    }

    #[test]
    fn test_temp_path() {
        let config = VoxelConfig::new("base_64", 64);
        let path =
            frustrum_voxels_path(Path::new("/data"), &config, 128, "03001627", Some("temp"));
        assert_eq!(
            path,
            PathBuf::from("/data/frustrum_voxels/base_64/v128/temp_03001627.fvx")
        );
    }
}
