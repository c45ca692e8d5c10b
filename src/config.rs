//! Run configuration: voxelization settings, render manager, and the
//! fixed-object exclusion registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identifies a voxelization of the source shapes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoxelConfig {
    /// Identifier used in dataset paths, e.g. `"base_64"`.
    pub voxel_id: String,
    /// Side length of the cubic source grids.
    pub voxel_dim: usize,
}

impl VoxelConfig {
    pub fn new(voxel_id: impl Into<String>, voxel_dim: usize) -> Self {
        Self {
            voxel_id: voxel_id.into(),
            voxel_dim,
        }
    }
}

/// Parameters of a rendering run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenderParams {
    /// Renderings (camera poses) per object, fixed for the whole run.
    pub n_renderings: usize,
}

/// Owns the dataset root directory and the render parameters; hands out
/// paths to the per-category data files.
#[derive(Clone, Debug)]
pub struct RenderManager {
    root_dir: PathBuf,
    params: RenderParams,
}

impl RenderManager {
    pub fn new(root_dir: impl Into<PathBuf>, params: RenderParams) -> Self {
        Self {
            root_dir: root_dir.into(),
            params,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// Per-category camera position dataset.
    pub fn camera_positions_path(&self, cat_id: &str) -> PathBuf {
        self.root_dir
            .join("renderings")
            .join("camera_positions")
            .join(format!("{}.fvx", cat_id))
    }
}

/// Immutable registry of known-bad models, injected at startup.
///
/// Bad models are excluded from dataset builds upstream; the registry only
/// answers membership queries.
#[derive(Clone, Debug, Default)]
pub struct BadModelRegistry {
    bad_ids: HashMap<String, Vec<String>>,
}

impl BadModelRegistry {
    pub fn from_entries<I, C, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, E)>,
        C: Into<String>,
        E: Into<String>,
    {
        let mut bad_ids: HashMap<String, Vec<String>> = HashMap::new();
        for (cat_id, example_id) in entries {
            bad_ids
                .entry(cat_id.into())
                .or_default()
                .push(example_id.into());
        }
        Self { bad_ids }
    }

    pub fn bad_ids(&self, cat_id: &str) -> &[String] {
        self.bad_ids.get(cat_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_bad(&self, cat_id: &str, example_id: &str) -> bool {
        self.bad_ids(cat_id).iter().any(|id| id == example_id)
    }
}

/// Path helpers for the fixed (normalized) mesh store.
#[derive(Clone, Debug)]
pub struct FixedObjDirs {
    data_dir: PathBuf,
}

impl FixedObjDirs {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn obj_dir(&self, cat_id: &str, example_id: Option<&str>) -> PathBuf {
        match example_id {
            None => self.data_dir.join(cat_id),
            Some(example_id) => self.data_dir.join(cat_id).join(example_id),
        }
    }

    pub fn obj_path(&self, cat_id: &str, example_id: &str) -> PathBuf {
        self.obj_dir(cat_id, Some(example_id)).join("model.obj")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_model_registry() {
        let reg = BadModelRegistry::from_entries([
            ("02958343", "f9c1d7748c15499c6f2bd1c4e9adb41"),
        ]);
        assert!(reg.is_bad("02958343", "f9c1d7748c15499c6f2bd1c4e9adb41"));
        assert!(!reg.is_bad("02958343", "other"));
        assert!(!reg.is_bad("03001627", "f9c1d7748c15499c6f2bd1c4e9adb41"));
        assert!(reg.bad_ids("missing").is_empty());
    }

    #[test]
    fn test_fixed_obj_paths() {
        let dirs = FixedObjDirs::new("/data/_fixed_meshes");
        assert_eq!(
            dirs.obj_path("cat", "ex"),
            PathBuf::from("/data/_fixed_meshes/cat/ex/model.obj")
        );
    }

    #[test]
    fn test_camera_positions_path() {
        let manager = RenderManager::new("/data", RenderParams { n_renderings: 8 });
        assert_eq!(
            manager.camera_positions_path("03001627"),
            PathBuf::from("/data/renderings/camera_positions/03001627.fvx")
        );
    }
}
