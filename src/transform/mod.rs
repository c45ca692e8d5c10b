//! Geometric transforms from world-aligned voxels to camera frustum space

pub mod nonhom;
pub mod frustum;

pub use frustum::{convert, voxel_values_to_frustum, FOV_SCALE};
pub use nonhom::eye_to_world_transform;
