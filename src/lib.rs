//! Fruvox - frustum-space voxel dataset builder
//!
//! Converts world-aligned RLE voxel grids into camera-frustum-aligned voxel
//! grids, one per rendering, and packs them into per-category on-disk stores
//! for image-conditioned 3D shape learning pipelines.

pub mod core;
pub mod config;
pub mod voxel;
pub mod transform;
pub mod store;
pub mod sources;
pub mod pipeline;
