//! Voxel grid representations and the RLE codec

pub mod dense;
pub mod rle;

pub use dense::DenseVoxels;
pub use rle::RleVoxels;
