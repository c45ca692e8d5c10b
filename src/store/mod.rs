//! On-disk stores: the `.fvx` container, the resumable temp accumulator,
//! and the shrink/concat compactors.

pub mod container;
pub mod paths;
pub mod temp;
pub mod shrink;

pub use container::{ConcatStore, FixedStore, PackedStore};
pub use paths::{frustrum_voxels_dir, frustrum_voxels_path};
pub use shrink::{concat_data, shrink_data, DEFAULT_CHUNK_SIZE};
pub use temp::{create_temp_frustrum_voxels, RLE_EXPANSION_FACTOR};
