//! Error types for the dataset builder

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the dataset builder
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source dataset missing: {0}")]
    DatasetMissing(PathBuf),

    #[error("row count mismatch: camera dataset has {cameras} rows, voxel dataset has {voxels}")]
    RowCountMismatch { cameras: usize, voxels: usize },

    #[error("encoded length exceeds preallocated capacity: {len} > {capacity}")]
    CapacityExceeded { len: usize, capacity: usize },

    #[error("corrupt store at {path}: {reason}")]
    CorruptStore { path: PathBuf, reason: String },

    #[error("RLE decode error: {0}")]
    Rle(String),
}
