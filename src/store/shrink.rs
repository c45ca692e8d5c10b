//! Compactors: rewrite the padded intermediate store into a final store.
//!
//! The default fixed-width pass trims every row to the discovered `max_len`;
//! the alternate concat pass strips padding entirely and stores streams
//! back-to-back behind a start-offset index.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::core::types::Result;
use crate::store::container::{ConcatWriter, FixedStore, PackedWriter};
use crate::store::paths::make_parent_dir;
use crate::voxel::rle;

/// Objects copied per compressed chunk. Bounds peak memory during the copy;
/// has no effect on correctness.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

fn progress_bar(len: usize, msg: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.green/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap()
            .progress_chars("▉▊▋▌▍▎▏ "),
    );
    pb.set_message(msg);
    pb
}

/// Copy the intermediate store into a fixed-width final store of width
/// `max_len`, `chunk_size` objects at a time. The intermediate store is only
/// read; padding past `max_len` is all zero by construction and simply
/// discarded.
pub fn shrink_data(temp_path: &Path, dst_path: &Path, chunk_size: usize) -> Result<()> {
    info!("Shrinking data to fit.");
    let mut src = FixedStore::open(temp_path)?;
    let n_objects = src.n_objects();
    let n_renderings = src.n_renderings();
    let max_len = src.max_len();

    make_parent_dir(dst_path)?;
    let mut dst = PackedWriter::create(dst_path, n_objects, n_renderings, max_len, chunk_size)?;

    let pb = progress_bar(n_objects.div_ceil(chunk_size), "Shrinking");
    let mut start = 0;
    while start < n_objects {
        let stop = (start + chunk_size).min(n_objects);
        let mut raw = Vec::with_capacity((stop - start) * n_renderings * max_len);
        for i in start..stop {
            for j in 0..n_renderings {
                let row = src.read_entry(i, j)?;
                raw.extend_from_slice(&row[..max_len]);
            }
        }
        dst.write_chunk(&raw)?;
        pb.inc(1);
        start = stop;
    }
    pb.finish_with_message("Shrink complete");
    dst.finish()
}

/// Alternate compaction: concatenate padding-stripped streams with a
/// start-offset index. Two passes over the intermediate store: one to size
/// the `starts` table, one to transfer values.
pub fn concat_data(temp_path: &Path, dst_path: &Path) -> Result<()> {
    info!("Concatenating data.");
    let mut src = FixedStore::open(temp_path)?;
    let n_objects = src.n_objects();
    let n_renderings = src.n_renderings();
    let n_total = n_objects * n_renderings;

    info!("Computing starts...");
    let mut starts = Vec::with_capacity(n_total + 1);
    starts.push(0i64);
    let pb = progress_bar(n_objects, "Computing starts");
    for i in 0..n_objects {
        for j in 0..n_renderings {
            let row = src.read_entry(i, j)?;
            let data = rle::strip_length_padding(&row);
            starts.push(starts.last().unwrap() + data.len() as i64);
        }
        pb.inc(1);
    }
    pb.finish_with_message("Starts computed");

    make_parent_dir(dst_path)?;
    let mut dst = ConcatWriter::create(dst_path, n_objects, n_renderings, &starts)?;

    info!("Transfering data...");
    let pb = progress_bar(n_objects, "Transfering values");
    for i in 0..n_objects {
        for j in 0..n_renderings {
            let row = src.read_entry(i, j)?;
            dst.append(rle::strip_length_padding(&row))?;
        }
        pb.inc(1);
    }
    pb.finish_with_message("Transfer complete");
    dst.finish()
}
