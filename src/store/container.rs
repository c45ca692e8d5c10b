//! The `.fvx` container file format
//!
//! Every store starts with a 64-byte Pod header followed by a
//! layout-specific payload:
//!
//! - **Fixed**: uncompressed `(n_objects, n_renderings, width)` byte array,
//!   entry `(i, j)` at a fixed offset. Mutable; rows are zero on allocation,
//!   so short writes leave zero padding. Used by the intermediate store and
//!   the source datasets. Carries the `prog`/`max_len` resume checkpoint:
//!   data rows are synced to disk before the header advances, so a crash
//!   between commits never loses or duplicates work.
//! - **Packed**: write-once `(n_objects, n_renderings, max_len)` array split
//!   into lz4-compressed chunks of `chunk_size` objects, with a chunk offset
//!   table after the header. The final store layout.
//! - **Concat**: write-once variable-length layout: a `starts` offset table
//!   (i64, `n_objects * n_renderings + 1` entries) followed by all RLE
//!   streams back-to-back with padding stripped.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::mem::size_of;
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};

use crate::core::error::Error;
use crate::core::types::Result;

pub const MAGIC: [u8; 8] = *b"FVXSTOR1";
pub const VERSION: u32 = 1;

pub const LAYOUT_FIXED: u32 = 0;
pub const LAYOUT_PACKED: u32 = 1;
pub const LAYOUT_CONCAT: u32 = 2;

pub const HEADER_LEN: u64 = size_of::<StoreHeader>() as u64;

/// Fixed-size store header, written little-endian at offset 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct StoreHeader {
    pub magic: [u8; 8],
    pub version: u32,
    pub layout: u32,
    pub n_objects: u64,
    pub n_renderings: u64,
    /// Allocated bytes per entry (Fixed) or trimmed entry width (Packed).
    pub width: u64,
    /// Largest actual RLE length observed over committed rows.
    pub max_len: u64,
    /// Count of objects fully written; rows below `prog` are valid.
    pub prog: u64,
    /// Objects per compressed chunk (Packed only).
    pub chunk_size: u64,
}

impl StoreHeader {
    fn new(layout: u32, n_objects: u64, n_renderings: u64, width: u64) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            layout,
            n_objects,
            n_renderings,
            width,
            max_len: 0,
            prog: 0,
            chunk_size: 0,
        }
    }
}

fn corrupt(path: &Path, reason: impl Into<String>) -> Error {
    Error::CorruptStore {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn read_header(file: &mut File, path: &Path, expect_layout: u32) -> Result<StoreHeader> {
    let mut buf = [0u8; size_of::<StoreHeader>()];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut buf)
        .map_err(|_| corrupt(path, "truncated header"))?;
    let header: StoreHeader = bytemuck::pod_read_unaligned(&buf);
    if header.magic != MAGIC {
        return Err(corrupt(path, "bad magic"));
    }
    if header.version != VERSION {
        return Err(corrupt(path, format!("unsupported version {}", header.version)));
    }
    if header.layout != expect_layout {
        return Err(corrupt(
            path,
            format!("layout {} where {} expected", header.layout, expect_layout),
        ));
    }
    Ok(header)
}

fn write_header(file: &mut File, header: &StoreHeader) -> Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(bytemuck::bytes_of(header))?;
    Ok(())
}

// --- Fixed layout ---

/// Mutable fixed-width store (the intermediate store and source datasets).
#[derive(Debug)]
pub struct FixedStore {
    file: File,
    path: PathBuf,
    header: StoreHeader,
    writable: bool,
}

impl FixedStore {
    /// Create a new store, truncating any existing file. Rows are
    /// zero-filled.
    pub fn create(
        path: &Path,
        n_objects: usize,
        n_renderings: usize,
        width: usize,
    ) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let header = StoreHeader::new(
            LAYOUT_FIXED,
            n_objects as u64,
            n_renderings as u64,
            width as u64,
        );
        let total = HEADER_LEN + (n_objects * n_renderings * width) as u64;
        file.set_len(total)?;
        write_header(&mut file, &header)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            header,
            writable: true,
        })
    }

    /// Open an existing store read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).open(path)?;
        let header = read_header(&mut file, path, LAYOUT_FIXED)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            header,
            writable: false,
        })
    }

    /// Open for resuming, or create when absent. An existing store must
    /// match the expected shape.
    pub fn open_or_create(
        path: &Path,
        n_objects: usize,
        n_renderings: usize,
        width: usize,
    ) -> Result<Self> {
        if !path.is_file() {
            return Self::create(path, n_objects, n_renderings, width);
        }
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let header = read_header(&mut file, path, LAYOUT_FIXED)?;
        let expected = (n_objects as u64, n_renderings as u64, width as u64);
        let actual = (header.n_objects, header.n_renderings, header.width);
        if expected != actual {
            return Err(corrupt(
                path,
                format!("shape mismatch: found {:?}, expected {:?}", actual, expected),
            ));
        }
        Ok(Self {
            file,
            path: path.to_path_buf(),
            header,
            writable: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn n_objects(&self) -> usize {
        self.header.n_objects as usize
    }

    pub fn n_renderings(&self) -> usize {
        self.header.n_renderings as usize
    }

    pub fn width(&self) -> usize {
        self.header.width as usize
    }

    pub fn prog(&self) -> usize {
        self.header.prog as usize
    }

    pub fn max_len(&self) -> usize {
        self.header.max_len as usize
    }

    fn entry_offset(&self, i: usize, j: usize) -> u64 {
        HEADER_LEN + ((i * self.n_renderings() + j) * self.width()) as u64
    }

    fn check_entry(&self, i: usize, j: usize) -> Result<()> {
        if i >= self.n_objects() || j >= self.n_renderings() {
            return Err(corrupt(
                &self.path,
                format!(
                    "entry ({}, {}) out of range ({}, {})",
                    i,
                    j,
                    self.n_objects(),
                    self.n_renderings()
                ),
            ));
        }
        Ok(())
    }

    /// Read the full `width`-byte entry `(i, j)`, padding included.
    pub fn read_entry(&mut self, i: usize, j: usize) -> Result<Vec<u8>> {
        self.check_entry(i, j)?;
        let mut buf = vec![0u8; self.width()];
        self.file.seek(SeekFrom::Start(self.entry_offset(i, j)))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Write entry `(i, j)` left-justified; the remainder of the slot is
    /// zeroed (a resumed run may overwrite a longer stale entry).
    pub fn write_entry(&mut self, i: usize, j: usize, data: &[u8]) -> Result<()> {
        debug_assert!(self.writable);
        self.check_entry(i, j)?;
        let width = self.width();
        if data.len() > width {
            return Err(Error::CapacityExceeded {
                len: data.len(),
                capacity: width,
            });
        }
        self.file.seek(SeekFrom::Start(self.entry_offset(i, j)))?;
        self.file.write_all(data)?;
        if data.len() < width {
            let zeros = vec![0u8; width - data.len()];
            self.file.write_all(&zeros)?;
        }
        Ok(())
    }

    /// Advance the resume checkpoint. The data rows the new `prog` covers
    /// are synced to disk before the header is rewritten; the checkpoint
    /// never runs ahead of the data it describes.
    pub fn commit(&mut self, prog: usize, max_len: usize) -> Result<()> {
        debug_assert!(self.writable);
        debug_assert!(prog as u64 >= self.header.prog);
        debug_assert!(max_len as u64 >= self.header.max_len);
        self.file.sync_data()?;
        self.header.prog = prog as u64;
        self.header.max_len = max_len as u64;
        write_header(&mut self.file, &self.header)?;
        Ok(())
    }

    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

// --- Packed layout ---

/// Writer for the lz4-chunk-compressed final store.
pub struct PackedWriter {
    file: File,
    path: PathBuf,
    header: StoreHeader,
    offsets: Vec<u64>,
    n_chunks: usize,
}

impl PackedWriter {
    pub fn create(
        path: &Path,
        n_objects: usize,
        n_renderings: usize,
        max_len: usize,
        chunk_size: usize,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(corrupt(path, "zero chunk size"));
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut header = StoreHeader::new(
            LAYOUT_PACKED,
            n_objects as u64,
            n_renderings as u64,
            max_len as u64,
        );
        header.max_len = max_len as u64;
        header.prog = n_objects as u64;
        header.chunk_size = chunk_size as u64;

        let n_chunks = n_objects.div_ceil(chunk_size);
        write_header(&mut file, &header)?;
        // Placeholder offset table, rewritten on finish.
        let table = vec![0u8; (n_chunks + 1) * size_of::<u64>()];
        file.write_all(&table)?;

        let data_start = HEADER_LEN + table.len() as u64;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            header,
            offsets: vec![data_start],
            n_chunks,
        })
    }

    /// Compress and append the next chunk. `raw` holds up to `chunk_size`
    /// objects of `n_renderings * max_len` bytes each, in order.
    pub fn write_chunk(&mut self, raw: &[u8]) -> Result<()> {
        if self.offsets.len() > self.n_chunks {
            return Err(corrupt(&self.path, "more chunks written than allocated"));
        }
        let compressed = lz4_flex::compress_prepend_size(raw);
        self.file.write_all(&compressed)?;
        let end = self.offsets.last().copied().unwrap_or(0) + compressed.len() as u64;
        self.offsets.push(end);
        Ok(())
    }

    /// Write the offset table and sync. Must be called after every chunk has
    /// been written.
    pub fn finish(mut self) -> Result<()> {
        if self.offsets.len() != self.n_chunks + 1 {
            return Err(corrupt(
                &self.path,
                format!(
                    "{} chunks written, {} expected",
                    self.offsets.len() - 1,
                    self.n_chunks
                ),
            ));
        }
        self.file.seek(SeekFrom::Start(HEADER_LEN))?;
        for offset in &self.offsets {
            self.file.write_all(&offset.to_le_bytes())?;
        }
        write_header(&mut self.file, &self.header)?;
        self.file.sync_all()?;
        Ok(())
    }
}

/// Read side of the final fixed-width store.
pub struct PackedStore {
    file: File,
    path: PathBuf,
    header: StoreHeader,
    offsets: Vec<u64>,
}

impl PackedStore {
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).open(path)?;
        let header = read_header(&mut file, path, LAYOUT_PACKED)?;
        if header.chunk_size == 0 {
            return Err(corrupt(path, "zero chunk size"));
        }
        let n_chunks = (header.n_objects as usize).div_ceil(header.chunk_size as usize);
        let mut table = vec![0u8; (n_chunks + 1) * size_of::<u64>()];
        file.read_exact(&mut table)
            .map_err(|_| corrupt(path, "truncated chunk offset table"))?;
        let offsets: Vec<u64> = table
            .chunks_exact(size_of::<u64>())
            .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            header,
            offsets,
        })
    }

    pub fn n_objects(&self) -> usize {
        self.header.n_objects as usize
    }

    pub fn n_renderings(&self) -> usize {
        self.header.n_renderings as usize
    }

    pub fn max_len(&self) -> usize {
        self.header.max_len as usize
    }

    /// Decompress the chunk holding objects `[c * chunk_size, ...)`.
    pub fn read_chunk(&mut self, c: usize) -> Result<Vec<u8>> {
        if c + 1 >= self.offsets.len() {
            return Err(corrupt(&self.path, format!("chunk {} out of range", c)));
        }
        let (start, end) = (self.offsets[c], self.offsets[c + 1]);
        let mut buf = vec![0u8; (end - start) as usize];
        self.file.seek(SeekFrom::Start(start))?;
        self.file.read_exact(&mut buf)?;
        lz4_flex::decompress_size_prepended(&buf)
            .map_err(|e| corrupt(&self.path, format!("lz4: {}", e)))
    }

    /// Read the `max_len`-byte entry `(i, j)`.
    pub fn read_entry(&mut self, i: usize, j: usize) -> Result<Vec<u8>> {
        if i >= self.n_objects() || j >= self.n_renderings() {
            return Err(corrupt(
                &self.path,
                format!("entry ({}, {}) out of range", i, j),
            ));
        }
        let chunk_size = self.header.chunk_size as usize;
        let chunk = self.read_chunk(i / chunk_size)?;
        let local = i % chunk_size;
        let max_len = self.max_len();
        let start = (local * self.n_renderings() + j) * max_len;
        Ok(chunk[start..start + max_len].to_vec())
    }
}

// --- Concat layout ---

/// Writer for the alternate concatenated final layout.
pub struct ConcatWriter {
    file: File,
    path: PathBuf,
    n_total: usize,
    expected_values: u64,
    written: u64,
}

impl ConcatWriter {
    /// `starts` must have `n_objects * n_renderings + 1` entries with
    /// `starts[0] == 0`, non-decreasing.
    pub fn create(
        path: &Path,
        n_objects: usize,
        n_renderings: usize,
        starts: &[i64],
    ) -> Result<Self> {
        let n_total = n_objects * n_renderings;
        if starts.len() != n_total + 1 || starts.first() != Some(&0) {
            return Err(corrupt(path, "malformed starts table"));
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut header = StoreHeader::new(
            LAYOUT_CONCAT,
            n_objects as u64,
            n_renderings as u64,
            0,
        );
        header.prog = n_objects as u64;
        write_header(&mut file, &header)?;
        for start in starts {
            file.write_all(&start.to_le_bytes())?;
        }
        Ok(Self {
            file,
            path: path.to_path_buf(),
            n_total,
            expected_values: starts[n_total] as u64,
            written: 0,
        })
    }

    /// Append the next padding-stripped RLE stream.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        if self.written != self.expected_values {
            return Err(corrupt(
                &self.path,
                format!(
                    "{} value bytes written, starts table promises {}",
                    self.written, self.expected_values
                ),
            ));
        }
        self.file.sync_all()?;
        Ok(())
    }
}

/// Read side of the concatenated layout.
pub struct ConcatStore {
    file: File,
    path: PathBuf,
    header: StoreHeader,
    starts: Vec<i64>,
}

impl ConcatStore {
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).open(path)?;
        let header = read_header(&mut file, path, LAYOUT_CONCAT)?;
        let n_total = (header.n_objects * header.n_renderings) as usize;
        let mut table = vec![0u8; (n_total + 1) * size_of::<i64>()];
        file.read_exact(&mut table)
            .map_err(|_| corrupt(path, "truncated starts table"))?;
        let starts: Vec<i64> = table
            .chunks_exact(size_of::<i64>())
            .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            header,
            starts,
        })
    }

    pub fn n_objects(&self) -> usize {
        self.header.n_objects as usize
    }

    pub fn n_renderings(&self) -> usize {
        self.header.n_renderings as usize
    }

    pub fn starts(&self) -> &[i64] {
        &self.starts
    }

    /// Read the k-th RLE stream in row-major (object, rendering) order.
    pub fn read_stream(&mut self, k: usize) -> Result<Vec<u8>> {
        if k + 1 >= self.starts.len() {
            return Err(corrupt(&self.path, format!("stream {} out of range", k)));
        }
        let values_start = HEADER_LEN + (self.starts.len() * size_of::<i64>()) as u64;
        let (start, end) = (self.starts[k], self.starts[k + 1]);
        let mut buf = vec![0u8; (end - start) as usize];
        self.file.seek(SeekFrom::Start(values_start + start as u64))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }
}
