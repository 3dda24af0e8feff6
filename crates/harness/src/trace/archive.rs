//! Binary layout of an episode trace archive (little endian):
//!
//! ```text
//! magic "KPTR" | u16 version | u32 rows | u32 cols | f64 episode reward
//! | u32 raw payload len | u32 compressed len | [u8; 32] sha256(compressed)
//! | compressed payload
//! ```
//!
//! The payload is an LZ4 block holding `rows * cols` row-major `f32` values.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::staging::persist_atomically;
use super::TraceError;

const MAGIC: &[u8; 4] = b"KPTR";
pub const TRACE_FORMAT_VERSION: u16 = 1;
const HASH_LEN: usize = 32;

/// A decoded trace: one 2D array of `rows` x `cols` values.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceArchive {
    pub format_version: u16,
    pub rows: usize,
    pub cols: usize,
    pub episode_reward: f64,
    pub values: Vec<f32>,
}

impl TraceArchive {
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.cols;
        self.values.get(start..start + self.cols)
    }

    /// Width of the observation part of each row.
    pub fn observation_width(&self) -> usize {
        self.cols.saturating_sub(2)
    }
}

pub fn write_trace_archive(
    path: &Path,
    rows: usize,
    cols: usize,
    episode_reward: f64,
    values: &[f32],
) -> Result<(), TraceError> {
    if rows.checked_mul(cols) != Some(values.len()) {
        return Err(invalid_format(path, "value count does not match shape"));
    }
    let rows_u32 = u32::try_from(rows).map_err(|_| invalid_format(path, "too many rows"))?;
    let cols_u32 = u32::try_from(cols).map_err(|_| invalid_format(path, "row too wide"))?;

    let mut raw = Vec::<u8>::with_capacity(values.len() * 4);
    for value in values {
        raw.extend_from_slice(&value.to_le_bytes());
    }
    let raw_len =
        u32::try_from(raw.len()).map_err(|_| invalid_format(path, "payload too large"))?;
    let payload = lz4_flex::block::compress(&raw);
    let payload_len =
        u32::try_from(payload.len()).map_err(|_| invalid_format(path, "payload too large"))?;

    let mut bytes = Vec::<u8>::with_capacity(payload.len() + 64);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&TRACE_FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&rows_u32.to_le_bytes());
    bytes.extend_from_slice(&cols_u32.to_le_bytes());
    bytes.extend_from_slice(&episode_reward.to_le_bytes());
    bytes.extend_from_slice(&raw_len.to_le_bytes());
    bytes.extend_from_slice(&payload_len.to_le_bytes());
    bytes.extend_from_slice(&sha256_bytes(&payload));
    bytes.extend_from_slice(&payload);

    persist_atomically(path, &bytes).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_trace_archive(path: &Path) -> Result<TraceArchive, TraceError> {
    let bytes = fs::read(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cursor = 0usize;

    let magic = read_exact(&bytes, &mut cursor, 4, path)?;
    if magic != MAGIC {
        return Err(invalid_format(path, "invalid magic"));
    }
    let format_version = u16::from_le_bytes(read_array(&bytes, &mut cursor, path)?);
    if format_version != TRACE_FORMAT_VERSION {
        return Err(invalid_format(
            path,
            &format!("unsupported format version {format_version}"),
        ));
    }
    let rows = u32::from_le_bytes(read_array(&bytes, &mut cursor, path)?) as usize;
    let cols = u32::from_le_bytes(read_array(&bytes, &mut cursor, path)?) as usize;
    let episode_reward = f64::from_le_bytes(read_array(&bytes, &mut cursor, path)?);
    let raw_len = u32::from_le_bytes(read_array(&bytes, &mut cursor, path)?) as usize;
    let payload_len = u32::from_le_bytes(read_array(&bytes, &mut cursor, path)?) as usize;
    let expected_hash = read_exact(&bytes, &mut cursor, HASH_LEN, path)?;
    let payload = read_exact(&bytes, &mut cursor, payload_len, path)?;
    if cursor != bytes.len() {
        return Err(invalid_format(path, "unexpected trailing bytes"));
    }
    if expected_hash != sha256_bytes(payload) {
        return Err(invalid_format(path, "payload hash mismatch"));
    }

    let expected_raw_len = rows
        .checked_mul(cols)
        .and_then(|count| count.checked_mul(4));
    if expected_raw_len != Some(raw_len) {
        return Err(invalid_format(path, "payload length does not match shape"));
    }
    let raw = lz4_flex::block::decompress(payload, raw_len)
        .map_err(|error| invalid_format(path, &format!("payload decompression failed: {error}")))?;
    if raw.len() != raw_len {
        return Err(invalid_format(path, "decompressed payload has wrong length"));
    }

    let values = raw
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(TraceArchive {
        format_version,
        rows,
        cols,
        episode_reward,
        values,
    })
}

fn read_exact<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
    path: &Path,
) -> Result<&'a [u8], TraceError> {
    let end = cursor
        .checked_add(len)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| invalid_format(path, "unexpected end of file"))?;
    let slice = &bytes[*cursor..end];
    *cursor = end;
    Ok(slice)
}

fn read_array<const N: usize>(
    bytes: &[u8],
    cursor: &mut usize,
    path: &Path,
) -> Result<[u8; N], TraceError> {
    let slice = read_exact(bytes, cursor, N, path)?;
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    Ok(out)
}

fn sha256_bytes(bytes: &[u8]) -> [u8; HASH_LEN] {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&digest);
    out
}

fn invalid_format(path: &Path, message: &str) -> TraceError {
    TraceError::InvalidFormat {
        path: PathBuf::from(path),
        message: message.to_string(),
    }
}
