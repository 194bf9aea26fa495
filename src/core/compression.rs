//! Optional gzip compression applied to payloads before encryption.
//!
//! Compressed payloads are recognised on decrypt by the gzip magic bytes,
//! so nothing in the container header records whether compression was used.

use std::io::{Cursor, Write};

use deflate::write::GzEncoder;
use deflate::CompressionOptions;
use inflate::InflateWriter;

use crate::errors::{NokvaultError, Result};

/// First two bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Payloads smaller than this are never compressed.
pub const DEFAULT_MIN_COMPRESS_SIZE: usize = 1024;

/// Whether `data` starts with the gzip magic bytes.
pub fn looks_compressed(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Compress only payloads that are large enough and not already gzip.
pub fn should_compress(data: &[u8], min_size: usize) -> bool {
    data.len() >= min_size && !looks_compressed(data)
}

/// Compress `data` into a single gzip member.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), CompressionOptions::high());
    encoder
        .write_all(data)
        .map_err(|e| NokvaultError::CompressionFailed(format!("failed to write compressed data: {e}")))?;
    encoder
        .finish()
        .map_err(|e| NokvaultError::CompressionFailed(format!("failed to close compressor: {e}")))
}

/// Decompress a single gzip member, verifying its CRC-32 and length trailer.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let body_start = gzip_header_len(data)?;
    if data.len() < body_start + 8 {
        return Err(NokvaultError::CompressionFailed(
            "gzip stream truncated".into(),
        ));
    }
    let trailer_start = data.len() - 8;

    let mut inflater = InflateWriter::new(Vec::new());
    inflater
        .write_all(&data[body_start..trailer_start])
        .map_err(|e| NokvaultError::CompressionFailed(format!("failed to decompress data: {e}")))?;
    let output = inflater
        .finish()
        .map_err(|e| NokvaultError::CompressionFailed(format!("failed to decompress data: {e}")))?;

    let trailer = &data[trailer_start..];
    let expected_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let expected_len = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);

    // ISIZE is the input length modulo 2^32.
    if expected_len != output.len() as u32 {
        return Err(NokvaultError::CompressionFailed(
            "gzip length trailer mismatch".into(),
        ));
    }
    if expected_crc != crc32fast::hash(&output) {
        return Err(NokvaultError::CompressionFailed(
            "gzip CRC-32 mismatch".into(),
        ));
    }

    Ok(output)
}

/// Length of the gzip member header (RFC 1952 §2.3), including optional fields.
fn gzip_header_len(data: &[u8]) -> Result<usize> {
    let mut cursor = Cursor::new(data);
    gzip_header::read_gz_header(&mut cursor)
        .map_err(|e| NokvaultError::CompressionFailed(format!("invalid gzip header: {e}")))?;
    usize::try_from(cursor.position())
        .map_err(|_| NokvaultError::CompressionFailed("gzip header too large".into()))
}
