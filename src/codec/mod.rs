//! Block codec used for data entry payloads.
//!
//! # Wire shape
//! Payloads are stored as raw LZ4 *blocks*: no frame header, no checksum and
//! no length prefix.  The decompressed length is not recoverable from the
//! block alone, so [`Codec::decompress`] takes it as a capacity hint.  Every
//! data entry carries that value in its `original_size` field.
//!
//! A decoder that produces a different number of bytes than the hint MUST
//! fail with [`CodecError::SizeMismatch`]; the entry is treated as corrupt.

use thiserror::Error;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Compression error: {0}")]
    Compression(String),
    #[error("Decompression error: {0}")]
    Decompression(String),
    #[error("Decompressed size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

// ── Codec trait ──────────────────────────────────────────────────────────────

pub trait Codec: Send + Sync {
    /// Human-readable name (diagnostics only).
    fn name(&self) -> &'static str;
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;
    /// Decode `data`, which must expand to exactly `original_size` bytes.
    fn decompress(&self, data: &[u8], original_size: usize) -> Result<Vec<u8>, CodecError>;
}

// ── Built-in codec ───────────────────────────────────────────────────────────

/// Raw LZ4 block codec (`XALZ` payloads).
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4BlockCodec;

impl Codec for Lz4BlockCodec {
    fn name(&self) -> &'static str { "lz4-block" }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(lz4_flex::block::compress(data))
    }

    fn decompress(&self, data: &[u8], original_size: usize) -> Result<Vec<u8>, CodecError> {
        let out = lz4_flex::block::decompress(data, original_size)
            .map_err(|e| CodecError::Decompression(e.to_string()))?;
        if out.len() != original_size {
            return Err(CodecError::SizeMismatch { expected: original_size, actual: out.len() });
        }
        Ok(out)
    }
}
