use serde::Serialize;

use crate::codec::{self, CodecAdapter, DEFAULT_READ_CHUNK, DEFAULT_WRITE_CHUNK};
use crate::config::{CodecKind, Direction};
use crate::error::{Check, CodecError, VerificationFailure};

/// Outcome of one compress-then-decompress pass. Never mutated once built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub length_match: bool,
    pub bytes_match: bool,
    /// Both buffers decode to the same text, invalid UTF-8 replaced by U+FFFD.
    pub text_match: bool,
    pub original_len: usize,
    pub compressed_len: usize,
    pub recovered_len: usize,
    pub first_mismatch: Option<usize>,
}

impl VerificationResult {
    pub fn compare(original: &[u8], compressed_len: usize, recovered: &[u8]) -> Self {
        let length_match = original.len() == recovered.len();
        let first_mismatch = original
            .iter()
            .zip(recovered)
            .position(|(a, b)| a != b)
            .or_else(|| (!length_match).then(|| original.len().min(recovered.len())));
        let text_match = String::from_utf8_lossy(original) == String::from_utf8_lossy(recovered);
        Self {
            length_match,
            bytes_match: first_mismatch.is_none(),
            text_match,
            original_len: original.len(),
            compressed_len,
            recovered_len: recovered.len(),
            first_mismatch,
        }
    }

    /// Length and bytes agree. The text comparison is advisory and not part of this.
    pub fn is_ok(&self) -> bool {
        self.length_match && self.bytes_match
    }

    /// Promote a mismatch into a failure naming the codec, level and comparison.
    pub fn check(&self, codec: CodecKind, level: u32) -> Result<(), VerificationFailure> {
        let check = if !self.length_match {
            Check::Length
        } else if !self.bytes_match {
            Check::Bytes
        } else {
            return Ok(());
        };
        Err(VerificationFailure {
            codec,
            level,
            check,
            original_len: self.original_len,
            recovered_len: self.recovered_len,
            first_mismatch: self.first_mismatch,
        })
    }
}

/// Round-trip `original` through `adapter` at `level` and compare.
///
/// Backend failures come back as `Err`; a mismatch is an `Ok` result whose
/// [`is_ok`](VerificationResult::is_ok) is false.
pub fn verify(adapter: &dyn CodecAdapter, original: &[u8], level: u32) -> Result<VerificationResult, CodecError> {
    verify_with(adapter, original, level, DEFAULT_READ_CHUNK, DEFAULT_WRITE_CHUNK)
}

/// Like [`verify`], with explicit read and write chunk sizes for the two streams.
pub fn verify_with(
    adapter: &dyn CodecAdapter,
    original: &[u8],
    level: u32,
    read_chunk: usize,
    write_chunk: usize,
) -> Result<VerificationResult, CodecError> {
    let kind = adapter.kind();
    let compressed = codec::compress_with(adapter, original, level, write_chunk)
        .map_err(|e| CodecError::new(kind, level, Direction::Compress, e))?;
    let recovered = codec::decompress_with(adapter, &compressed, read_chunk, original.len())
        .map_err(|e| CodecError::new(kind, level, Direction::Decompress, e))?;

    let result = VerificationResult::compare(original, compressed.len(), &recovered);
    if !result.is_ok() {
        tracing::warn!(
            codec = %kind,
            level,
            length_match = result.length_match,
            first_mismatch = ?result.first_mismatch,
            "round-trip mismatch"
        );
    } else if !result.text_match {
        tracing::warn!(codec = %kind, level, "bytes match but text comparison disagrees");
    }
    Ok(result)
}
