//! Block decompression handling.

use flate2::read::ZlibDecoder;
use std::io::Read;
use tracing::instrument;

use crate::error::DecompressionError;

/// Compression level marking a block or entry as stored without compression.
/// Any other level means a zlib stream.
pub const STORED: u32 = 0;

/// Inflate one block to exactly `inflated_size` bytes.
///
/// A stored block is returned unchanged after its length is checked against
/// `inflated_size`. A compressed block is run through a zlib decoder that must
/// be able to fill the expected length.
#[instrument(skip(src), err)]
pub fn inflate(
    src: &[u8],
    compression_level: u32,
    inflated_size: usize,
) -> Result<Vec<u8>, DecompressionError> {
    if compression_level == STORED {
        if src.len() != inflated_size {
            return Err(DecompressionError::SizeMismatch {
                expected: inflated_size,
                actual: src.len(),
            });
        }
        return Ok(src.to_vec());
    }

    let mut inflated = vec![0u8; inflated_size];
    ZlibDecoder::new(src)
        .read_exact(&mut inflated)
        .map_err(DecompressionError::CorruptStream)?;
    Ok(inflated)
}
