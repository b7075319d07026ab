//! Unwraps the toolkit's `XALZ` compression envelope: §4.2 of the format notes.
//!
//! The envelope is a fixed 12-byte header (magic, an ignored descriptor index, and the declared
//! uncompressed size) followed by a single raw LZ4 block — not a framed LZ4 stream, so this reaches
//! straight for [`lz4_flex::block::decompress`] rather than the frame API.

use crate::error::{DecompressionFailureSnafu, Error};
use assemblystore_core::reader::u32_le_at;
use snafu::prelude::*;

/// Magic bytes marking an assembly payload as LZ4-wrapped.
pub const MAGIC: [u8; 4] = *b"XALZ";
/// Default ceiling on the declared uncompressed size, matching §4.2.
pub const DEFAULT_MAX_UNCOMPRESSED_SIZE: usize = 64 * 1024 * 1024;

/// Returns `true` if `data` begins with the `XALZ` magic.
#[must_use]
pub fn is_lz4_envelope(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == MAGIC
}

/// Decompresses an `XALZ`-wrapped payload, returning exactly the declared uncompressed size.
///
/// # Errors
/// Returns [`Error::DecompressionFailure`] if the envelope is shorter than 12 bytes, the declared
/// size exceeds `max_uncompressed_size`, or the LZ4 block decodes to a different length than it
/// declared.
pub fn decompress(data: &[u8], max_uncompressed_size: usize) -> Result<Vec<u8>, Error> {
    ensure!(data.len() >= 12, DecompressionFailureSnafu { reason: "envelope shorter than 12 bytes" });
    ensure!(data[..4] == MAGIC, DecompressionFailureSnafu { reason: "missing XALZ magic" });

    // bytes 4..8 are a descriptor index, intentionally unused by the core.
    let declared_size = u32_le_at(data, 8).expect("bounds checked above") as usize;
    ensure!(
        declared_size <= max_uncompressed_size,
        DecompressionFailureSnafu { reason: "declared size exceeds configured ceiling" }
    );

    let block = &data[12..];
    let output = lz4_flex::block::decompress(block, declared_size)
        .map_err(|_| Error::DecompressionFailure { reason: "LZ4 block decode failed" })?;
    ensure!(
        output.len() == declared_size,
        DecompressionFailureSnafu { reason: "decoded length did not match declared size" }
    );

    Ok(output)
}
