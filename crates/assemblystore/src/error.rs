//! Error conditions for the AssemblyStore decoder, per §7 of the format notes.
//!
//! Each variant here is recovered at the granularity §7 prescribes: a [`NotAnAssemblyStore`] sends
//! the caller to [`crate::recovery`], everything else is fatal for the current store or descriptor
//! but never propagates past the orchestrator.
//!
//! [`NotAnAssemblyStore`]: Error::NotAnAssemblyStore

use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Magic mismatch at the start of a store file. Recoverable: the caller falls back to the
    /// recovery scanner.
    #[snafu(display("not an AssemblyStore"))]
    NotAnAssemblyStore,

    /// Header version exceeds the supported maximum. Fatal for this store.
    #[snafu(display("unsupported store version {version}"))]
    UnsupportedVersion { version: u32 },

    /// A short read during header/descriptor/hash-table parsing. Fatal for this store.
    #[snafu(display("malformed store: {source}"))]
    Malformed { source: assemblystore_core::error::Error },

    /// A descriptor's data region extends past the end of the store file. Fatal for that
    /// descriptor; other descriptors continue.
    #[snafu(display("descriptor data region out of bounds"))]
    OutOfBoundsDescriptor,

    /// The LZ4 envelope was too short, declared a size over the configured ceiling, or decoded to
    /// a length different from what it declared. Fatal for that descriptor.
    #[snafu(display("decompression failed: {reason}"))]
    DecompressionFailure { reason: &'static str },

    /// Output bytes failed PE/CLI validation even after the repair pass. Not fatal: the orchestrator
    /// emits the bytes under `invalid/` instead of dropping them.
    #[snafu(display("validation failed after repair"))]
    ValidationFailure,

    /// A store descriptor has no matching manifest row. Logged as a warning; the descriptor is
    /// skipped.
    #[snafu(display("no manifest entry for store {store_id}, index {index}"))]
    ManifestMissingEntry { store_id: u32, index: u32 },

    /// An underlying filesystem read/write failed. Fatal for the current unit of work.
    #[snafu(display("I/O failure: {source}"))]
    Io { source: std::io::Error },
}

impl From<assemblystore_core::error::Error> for Error {
    fn from(source: assemblystore_core::error::Error) -> Self {
        Self::Malformed { source }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
