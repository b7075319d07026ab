//! Error conditions shared by [`crate::reader::ByteReader`] and anything built on top of it.

use snafu::prelude::*;

/// Thrown when a [`ByteReader`](crate::reader::ByteReader) operation can't be satisfied by the
/// remaining bytes.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// A fixed-width read or bounded borrow ran past the end of the underlying slice.
    #[snafu(display("short read at position {position}, wanted {wanted} bytes"))]
    ShortRead { position: usize, wanted: usize },
}

pub type Result<T> = core::result::Result<T, Error>;
