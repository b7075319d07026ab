//! Convenient re-exports of commonly used types, designed to make crate usage painless.
//!
//! ```
//! use assemblystore_core::prelude::*;
//! ```

#[doc(inline)]
pub use crate::reader::{u32_le_at, ByteReader};

/// Contains [`error::Error`], which is used in [`Result`](error::Result)s returned by
/// [`ByteReader`].
pub mod error {
    pub use crate::error::{Error, Result};
}

pub mod time {
    pub use crate::time::*;
}

pub mod util {
    pub use crate::util::format_size;
}
