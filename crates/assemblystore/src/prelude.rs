//! Convenient re-exports of commonly used data types.
//!
//! ```
//! use assemblystore::prelude::*;
//! ```

pub use crate::error::Error;
pub use crate::header::{AssemblyDescriptor, Hash32Entry, Hash64Entry, StoreHeader};
pub use crate::manifest::{Manifest, ManifestEntry};
pub use crate::orchestrator::Outcome;
pub use crate::store::AssemblyStoreFile;
