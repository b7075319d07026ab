//! Shared utilities used across the `assemblystore-extract` workspace.
//!
//! This crate holds the pieces that have nothing to do with the AssemblyStore
//! format itself: a little-endian byte cursor ([`reader::ByteReader`]), the
//! timestamp helper used to name the per-run conversion log, and a small
//! human-readable size formatter used in log lines.

pub mod error;
pub mod prelude;
pub mod reader;
pub mod time;
pub mod util;
