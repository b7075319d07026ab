//! The fixed-layout records that make up an AssemblyStore container: §3 of the format notes.
//!
//! Every type here is a plain data holder read out of the raw store bytes by [`crate::store`]; none
//! of them borrow the bytes they came from, so descriptors can outlive the [`ByteReader`] used to
//! parse them.

use assemblystore_core::prelude::*;

/// Magic bytes at the start of every AssemblyStore container.
pub const STORE_MAGIC: [u8; 4] = *b"XABA";
/// Highest store format version this parser understands.
pub const MAX_SUPPORTED_VERSION: u32 = 1;

/// The 20-byte fixed header at offset 0 of a store file.
#[derive(Debug, Clone, Copy)]
pub struct StoreHeader {
    pub version: u32,
    pub local_entry_count: u32,
    pub global_entry_count: u32,
    pub store_id: u32,
}

impl StoreHeader {
    pub const SIZE: usize = 20;

    /// Reads and validates the header's magic/version. Does not validate the entry counts against
    /// the file length; callers parse the descriptor table before asserting that invariant.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, crate::error::Error> {
        let magic = reader.read_slice(4).map_err(|_| crate::error::Error::NotAnAssemblyStore)?;
        if magic != STORE_MAGIC {
            return Err(crate::error::Error::NotAnAssemblyStore);
        }

        let version = reader.read_u32()?;
        if version > MAX_SUPPORTED_VERSION {
            return Err(crate::error::Error::UnsupportedVersion { version });
        }

        let local_entry_count = reader.read_u32()?;
        let global_entry_count = reader.read_u32()?;
        let store_id = reader.read_u32()?;

        Ok(Self { version, local_entry_count, global_entry_count, store_id })
    }
}

/// One 24-byte descriptor locating an assembly's data/debug/config regions within its store.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblyDescriptor {
    pub data_offset: u32,
    pub data_size: u32,
    pub debug_offset: u32,
    pub debug_size: u32,
    pub config_offset: u32,
    pub config_size: u32,
}

impl AssemblyDescriptor {
    pub const SIZE: usize = 24;

    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, crate::error::Error> {
        Ok(Self {
            data_offset: reader.read_u32()?,
            data_size: reader.read_u32()?,
            debug_offset: reader.read_u32()?,
            debug_size: reader.read_u32()?,
            config_offset: reader.read_u32()?,
            config_size: reader.read_u32()?,
        })
    }

    /// True iff `[offset, offset+size)` falls within a file of `file_length` bytes. A zero-sized
    /// region (`offset == 0 && size == 0`) is always in bounds since it is never sliced.
    fn region_in_bounds(offset: u32, size: u32, file_length: usize) -> bool {
        if offset == 0 && size == 0 {
            return true;
        }
        match (offset as usize).checked_add(size as usize) {
            Some(end) => end <= file_length,
            None => false,
        }
    }

    /// Checks the descriptor-bounds invariant from §3/§8: every nonzero data/debug/config region
    /// must end within the file.
    #[must_use]
    pub fn in_bounds(&self, file_length: usize) -> bool {
        Self::region_in_bounds(self.data_offset, self.data_size, file_length)
            && Self::region_in_bounds(self.debug_offset, self.debug_size, file_length)
            && Self::region_in_bounds(self.config_offset, self.config_size, file_length)
    }
}

/// A 20-byte Hash32 table entry, present only in the primary store.
#[derive(Debug, Clone, Copy)]
pub struct Hash32Entry {
    pub hash: u32,
    pub mapping_index: u32,
    pub local_store_index: u32,
    pub store_id: u32,
}

impl Hash32Entry {
    pub const SIZE: usize = 20;

    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, crate::error::Error> {
        let hash = reader.read_u32()?;
        let _reserved = reader.read_u32()?;
        let mapping_index = reader.read_u32()?;
        let local_store_index = reader.read_u32()?;
        let store_id = reader.read_u32()?;
        Ok(Self { hash, mapping_index, local_store_index, store_id })
    }
}

/// A 24-byte Hash64 table entry, present only in the primary store.
#[derive(Debug, Clone, Copy)]
pub struct Hash64Entry {
    pub hash: u64,
    pub mapping_index: u32,
    pub local_store_index: u32,
    pub store_id: u32,
}

impl Hash64Entry {
    pub const SIZE: usize = 24;

    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, crate::error::Error> {
        let hash = reader.read_u64()?;
        let mapping_index = reader.read_u32()?;
        let local_store_index = reader.read_u32()?;
        let store_id = reader.read_u32()?;
        Ok(Self { hash, mapping_index, local_store_index, store_id })
    }
}
