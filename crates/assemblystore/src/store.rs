//! Parses a whole AssemblyStore container file: §4.5.

use assemblystore_core::prelude::*;

use crate::error::{Error, Result};
use crate::header::{AssemblyDescriptor, Hash32Entry, Hash64Entry, StoreHeader};

/// A parsed AssemblyStore: the owned raw bytes plus the descriptor (and, for the primary store,
/// hash table) records that point into them.
pub struct AssemblyStoreFile {
    data: Vec<u8>,
    pub header: StoreHeader,
    pub descriptors: Vec<AssemblyDescriptor>,
    pub hash32_entries: Vec<Hash32Entry>,
    pub hash64_entries: Vec<Hash64Entry>,
}

impl AssemblyStoreFile {
    /// Parses `data` as an AssemblyStore file.
    ///
    /// `is_primary` controls whether the two global hash tables (present only in the primary
    /// store) are read after the descriptor table.
    ///
    /// # Errors
    /// Returns [`Error::NotAnAssemblyStore`] on magic mismatch (the caller should fall back to
    /// [`crate::recovery`]), or [`Error::UnsupportedVersion`]/[`Error::Malformed`] for a parseable
    /// but invalid or truncated container.
    pub fn parse(data: Vec<u8>, is_primary: bool) -> Result<Self> {
        let mut reader = ByteReader::new(&data);
        let header = StoreHeader::read(&mut reader)?;

        let mut descriptors = Vec::with_capacity(header.local_entry_count as usize);
        for _ in 0..header.local_entry_count {
            descriptors.push(AssemblyDescriptor::read(&mut reader)?);
        }

        let mut hash32_entries = Vec::new();
        let mut hash64_entries = Vec::new();
        if is_primary {
            hash32_entries.reserve(header.local_entry_count as usize);
            for _ in 0..header.local_entry_count {
                hash32_entries.push(Hash32Entry::read(&mut reader)?);
            }
            hash64_entries.reserve(header.local_entry_count as usize);
            for _ in 0..header.local_entry_count {
                hash64_entries.push(Hash64Entry::read(&mut reader)?);
            }
        }

        Ok(Self { data, header, descriptors, hash32_entries, hash64_entries })
    }

    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn file_length(&self) -> usize {
        self.data.len()
    }

    /// Slices a descriptor's `data` region, per the descriptor-bounds invariant (§3/§8).
    ///
    /// # Errors
    /// Returns [`Error::OutOfBoundsDescriptor`] if the region does not fit in the store file.
    pub fn slice_data<'a>(&'a self, descriptor: &AssemblyDescriptor) -> Result<&'a [u8]> {
        if !descriptor.in_bounds(self.file_length()) {
            return Err(Error::OutOfBoundsDescriptor);
        }
        let start = descriptor.data_offset as usize;
        let end = start + descriptor.data_size as usize;
        Ok(&self.data[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::STORE_MAGIC;

    fn build_store(descriptors: &[(u32, u32)], primary: bool) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&STORE_MAGIC);
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&(descriptors.len() as u32).to_le_bytes());
        data.extend_from_slice(&(descriptors.len() as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // store_id

        for &(offset, size) in descriptors {
            data.extend_from_slice(&offset.to_le_bytes());
            data.extend_from_slice(&size.to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes()); // debug_offset
            data.extend_from_slice(&0u32.to_le_bytes()); // debug_size
            data.extend_from_slice(&0u32.to_le_bytes()); // config_offset
            data.extend_from_slice(&0u32.to_le_bytes()); // config_size
        }

        if primary {
            for i in 0..descriptors.len() {
                data.extend_from_slice(&(i as u32).to_le_bytes()); // hash
                data.extend_from_slice(&0u32.to_le_bytes()); // reserved
                data.extend_from_slice(&0u32.to_le_bytes()); // mapping_index
                data.extend_from_slice(&0u32.to_le_bytes()); // local_store_index
                data.extend_from_slice(&0u32.to_le_bytes()); // store_id
            }
            for i in 0..descriptors.len() {
                data.extend_from_slice(&(i as u64).to_le_bytes()); // hash
                data.extend_from_slice(&0u32.to_le_bytes()); // mapping_index
                data.extend_from_slice(&0u32.to_le_bytes()); // local_store_index
                data.extend_from_slice(&0u32.to_le_bytes()); // store_id
            }
        }

        data
    }

    #[test]
    fn parses_descriptors_and_hash_tables_for_primary_store() {
        let mut data = build_store(&[(64, 4)], true);
        data.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        let store = AssemblyStoreFile::parse(data, true).unwrap();
        assert_eq!(store.descriptors.len(), 1);
        assert_eq!(store.hash32_entries.len(), 1);
        assert_eq!(store.hash64_entries.len(), 1);
    }

    #[test]
    fn secondary_store_omits_hash_tables() {
        let mut data = build_store(&[(64, 4)], false);
        data.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        let store = AssemblyStoreFile::parse(data, false).unwrap();
        assert_eq!(store.descriptors.len(), 1);
        assert!(store.hash32_entries.is_empty());
        assert!(store.hash64_entries.is_empty());
    }

    #[test]
    fn truncated_hash_table_is_malformed_not_silently_accepted() {
        // Primary store claims hash tables but the bytes end right after the descriptor table.
        let data = build_store(&[(64, 4)], false);
        assert!(matches!(AssemblyStoreFile::parse(data, true), Err(Error::Malformed { .. })));
    }

    #[test]
    fn rejects_wrong_magic_as_not_an_assembly_store() {
        let data = vec![b'Z'; 32];
        assert!(matches!(AssemblyStoreFile::parse(data, true), Err(Error::NotAnAssemblyStore)));
    }

    #[test]
    fn slice_data_rejects_out_of_bounds_descriptor() {
        let mut data = build_store(&[(100, 1_000_000_000)], false);
        data.extend_from_slice(&[0u8; 16]);
        let store = AssemblyStoreFile::parse(data, false).unwrap();
        assert!(matches!(store.slice_data(&store.descriptors[0]), Err(Error::OutOfBoundsDescriptor)));
    }
}
