//! Drives a single store's descriptors to files on disk: §4.6.
//!
//! This is the sole writer in the crate; [`crate::pe`], [`crate::lz4`], and [`crate::recovery`]
//! are all pure functions over byte slices. The orchestrator's job is gluing manifest lookups,
//! decompression, validation, and path construction together in the order §4.6/§5 prescribe.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::header::AssemblyDescriptor;
use crate::lz4;
use crate::manifest::Manifest;
use crate::pe;
use crate::recovery;
use crate::store::AssemblyStoreFile;

/// One emitted (or attempted) output, for the caller's summary/log lines.
#[derive(Debug)]
pub enum Outcome {
    Written { path: PathBuf },
    WrittenInvalid { path: PathBuf },
    Skipped { error: Error },
}

/// Walks every descriptor in `store` in ascending local index, in accordance with §5's ordering
/// contract, writing each to `<output_root>/<store_basename>/...`.
pub fn extract_store(
    store: &AssemblyStoreFile,
    store_basename: &str,
    manifest: &Manifest,
    output_root: &Path,
) -> Vec<Outcome> {
    let store_dir = output_root.join(store_basename);
    let mut outcomes = Vec::with_capacity(store.descriptors.len());

    for (index, descriptor) in store.descriptors.iter().enumerate() {
        let index = index as u32;
        outcomes.push(extract_one(store, descriptor, index, manifest, &store_dir));
    }

    outcomes
}

fn extract_one(
    store: &AssemblyStoreFile,
    descriptor: &AssemblyDescriptor,
    index: u32,
    manifest: &Manifest,
    store_dir: &Path,
) -> Outcome {
    let Some(entry) = manifest.get(store.header.store_id, index) else {
        let error = Error::ManifestMissingEntry { store_id: store.header.store_id, index };
        log::warn!("{error}");
        return Outcome::Skipped { error };
    };

    let slice = match store.slice_data(descriptor) {
        Ok(slice) => slice,
        Err(error) => {
            log::error!("descriptor {index} ({}) out of bounds: {error}", entry.name);
            return Outcome::Skipped { error };
        }
    };

    let payload = if lz4::is_lz4_envelope(slice) {
        match lz4::decompress(slice, lz4::DEFAULT_MAX_UNCOMPRESSED_SIZE) {
            Ok(decompressed) => decompressed,
            Err(error) => {
                log::error!("descriptor {index} ({}) failed to decompress: {error}", entry.name);
                return Outcome::Skipped { error };
            }
        }
    } else {
        slice.to_vec()
    };

    let (bytes, is_valid) = if pe::is_valid_assembly(&payload) {
        (payload, true)
    } else {
        match pe::repair(&payload) {
            Some(repaired) => (repaired, true),
            None => {
                log::warn!("{} ({}): {}", index, entry.name, Error::ValidationFailure);
                (payload, false)
            }
        }
    };

    let output_name = dll_output_name(&entry.name);
    let destination = if is_valid { store_dir.join(&output_name) } else { store_dir.join("invalid").join(&output_name) };

    match write_file(&destination, &bytes) {
        Ok(()) if is_valid => Outcome::Written { path: destination },
        Ok(()) => Outcome::WrittenInvalid { path: destination },
        Err(source) => {
            log::error!("failed to write {}: {source}", destination.display());
            Outcome::Skipped { error: Error::Io { source } }
        }
    }
}

/// Runs the recovery ladder against `data` (a whole input file that the canonical parser
/// rejected) and writes every salvaged assembly as `<store_dir>/<basename>_assembly_NNN.dll`,
/// per §4.7's naming/ordering contract.
pub fn extract_via_recovery(
    data: &[u8],
    manifest: Option<&Manifest>,
    blob_id: u32,
    store_basename: &str,
    output_root: &Path,
) -> Vec<Outcome> {
    let store_dir = output_root.join(store_basename);
    let salvaged = recovery::recover(data, manifest, blob_id);

    salvaged
        .into_iter()
        .enumerate()
        .map(|(index, bytes)| {
            let name = format!("{store_basename}_assembly_{index:03}.dll");
            let destination = store_dir.join(name);
            match write_file(&destination, &bytes) {
                Ok(()) => Outcome::Written { path: destination },
                Err(source) => {
                    log::error!("failed to write recovered assembly {index}: {source}");
                    Outcome::Skipped { error: Error::Io { source } }
                }
            }
        })
        .collect()
}

/// Appends `.dll` unless `name` already carries a case-insensitive `.dll` suffix (§4.6 step 5).
fn dll_output_name(name: &str) -> PathBuf {
    let has_dll_suffix = name.len() >= 4 && name[name.len() - 4..].eq_ignore_ascii_case(".dll");
    if has_dll_suffix {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{name}.dll"))
    }
}

fn write_file(destination: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(destination, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::STORE_MAGIC;

    fn minimal_valid_pe() -> Vec<u8> {
        let mut data = vec![0u8; 256];
        data[0..2].copy_from_slice(b"MZ");
        data[0x3C..0x3C + 4].copy_from_slice(&128u32.to_le_bytes());
        data[128..130].copy_from_slice(b"PE");
        data
    }

    fn build_store(payloads: &[&[u8]]) -> Vec<u8> {
        let header_len = 20;
        let descriptor_table_len = payloads.len() * 24;
        let mut offset = header_len + descriptor_table_len;
        let mut descriptors = Vec::new();
        for payload in payloads {
            descriptors.push((offset as u32, payload.len() as u32));
            offset += payload.len();
        }

        let mut data = Vec::new();
        data.extend_from_slice(&STORE_MAGIC);
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&(payloads.len() as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // store_id

        for (data_offset, data_size) in &descriptors {
            data.extend_from_slice(&data_offset.to_le_bytes());
            data.extend_from_slice(&data_size.to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes());
        }

        for payload in payloads {
            data.extend_from_slice(payload);
        }

        data
    }

    #[test]
    fn writes_single_valid_assembly_byte_for_byte() {
        let payload = minimal_valid_pe();
        let data = build_store(&[&payload]);
        let store = AssemblyStoreFile::parse(data, false).unwrap();

        let manifest = Manifest::parse("Hash32 Hash64 BlobId BlobIdx Name\nabc def 0 0 Hello\n");
        let dir = tempdir();
        let outcomes = extract_store(&store, "assemblies", &manifest, dir.path());

        assert_eq!(outcomes.len(), 1);
        let expected_path = dir.path().join("assemblies").join("Hello.dll");
        assert_eq!(fs::read(&expected_path).unwrap(), payload);
        assert!(!dir.path().join("assemblies").join("invalid").exists());
    }

    #[test]
    fn name_with_directory_separator_creates_subdirectory() {
        let payload = minimal_valid_pe();
        let data = build_store(&[&payload]);
        let store = AssemblyStoreFile::parse(data, false).unwrap();

        let manifest = Manifest::parse("abc def 0 0 ar/Foo.resources\n");
        let dir = tempdir();
        extract_store(&store, "assemblies", &manifest, dir.path());

        let expected_path = dir.path().join("assemblies").join("ar").join("Foo.resources.dll");
        assert_eq!(fs::read(&expected_path).unwrap(), payload);
    }

    #[test]
    fn missing_manifest_entry_is_skipped_without_writing() {
        let payload = minimal_valid_pe();
        let data = build_store(&[&payload]);
        let store = AssemblyStoreFile::parse(data, false).unwrap();

        let manifest = Manifest::default();
        let dir = tempdir();
        let outcomes = extract_store(&store, "assemblies", &manifest, dir.path());

        assert!(matches!(outcomes[0], Outcome::Skipped { .. }));
        assert!(!dir.path().join("assemblies").exists());
    }

    #[test]
    fn invalid_assembly_lands_under_invalid_subdirectory() {
        let junk = vec![0u8; 64]; // too short to ever validate or repair
        let data = build_store(&[&junk]);
        let store = AssemblyStoreFile::parse(data, false).unwrap();

        let manifest = Manifest::parse("abc def 0 0 Bad\n");
        let dir = tempdir();
        extract_store(&store, "assemblies", &manifest, dir.path());

        let invalid_path = dir.path().join("assemblies").join("invalid").join("Bad.dll");
        assert!(invalid_path.exists());
    }

    #[test]
    fn recovery_output_is_numbered_in_increasing_order() {
        let first = minimal_valid_pe();
        let second = minimal_valid_pe();
        let mut raw = Vec::new();
        raw.extend_from_slice(b"ZZZZ");
        raw.extend_from_slice(&first);
        raw.extend_from_slice(&[0u8; 64]);
        raw.extend_from_slice(&second);

        let dir = tempdir();
        let outcomes = extract_via_recovery(&raw, None, 0, "assemblies", dir.path());
        assert_eq!(outcomes.len(), 2);

        assert!(dir.path().join("assemblies").join("assemblies_assembly_000.dll").exists());
        assert!(dir.path().join("assemblies").join("assemblies_assembly_001.dll").exists());
    }

    /// Hand-rolled temp directory: avoids pulling in a dev-dependency purely for this.
    struct TempDir(PathBuf);
    impl TempDir {
        fn path(&self) -> &Path {
            &self.0
        }
    }
    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }
    fn tempdir() -> TempDir {
        let mut dir = std::env::temp_dir();
        let unique = format!("assemblystore-test-{}-{}", std::process::id(), ORCHESTRATOR_TEST_COUNTER.next());
        dir.push(unique);
        fs::create_dir_all(&dir).unwrap();
        TempDir(dir)
    }

    struct Counter(std::sync::atomic::AtomicU64);
    impl Counter {
        fn next(&self) -> u64 {
            self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
        }
    }
    static ORCHESTRATOR_TEST_COUNTER: Counter = Counter(std::sync::atomic::AtomicU64::new(0));
}
