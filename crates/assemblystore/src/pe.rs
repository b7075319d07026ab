//! Structural PE/CLI validation and repair: §4.3 of the format notes.
//!
//! This never loads or executes a candidate assembly — every check here is a byte-offset
//! inspection, per the design notes' explicit call to validate "strictly by byte inspection".

use assemblystore_core::reader::u32_le_at;

const MZ: [u8; 2] = *b"MZ";
const PE: [u8; 2] = *b"PE";
const CLI_METADATA_MAGIC: &[u8] = b"BSJB";
const PE_OFFSET_FIELD: usize = 0x3C;
const CLI_HEADER_RVA_OFFSET: usize = 232;
const CLI_HEADER_SIZE_OFFSET: usize = 236;
const MIN_LENGTH: usize = 128;

/// Locates the `pe_offset` field, if `data` has an `MZ` stub and a PE offset that fits.
fn pe_offset(data: &[u8]) -> Option<usize> {
    if data.len() < MIN_LENGTH || data[0..2] != MZ {
        return None;
    }
    let pe_offset = u32_le_at(data, PE_OFFSET_FIELD)? as usize;
    if pe_offset > data.len().saturating_sub(4) {
        return None;
    }
    Some(pe_offset)
}

/// Returns `true` iff `data` passes checks 1-4 of §4.3 (DOS stub, PE signature), without requiring
/// a populated CLI runtime header directory entry. Used only to build the weak-path check below;
/// never sufficient on its own for canonical acceptance.
fn has_pe_signature(data: &[u8]) -> bool {
    match pe_offset(data) {
        Some(offset) => data[offset..offset + 2] == PE,
        None => false,
    }
}

/// The canonical validation path (§4.3, checks 1-5): the only path that may accept output from the
/// extraction orchestrator's normal run.
#[must_use]
pub fn is_valid_assembly(data: &[u8]) -> bool {
    let Some(offset) = pe_offset(data) else { return false };
    if data[offset..offset + 2] != PE {
        return false;
    }

    if offset + 248 <= data.len() {
        let rva = u32_le_at(data, offset + CLI_HEADER_RVA_OFFSET).unwrap_or(0);
        let size = u32_le_at(data, offset + CLI_HEADER_SIZE_OFFSET).unwrap_or(0);
        rva > 0 && size > 0
    } else {
        // Too short to carry a CLI header directory entry at all; checks 1-4 already passed, and
        // §4.3 only requires the directory-entry check "when pe_offset + 248 <= length".
        true
    }
}

/// The weak validation path (§4.3): checks 1-4 plus one of the well-known in-file magic strings.
/// Never sufficient for the canonical path. §4.7's passes all apply canonical validation only, so
/// this currently has no call site in [`crate::recovery`]; it remains part of the validator's
/// public contract for any future recovery strategy that needs it.
#[must_use]
pub fn is_valid_assembly_weak(data: &[u8]) -> bool {
    if !has_pe_signature(data) {
        return false;
    }
    contains(data, CLI_METADATA_MAGIC) || contains(data, b"System.") || contains(data, b"mscorlib")
}

/// A straight index-based substring search (the design notes call out the source's LINQ-style
/// take/skip/sequence-equal scans as quadratic; this is the mandated replacement).
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || haystack.len() < needle.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Attempts the repair pass (§4.3) on a slice that failed [`is_valid_assembly`].
///
/// Returns the repaired bytes on the first successful repair; `None` if no repair makes the slice
/// canonically valid.
#[must_use]
pub fn repair(data: &[u8]) -> Option<Vec<u8>> {
    let scan_len = data.len().min(1024);
    if let Some(k) = (1..scan_len.saturating_sub(1)).find(|&k| data[k..k + 2] == MZ) {
        let trimmed = data[k..].to_vec();
        if is_valid_assembly(&trimmed) {
            return Some(trimmed);
        }
    }

    if data.len() >= 2 && data[0..2] == MZ {
        let rescan_end = (0x200 + 2).min(data.len());
        let mut offset = 0x40;
        while offset + 2 <= rescan_end {
            if data[offset..offset + 2] == PE {
                let mut patched = data.to_vec();
                patched[PE_OFFSET_FIELD..PE_OFFSET_FIELD + 4].copy_from_slice(&(offset as u32).to_le_bytes());
                if is_valid_assembly(&patched) {
                    return Some(patched);
                }
            }
            offset += 4;
        }
    }

    None
}
