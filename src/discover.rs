//! Recursive input discovery: finds `.blob` stores and the first `assemblies.manifest`, per the
//! external collaborator contract in §6.

use std::path::{Path, PathBuf};

/// Every `.blob` file found under `root` (recursive), plus the first `assemblies.manifest`
/// encountered along the way.
#[derive(Debug, Default)]
pub struct DiscoveredInputs {
    pub blobs: Vec<PathBuf>,
    pub manifest: Option<PathBuf>,
}

/// Walks `root` recursively, collecting every `.blob` file and the first `assemblies.manifest`.
///
/// # Errors
/// Propagates any I/O error encountered while reading a directory.
pub fn discover(root: &Path) -> std::io::Result<DiscoveredInputs> {
    let mut result = DiscoveredInputs::default();
    walk(root, &mut result)?;
    Ok(result)
}

fn walk(dir: &Path, result: &mut DiscoveredInputs) -> std::io::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(std::fs::DirEntry::path);

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            walk(&path, result)?;
            continue;
        }

        if !file_type.is_file() {
            continue;
        }

        if path.extension().is_some_and(|extension| extension.eq_ignore_ascii_case("blob")) {
            result.blobs.push(path);
        } else if result.manifest.is_none()
            && path.file_name().is_some_and(|name| name.eq_ignore_ascii_case("assemblies.manifest"))
        {
            result.manifest = Some(path);
        }
    }

    Ok(())
}

/// True iff `path`'s file stem equals `assemblies`, case-insensitively: the primary-store
/// detection rule from §6.
#[must_use]
pub fn is_primary_store(path: &Path) -> bool {
    path.file_stem().is_some_and(|stem| stem.eq_ignore_ascii_case("assemblies"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_store_detection_is_case_insensitive() {
        assert!(is_primary_store(Path::new("/x/Assemblies.blob")));
        assert!(is_primary_store(Path::new("/x/assemblies.blob")));
        assert!(!is_primary_store(Path::new("/x/assemblies.arm64.blob")));
    }
}
